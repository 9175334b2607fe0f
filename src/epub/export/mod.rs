//! 内容导出模块
//!
//! 包括内容过滤器、模板服务和导出器。

pub mod exporter;
pub mod filter;
pub mod template;

pub use exporter::Exporter;
pub use filter::{ContentFilter, FilterRegistry, MarkdownFilter};
pub use template::{PageContext, TemplateRenderer, Templates};
