//! NCX（Navigation Control file for XML）导航模块
//!
//! 此模块从导出后的页面中提取章节与小节，并生成EPUB的NCX导航控制文件。

pub mod document;
pub mod navigation;
pub mod toc;

pub use document::Ncx;
pub use navigation::{NavMap, NavPoint};
pub use toc::{Chapter, Headings, Section, extract_chapters, extract_headings};
