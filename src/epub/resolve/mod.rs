//! 文件集与脊柱解析模块
//!
//! 将清单中的原始声明展开为具体的文件集（ID → 路径、媒体类型）和阅读顺序。

pub mod files;
pub mod media_type;
pub mod spine;

pub use files::{FileResolver, FileSet, ResolvedFile, generate_file_id, resolve_files};
pub use spine::{Spine, resolve_spine};
