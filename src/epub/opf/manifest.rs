//! 清单模块
//!
//! 提供EPUB包中文件清单的结构定义。

use crate::epub::resolve::ResolvedFile;

/// 清单项信息
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestItem {
    /// 项目ID
    pub id: String,
    /// 文件路径(相对于OPF文件)
    pub href: String,
    /// 媒体类型
    pub media_type: String,
}

impl ManifestItem {
    /// 创建新的清单项
    pub fn new(id: String, href: String, media_type: String) -> Self {
        Self {
            id,
            href,
            media_type,
        }
    }
}

impl From<&ResolvedFile> for ManifestItem {
    fn from(file: &ResolvedFile) -> Self {
        Self::new(file.id.clone(), file.path.clone(), file.media_type.clone())
    }
}
