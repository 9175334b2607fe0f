//! 媒体类型检测

use std::path::Path;

/// XHTML文档
pub const XHTML: &str = "application/xhtml+xml";
/// CSS样式表
pub const CSS: &str = "text/css";
/// NCX导航文件
pub const NCX: &str = "application/x-dtbncx+xml";
/// 无法识别的现存文件
pub const OCTET_STREAM: &str = "application/octet-stream";

/// 固定覆盖表，优先于检测结果
fn override_for(extension: &str) -> Option<&'static str> {
    match extension {
        "xhtml" => Some(XHTML),
        "css" => Some(CSS),
        "ncx" => Some(NCX),
        _ => None,
    }
}

/// 检测文件的媒体类型
///
/// 现存文件按扩展名推断；不存在的文件检测结果为空字符串。
/// `xhtml`、`css`、`ncx` 三种扩展名总是使用固定类型。
pub fn detect(path: &Path) -> String {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if let Some(fixed) = override_for(&extension) {
        return fixed.to_string();
    }

    if !path.exists() {
        return String::new();
    }

    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(OCTET_STREAM)
        .to_string()
}
