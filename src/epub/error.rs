use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BuildError>;

/// 电子书构建过程中的错误类型
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("清单文件错误: {0}")]
    Manifest(String),

    #[error("文件解析错误: {0}")]
    Resolution(String),

    #[error("导出错误: {0}")]
    Export(String),

    #[error("打包错误: {0}")]
    Packaging(String),

    #[error("配置文件错误: {0}")]
    Config(String),

    #[error("文件不是有效的EPUB格式: {0}")]
    InvalidPackage(String),

    #[error("IO错误: {0}")]
    Io(#[from] io::Error),

    #[error("Zip文件错误: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON解析错误: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML错误: {0}")]
    Xml(#[from] quick_xml::Error),
}

impl BuildError {
    /// 每类错误对应的进程退出码
    ///
    /// 0-3 由命令行层保留（成功、参数错误、源目录无效、目标不可写）。
    pub fn exit_code(&self) -> i32 {
        match self {
            BuildError::Manifest(_) => 4,
            BuildError::Resolution(_) => 5,
            BuildError::Export(_) => 6,
            BuildError::Packaging(_) => 7,
            BuildError::Config(_) => 8,
            _ => 9,
        }
    }
}
