//! 构建配置模块
//!
//! 提供电子书构建过程的配置管理功能，支持从YAML文件加载配置。

use crate::epub::error::{BuildError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 默认内容目录（EPUB包内）
pub const DEFAULT_CONTENT_DIR: &str = "OEBPS";

/// 默认清单文件名
pub const DEFAULT_MANIFEST_FILE: &str = "book.json";

/// 构建配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// EPUB包内存放内容文件的目录
    pub content_dir: String,
    /// 源目录中的清单文件名
    pub manifest_file: String,
    /// 全书样式表文件名（存在于源目录时才会被页面引用）
    pub stylesheet: String,
    /// 自定义模板目录（页面模板覆盖和模板归档）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates_dir: Option<PathBuf>,
    /// 使用Markdown过滤器转换的扩展名
    pub markdown_extensions: Vec<String>,
    /// 打包时跳过的文件名
    pub archive_excludes: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            content_dir: DEFAULT_CONTENT_DIR.to_string(),
            manifest_file: DEFAULT_MANIFEST_FILE.to_string(),
            stylesheet: "style.css".to_string(),
            templates_dir: None,
            markdown_extensions: vec!["md".to_string(), "markdown".to_string()],
            archive_excludes: vec![".DS_Store".to_string(), "mimetype".to_string()],
        }
    }
}

impl BuildConfig {
    /// 从YAML文件加载构建配置
    ///
    /// 文件中缺省的字段使用默认值。
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| BuildError::Config(format!("无法读取配置文件 '{}': {}", path.display(), e)))?;

        Self::from_yaml(&content)
    }

    /// 从YAML文本解析构建配置
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yml::from_str(content)
            .map_err(|e| BuildError::Config(format!("配置文件格式错误: {}", e)))
    }

    /// 序列化为带注释头的YAML文本
    pub fn to_yaml(&self) -> Result<String> {
        let yaml_content = serde_yml::to_string(self)
            .map_err(|e| BuildError::Config(format!("序列化配置失败: {}", e)))?;

        Ok(format!(
            "# bookpress 构建配置文件\n# 缺省的字段使用默认值\n\n{}",
            yaml_content
        ))
    }

    /// 将默认配置写入指定路径
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let content = Self::default().to_yaml()?;
        fs::write(path.as_ref(), content)
            .map_err(|e| BuildError::Config(format!("写入配置文件失败: {}", e)))
    }

    /// 设置模板目录
    pub fn with_templates_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.templates_dir = Some(dir.into());
        self
    }
}
