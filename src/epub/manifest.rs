//! 清单加载模块
//!
//! 读取源目录中的书籍清单文件（JSON），校验必需字段并保留原始的文件声明和脊柱声明，
//! 由后续的解析阶段负责展开。

use crate::epub::config::BuildConfig;
use crate::epub::error::{BuildError, Result};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 字符串或字符串列表（如 `authors`、`subject`）
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

/// 清单文件的原始结构
#[derive(Debug, Deserialize)]
struct RawManifest {
    id: String,
    title: String,
    language: String,
    authors: Option<OneOrMany>,
    date: Option<String>,
    description: Option<String>,
    publisher: Option<String>,
    relation: Option<String>,
    rights: Option<String>,
    subject: Option<OneOrMany>,
    files: Value,
    spine: Value,
}

/// 可选的书籍元数据，只有清单中出现的字段才会被填充
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookMetadata {
    pub authors: Vec<String>,
    pub date: Option<String>,
    pub description: Option<String>,
    pub publisher: Option<String>,
    pub relation: Option<String>,
    pub rights: Option<String>,
    pub subjects: Vec<String>,
}

/// 书籍清单，加载后不可变
#[derive(Debug, Clone)]
pub struct BookManifest {
    /// 源目录（绝对路径）
    home: PathBuf,
    id: String,
    title: String,
    language: String,
    metadata: BookMetadata,
    /// 原始的 `files` 声明
    files: Value,
    /// 原始的 `spine` 声明
    spine: Value,
}

impl BookManifest {
    /// 从源目录加载清单
    ///
    /// # 参数
    /// * `src_dir` - 包含清单文件的源目录
    /// * `config` - 构建配置（决定清单文件名）
    ///
    /// # 返回值
    /// * `Result<BookManifest>` - 源目录不存在、清单文件不存在或解析失败时返回 `BuildError::Manifest`
    pub fn load<P: AsRef<Path>>(src_dir: P, config: &BuildConfig) -> Result<Self> {
        let src_dir = src_dir.as_ref();
        if !src_dir.is_dir() {
            return Err(BuildError::Manifest(format!(
                "'{}' 不是一个目录",
                src_dir.display()
            )));
        }

        let home = fs::canonicalize(src_dir)?;
        let manifest_path = home.join(&config.manifest_file);
        if !manifest_path.is_file() {
            return Err(BuildError::Manifest(format!(
                "清单文件 '{}' 不存在于 '{}'",
                config.manifest_file,
                home.display()
            )));
        }

        let content = fs::read_to_string(&manifest_path).map_err(|e| {
            BuildError::Manifest(format!("无法读取清单文件 '{}': {}", manifest_path.display(), e))
        })?;

        let manifest = Self::parse(home, &content)?;
        info!(id = %manifest.id, title = %manifest.title, "已加载书籍清单");
        Ok(manifest)
    }

    /// 解析清单文本
    ///
    /// `home` 为后续解析相对路径时使用的源目录。
    pub fn parse(home: PathBuf, content: &str) -> Result<Self> {
        let raw: RawManifest = serde_json::from_str(content)
            .map_err(|e| BuildError::Manifest(format!("清单文件解析失败: {}", e)))?;

        let metadata = BookMetadata {
            authors: raw.authors.map(OneOrMany::into_vec).unwrap_or_default(),
            date: raw.date,
            description: raw.description,
            publisher: raw.publisher,
            relation: raw.relation,
            rights: raw.rights,
            subjects: raw.subject.map(OneOrMany::into_vec).unwrap_or_default(),
        };
        debug!(?metadata, "清单可选元数据");

        Ok(Self {
            home,
            id: raw.id,
            title: raw.title,
            language: raw.language,
            metadata,
            files: raw.files,
            spine: raw.spine,
        })
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn metadata(&self) -> &BookMetadata {
        &self.metadata
    }

    /// 原始文件声明
    pub fn raw_files(&self) -> &Value {
        &self.files
    }

    /// 原始脊柱声明
    pub fn raw_spine(&self) -> &Value {
        &self.spine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MINIMAL: &str = r#"{
        "id": "b1",
        "title": "T",
        "language": "en",
        "files": {"include": [], "exclude": []},
        "spine": {"items": []}
    }"#;

    #[test]
    fn test_load_minimal_manifest() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("book.json"), MINIMAL).unwrap();

        let manifest = BookManifest::load(dir.path(), &BuildConfig::default()).unwrap();
        assert_eq!(manifest.id(), "b1");
        assert_eq!(manifest.title(), "T");
        assert_eq!(manifest.language(), "en");
        assert_eq!(manifest.metadata(), &BookMetadata::default());
        assert!(manifest.raw_files().is_object());
    }

    #[test]
    fn test_optional_metadata_is_copied_through() {
        let content = r#"{
            "id": "b1", "title": "T", "language": "zh-CN",
            "authors": "张三",
            "subject": ["小说", "历史"],
            "description": "简介",
            "rights": "CC-BY",
            "files": {"include": [], "exclude": []},
            "spine": {"items": []}
        }"#;
        let manifest = BookManifest::parse(PathBuf::from("/src"), content).unwrap();
        let metadata = manifest.metadata();
        assert_eq!(metadata.authors, vec!["张三"]);
        assert_eq!(metadata.subjects, vec!["小说", "历史"]);
        assert_eq!(metadata.description.as_deref(), Some("简介"));
        assert_eq!(metadata.rights.as_deref(), Some("CC-BY"));
        assert!(metadata.publisher.is_none());
        assert!(metadata.date.is_none());
    }

    #[test]
    fn test_missing_directory() {
        let result = BookManifest::load("/nonexistent/source", &BuildConfig::default());
        assert!(matches!(result, Err(BuildError::Manifest(_))));
    }

    #[test]
    fn test_missing_manifest_file() {
        let dir = TempDir::new().unwrap();
        let result = BookManifest::load(dir.path(), &BuildConfig::default());
        assert!(matches!(result, Err(BuildError::Manifest(_))));
    }

    #[test]
    fn test_malformed_json() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("book.json"), "{ not json").unwrap();
        let result = BookManifest::load(dir.path(), &BuildConfig::default());
        assert!(matches!(result, Err(BuildError::Manifest(_))));
    }

    #[test]
    fn test_missing_required_field() {
        let content = r#"{"id": "b1", "title": "T", "files": {}, "spine": {}}"#;
        let result = BookManifest::parse(PathBuf::from("/src"), content);
        match result {
            Err(BuildError::Manifest(message)) => assert!(message.contains("language")),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
