//! 文件集解析模块
//!
//! 将清单中的 `files` 声明（显式声明、include、exclude）展开为ID到源文件路径与媒体类型的映射。

use crate::epub::error::{BuildError, Result};
use crate::epub::resolve::media_type;
use glob::Pattern;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::path::{Component, Path};
use tracing::{debug, warn};

/// 解析后的单个文件
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFile {
    /// 逻辑ID（全书唯一）
    pub id: String,
    /// 相对于源目录（导出后相对于内容目录）的路径
    pub path: String,
    /// 媒体类型
    pub media_type: String,
}

impl ResolvedFile {
    pub fn new(id: impl Into<String>, path: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            media_type: media_type.into(),
        }
    }

    /// 文件扩展名（不含点）
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.path).extension().and_then(|ext| ext.to_str())
    }
}

/// 按插入顺序保存的文件集
///
/// 以相同ID重复插入时原位替换，保持最初的插入位置。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileSet {
    entries: Vec<ResolvedFile>,
    index: HashMap<String, usize>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入或原位替换文件
    pub fn insert(&mut self, file: ResolvedFile) {
        match self.index.get(&file.id) {
            Some(&position) => self.entries[position] = file,
            None => {
                self.index.insert(file.id.clone(), self.entries.len());
                self.entries.push(file);
            }
        }
    }

    /// 根据ID查找文件
    pub fn get(&self, id: &str) -> Option<&ResolvedFile> {
        self.index.get(id).map(|&position| &self.entries[position])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// 按插入顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedFile> {
        self.entries.iter()
    }

    /// 按插入顺序返回所有ID
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|file| file.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 由文件名（不含扩展名）生成ID
///
/// 转为小写，空格和点替换为连字符；以数字开头时加上 `c` 前缀。
pub fn generate_file_id(file_stem: &str) -> String {
    let id: String = file_stem
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '.' { '-' } else { c })
        .collect();

    if id.starts_with(|c: char| c.is_ascii_digit()) {
        format!("c{}", id)
    } else {
        id
    }
}

/// 文件集解析器
pub struct FileResolver<'a> {
    home: &'a Path,
    files: FileSet,
    declared: HashSet<String>,
    /// 排除的相对路径，按原样精确匹配
    excludes: HashSet<String>,
}

impl<'a> FileResolver<'a> {
    /// 创建以 `home` 为源目录的解析器
    pub fn new(home: &'a Path) -> Self {
        Self {
            home,
            files: FileSet::new(),
            declared: HashSet::new(),
            excludes: HashSet::new(),
        }
    }

    /// 解析原始 `files` 声明
    ///
    /// # 返回值
    /// * `Result<FileSet>` - 声明结构错误（缺少include/exclude等）时返回 `BuildError::Resolution`；
    ///   单个文件不可读只会被跳过
    pub fn resolve(mut self, raw: &Value) -> Result<FileSet> {
        let section = raw
            .as_object()
            .ok_or_else(|| BuildError::Resolution("files 必须是一个对象".to_string()))?;

        let includes = section
            .get("include")
            .and_then(Value::as_array)
            .ok_or_else(|| BuildError::Resolution("files 缺少 include 列表".to_string()))?;

        let excludes = section
            .get("exclude")
            .and_then(Value::as_array)
            .ok_or_else(|| BuildError::Resolution("files 缺少 exclude 列表".to_string()))?;

        for entry in excludes {
            let entry = entry
                .as_str()
                .ok_or_else(|| BuildError::Resolution(format!("无效的 exclude 条目: {}", entry)))?;
            self.excludes.insert(entry.to_string());
        }

        self.register_declared(section)?;

        for item in includes {
            match item {
                Value::Object(object) => self.register_explicit_include(object)?,
                Value::String(pattern) => self.register_glob_include(pattern)?,
                other => {
                    return Err(BuildError::Resolution(format!("无效的 include 条目: {}", other)));
                }
            }
        }

        debug!(count = self.files.len(), "文件集解析完成");
        Ok(self.files)
    }

    /// 显式声明的文件：不检查是否存在，路径自动加入排除列表
    fn register_declared(&mut self, section: &Map<String, Value>) -> Result<()> {
        for (id, path) in section {
            if id == "include" || id == "exclude" {
                continue;
            }
            let path = path
                .as_str()
                .ok_or_else(|| BuildError::Resolution(format!("文件 '{}' 的路径必须是字符串", id)))?;
            if path.is_empty() {
                return Err(BuildError::Resolution(format!("文件 '{}' 的路径为空", id)));
            }

            let media_type = media_type::detect(&self.home.join(path));
            debug!(%id, %path, %media_type, "注册声明文件");
            self.files.insert(ResolvedFile::new(id.as_str(), path, media_type));
            self.declared.insert(id.clone());
            self.excludes.insert(path.to_string());
        }
        Ok(())
    }

    /// `{id, path}` 形式的include；NCX文件总是被包含
    fn register_explicit_include(&mut self, object: &Map<String, Value>) -> Result<()> {
        let id = object.get("id").and_then(Value::as_str);
        let path = object.get("path").and_then(Value::as_str);
        let (id, path) = match (id, path) {
            (Some(id), Some(path)) if !path.is_empty() => (id, path),
            _ => {
                return Err(BuildError::Resolution(
                    "include 对象必须包含字符串类型的 id 和 path".to_string(),
                ));
            }
        };

        let full_path = self.home.join(path);
        let is_ncx = Path::new(path).extension().is_some_and(|ext| ext == "ncx");

        if is_ncx || (!self.excludes.contains(path) && is_readable_file(&full_path)) {
            let media_type = media_type::detect(&full_path);
            debug!(%id, %path, %media_type, "注册include文件");
            self.files.insert(ResolvedFile::new(id, path, media_type));
        } else {
            warn!(%id, %path, "跳过include文件（已排除或不可读）");
        }
        Ok(())
    }

    /// 路径或通配模式形式的include
    fn register_glob_include(&mut self, item: &str) -> Result<()> {
        let home = self.home.to_string_lossy();
        let pattern = format!("{}/{}", Pattern::escape(&home), item);
        let paths = glob::glob(&pattern)
            .map_err(|e| BuildError::Resolution(format!("无效的 include 模式 '{}': {}", item, e)))?;

        for entry in paths {
            let full_path = match entry {
                Ok(path) => path,
                Err(e) => {
                    warn!(error = %e, "无法访问匹配的路径");
                    continue;
                }
            };
            if !full_path.is_file() {
                continue;
            }
            if !is_readable_file(&full_path) {
                warn!(path = %full_path.display(), "匹配的文件不可读，已跳过");
                continue;
            }
            let Some(path) = relative_path(self.home, &full_path) else {
                warn!(path = %full_path.display(), "匹配的文件不在源目录中");
                continue;
            };
            if self.excludes.contains(&path) {
                continue;
            }

            let stem = full_path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            let id = generate_file_id(&stem);
            if self.declared.contains(&id) {
                warn!(%id, %path, "生成的ID与声明文件冲突，保留声明文件");
                continue;
            }
            let media_type = media_type::detect(&full_path);
            debug!(%id, %path, %media_type, "注册include文件");
            self.files.insert(ResolvedFile::new(id, path, media_type));
        }
        Ok(())
    }
}

/// 解析清单的 `files` 声明
pub fn resolve_files(home: &Path, raw: &Value) -> Result<FileSet> {
    FileResolver::new(home).resolve(raw)
}

fn is_readable_file(path: &Path) -> bool {
    path.is_file() && File::open(path).is_ok()
}

/// 相对于源目录、以 `/` 分隔的路径
fn relative_path(home: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(home).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn source_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("chapters")).unwrap();
        fs::write(dir.path().join("cover.xhtml"), "<html/>").unwrap();
        fs::write(dir.path().join("style.css"), "body {}").unwrap();
        fs::write(dir.path().join("chapters/01 Intro.md"), "# Intro").unwrap();
        fs::write(dir.path().join("chapters/02.Body.md"), "# Body").unwrap();
        fs::write(dir.path().join("chapters/notes.txt"), "notes").unwrap();
        dir
    }

    fn resolve(dir: &TempDir, raw: Value) -> Result<FileSet> {
        let home = fs::canonicalize(dir.path()).unwrap();
        resolve_files(&home, &raw)
    }

    #[test]
    fn test_generate_file_id() {
        assert_eq!(generate_file_id("Chapter One"), "chapter-one");
        assert_eq!(generate_file_id("part.1.final"), "part-1-final");
        assert_eq!(generate_file_id("01-intro"), "c01-intro");
        assert_eq!(generate_file_id("2024 Notes"), "c2024-notes");
        assert_eq!(generate_file_id("preface"), "preface");
        assert_eq!(generate_file_id("01-intro"), generate_file_id("01-intro"));
    }

    #[test]
    fn test_declared_and_glob_includes() {
        let dir = source_tree();
        let files = resolve(
            &dir,
            json!({
                "cover": "cover.xhtml",
                "include": ["chapters/*.md"],
                "exclude": []
            }),
        )
        .unwrap();

        let ids: Vec<&str> = files.ids().collect();
        assert_eq!(ids, vec!["cover", "c01-intro", "c02-body"]);

        let cover = files.get("cover").unwrap();
        assert_eq!(cover.path, "cover.xhtml");
        assert_eq!(cover.media_type, media_type::XHTML);

        let intro = files.get("c01-intro").unwrap();
        assert_eq!(intro.path, "chapters/01 Intro.md");
        assert_eq!(intro.extension(), Some("md"));
    }

    #[test]
    fn test_declared_path_is_not_registered_twice() {
        let dir = source_tree();
        let files = resolve(
            &dir,
            json!({
                "stylesheet": "style.css",
                "include": ["*.css"],
                "exclude": []
            }),
        )
        .unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files.get("stylesheet").unwrap().media_type, media_type::CSS);
        assert!(!files.contains("style"));
    }

    #[test]
    fn test_excludes_are_honoured() {
        let dir = source_tree();
        let files = resolve(
            &dir,
            json!({
                "include": ["chapters/*", {"id": "css", "path": "style.css"}],
                "exclude": ["chapters/notes.txt", "style.css"]
            }),
        )
        .unwrap();

        assert!(!files.contains("notes"));
        assert!(!files.contains("css"));
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_explicit_include_requires_readable_file_except_ncx() {
        let dir = source_tree();
        let files = resolve(
            &dir,
            json!({
                "include": [
                    {"id": "ncx", "path": "toc.ncx"},
                    {"id": "ghost", "path": "ghost.xhtml"},
                    {"id": "css", "path": "style.css"}
                ],
                "exclude": []
            }),
        )
        .unwrap();

        assert_eq!(files.get("ncx").unwrap().media_type, media_type::NCX);
        assert!(!files.contains("ghost"));
        assert!(files.contains("css"));
    }

    #[test]
    fn test_excluded_ncx_include_is_still_registered() {
        let dir = source_tree();
        let files = resolve(
            &dir,
            json!({
                "include": [{"id": "ncx", "path": "toc.ncx"}],
                "exclude": ["toc.ncx"]
            }),
        )
        .unwrap();

        let ncx = files.get("ncx").unwrap();
        assert_eq!(ncx.path, "toc.ncx");
        assert_eq!(ncx.media_type, media_type::NCX);
    }

    #[test]
    fn test_excludes_match_paths_literally() {
        let dir = source_tree();
        fs::write(dir.path().join("fig[1].png"), b"png").unwrap();
        fs::write(dir.path().join("fig1.png"), b"png").unwrap();
        fs::write(dir.path().join("a.md"), "# A").unwrap();
        fs::write(dir.path().join("b.md"), "# B").unwrap();

        let files = resolve(
            &dir,
            json!({
                "figure": "fig[1].png",
                "include": ["*.png", "*.md"],
                "exclude": ["?.md"]
            }),
        )
        .unwrap();

        let ids: Vec<&str> = files.ids().collect();
        assert_eq!(ids, vec!["figure", "fig1", "a", "b"]);
        assert_eq!(files.get("figure").unwrap().path, "fig[1].png");
        assert_eq!(files.get("fig1").unwrap().path, "fig1.png");
    }

    #[test]
    fn test_declared_file_is_not_existence_checked() {
        let dir = source_tree();
        let files = resolve(
            &dir,
            json!({"missing": "images/missing.png", "include": [], "exclude": []}),
        )
        .unwrap();

        let missing = files.get("missing").unwrap();
        assert_eq!(missing.path, "images/missing.png");
        assert_eq!(missing.media_type, "");
    }

    #[test]
    fn test_generated_id_never_replaces_declared_id() {
        let dir = source_tree();
        let files = resolve(
            &dir,
            json!({"c01-intro": "cover.xhtml", "include": ["chapters/*.md"], "exclude": []}),
        )
        .unwrap();

        assert_eq!(files.get("c01-intro").unwrap().path, "cover.xhtml");
        assert!(files.contains("c02-body"));
    }

    #[test]
    fn test_explicit_include_replaces_declared_id_in_place() {
        let dir = source_tree();
        let files = resolve(
            &dir,
            json!({
                "cover": "missing.xhtml",
                "extra": "extra.xhtml",
                "include": [{"id": "cover", "path": "cover.xhtml"}],
                "exclude": []
            }),
        )
        .unwrap();

        let ids: Vec<&str> = files.ids().collect();
        assert_eq!(ids, vec!["cover", "extra"]);
        assert_eq!(files.get("cover").unwrap().path, "cover.xhtml");
        assert_eq!(files.get("cover").unwrap().media_type, media_type::XHTML);
    }

    #[test]
    fn test_malformed_sections() {
        let dir = source_tree();
        assert!(matches!(
            resolve(&dir, json!({"exclude": []})),
            Err(BuildError::Resolution(_))
        ));
        assert!(matches!(
            resolve(&dir, json!({"include": []})),
            Err(BuildError::Resolution(_))
        ));
        assert!(matches!(
            resolve(&dir, json!(["cover.xhtml"])),
            Err(BuildError::Resolution(_))
        ));
        assert!(matches!(
            resolve(&dir, json!({"include": [42], "exclude": []})),
            Err(BuildError::Resolution(_))
        ));
    }

    #[test]
    fn test_file_set_replaces_in_place() {
        let mut files = FileSet::new();
        files.insert(ResolvedFile::new("a", "a.md", "text/markdown"));
        files.insert(ResolvedFile::new("b", "b.md", "text/markdown"));
        files.insert(ResolvedFile::new("a", "a.xhtml", media_type::XHTML));

        let ids: Vec<&str> = files.ids().collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(files.get("a").unwrap().path, "a.xhtml");
    }
}
