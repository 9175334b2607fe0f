//! 内容导出模块
//!
//! 按文件集顺序处理每个文件：注册了过滤器的扩展名经过过滤器转换并套用页面模板，
//! 输出为同目录下的 `.xhtml` 文件；其余文件原样复制。

use crate::epub::error::{BuildError, Result};
use crate::epub::export::filter::FilterRegistry;
use crate::epub::export::template::{PageContext, TemplateRenderer};
use crate::epub::href::relative_href;
use crate::epub::manifest::BookManifest;
use crate::epub::resolve::media_type;
use crate::epub::resolve::{FileSet, ResolvedFile};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 内容导出器
pub struct Exporter<'a> {
    book: &'a BookManifest,
    content_root: PathBuf,
    filters: &'a FilterRegistry,
    templates: &'a dyn TemplateRenderer,
    stylesheet: Option<String>,
}

impl<'a> Exporter<'a> {
    /// 创建导出器
    ///
    /// # 参数
    /// * `book` - 书籍清单（提供源目录、书名和描述）
    /// * `content_root` - 工作目录中的内容目录
    /// * `filters` - 扩展名到过滤器的映射
    /// * `templates` - 页面模板
    pub fn new(
        book: &'a BookManifest,
        content_root: impl Into<PathBuf>,
        filters: &'a FilterRegistry,
        templates: &'a dyn TemplateRenderer,
    ) -> Self {
        Self {
            book,
            content_root: content_root.into(),
            filters,
            templates,
            stylesheet: None,
        }
    }

    /// 设置全书样式表文件名；仅当该文件存在于源目录时页面才会引用它
    pub fn with_stylesheet(mut self, stylesheet: &str) -> Self {
        if self.book.home().join(stylesheet).is_file() {
            self.stylesheet = Some(stylesheet.to_string());
        }
        self
    }

    /// 导出全部文件并返回新的文件集
    ///
    /// 返回的文件集与输入具有相同的ID和顺序，被转换的文件路径和媒体类型已更新。
    pub fn export(&self, files: &FileSet) -> Result<FileSet> {
        let mut exported = FileSet::new();
        for file in files.iter() {
            exported.insert(self.export_file(file)?);
        }
        info!(count = exported.len(), "文件导出完成");
        Ok(exported)
    }

    fn export_file(&self, file: &ResolvedFile) -> Result<ResolvedFile> {
        match file.extension().and_then(|ext| self.filters.get(ext).map(|f| (ext, f))) {
            Some((extension, filter)) => {
                debug!(id = %file.id, path = %file.path, %extension, "转换文件");
                let source = self.book.home().join(&file.path);
                let bytes = fs::read(&source).map_err(|e| {
                    BuildError::Export(format!("无法读取文件 '{}': {}", source.display(), e))
                })?;
                let text = String::from_utf8(bytes).map_err(|_| {
                    BuildError::Export(format!("文件 '{}' 不是有效的UTF-8文本", source.display()))
                })?;
                let content = filter.transform(&text);
                self.write_page(file, &content)
            }
            None => {
                self.copy_file(file)?;
                Ok(file.clone())
            }
        }
    }

    /// 套用页面模板并写入 `.xhtml` 文件
    fn write_page(&self, file: &ResolvedFile, content: &str) -> Result<ResolvedFile> {
        let path = xhtml_path(&file.path);
        let style = self
            .stylesheet
            .as_deref()
            .map(|stylesheet| relative_href(&path, stylesheet));

        let page = PageContext {
            title: self.book.title(),
            content,
            style: style.as_deref(),
            description: self.book.metadata().description.as_deref(),
        };
        let rendered = self.templates.render_page(&file.id, &page)?;

        let dest = self.content_root.join(&path);
        ensure_parent(&dest)?;
        fs::write(&dest, rendered)
            .map_err(|e| BuildError::Export(format!("无法写入文件 '{}': {}", dest.display(), e)))?;

        Ok(ResolvedFile::new(
            file.id.as_str(),
            path,
            media_type::detect(&dest),
        ))
    }

    /// 原样复制；源文件不存在时静默跳过
    fn copy_file(&self, file: &ResolvedFile) -> Result<()> {
        let source = self.book.home().join(&file.path);
        let dest = self.content_root.join(&file.path);
        ensure_parent(&dest)?;

        if !source.is_file() {
            warn!(id = %file.id, path = %file.path, "源文件不存在，跳过复制");
            return Ok(());
        }

        debug!(id = %file.id, path = %file.path, "复制文件");
        fs::copy(&source, &dest).map_err(|e| {
            BuildError::Export(format!(
                "无法复制 '{}' 到 '{}': {}",
                source.display(),
                dest.display(),
                e
            ))
        })?;
        Ok(())
    }
}

/// 同目录下同名的 `.xhtml` 路径
fn xhtml_path(path: &str) -> String {
    let (dir, name) = match path.rsplit_once('/') {
        Some((dir, name)) => (Some(dir), name),
        None => (None, path),
    };
    let stem = Path::new(name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());

    match dir {
        Some(dir) => format!("{}/{}.xhtml", dir, stem),
        None => format!("{}.xhtml", stem),
    }
}

fn ensure_parent(dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            BuildError::Export(format!("无法创建目录 '{}': {}", parent.display(), e))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epub::export::filter::FilterRegistry;
    use crate::epub::export::template::Templates;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct Fixture {
        source: TempDir,
        work: TempDir,
        book: BookManifest,
    }

    fn fixture(manifest: &str) -> Fixture {
        let source = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        fs::create_dir_all(source.path().join("chapters")).unwrap();
        fs::create_dir_all(source.path().join("images")).unwrap();
        fs::write(source.path().join("chapters/ch1.md"), "# One\n\n## A {#a}\n\ntext").unwrap();
        fs::write(source.path().join("images/cover.png"), [0u8, 1, 2, 255, 254]).unwrap();
        fs::write(source.path().join("style.css"), "body { margin: 0 }").unwrap();

        let book = BookManifest::parse(PathBuf::from(source.path()), manifest).unwrap();
        Fixture { source, work, book }
    }

    const MANIFEST: &str = r#"{
        "id": "b1", "title": "T", "language": "en", "description": "D",
        "files": {"include": [], "exclude": []}, "spine": {"items": []}
    }"#;

    fn sample_files() -> FileSet {
        let mut files = FileSet::new();
        files.insert(ResolvedFile::new("cover", "images/cover.png", "image/png"));
        files.insert(ResolvedFile::new("ch1", "chapters/ch1.md", "text/markdown"));
        files.insert(ResolvedFile::new("ghost", "ghost.png", ""));
        files
    }

    #[test]
    fn test_export_transforms_and_copies() {
        let fx = fixture(MANIFEST);
        let filters = FilterRegistry::with_markdown(["md"]);
        let templates = Templates::builtin();
        let content_root = fx.work.path().join("OEBPS");

        let exporter = Exporter::new(&fx.book, &content_root, &filters, &templates)
            .with_stylesheet("style.css");
        let exported = exporter.export(&sample_files()).unwrap();

        let ids: Vec<&str> = exported.ids().collect();
        assert_eq!(ids, vec!["cover", "ch1", "ghost"]);

        let ch1 = exported.get("ch1").unwrap();
        assert_eq!(ch1.path, "chapters/ch1.xhtml");
        assert_eq!(ch1.media_type, media_type::XHTML);

        let page = fs::read_to_string(content_root.join("chapters/ch1.xhtml")).unwrap();
        assert!(page.contains("<h1>One</h1>"));
        assert!(page.contains(r#"<h2 id="a">A</h2>"#));
        assert!(page.contains(r#"href="../style.css""#));
        assert!(page.contains(r#"<meta name="description" content="D"/>"#));
        assert!(!content_root.join("chapters/ch1.md").exists());

        let copied = fs::read(content_root.join("images/cover.png")).unwrap();
        let original = fs::read(fx.source.path().join("images/cover.png")).unwrap();
        assert_eq!(copied, original);
        assert_eq!(exported.get("cover").unwrap(), sample_files().get("cover").unwrap());
    }

    #[test]
    fn test_missing_copy_source_is_skipped() {
        let fx = fixture(MANIFEST);
        let filters = FilterRegistry::new();
        let templates = Templates::builtin();
        let content_root = fx.work.path().join("OEBPS");

        let exporter = Exporter::new(&fx.book, &content_root, &filters, &templates);
        let exported = exporter.export(&sample_files()).unwrap();

        assert_eq!(exported.get("ghost").unwrap().path, "ghost.png");
        assert!(!content_root.join("ghost.png").exists());
        assert!(content_root.join("chapters/ch1.md").exists());
    }

    #[test]
    fn test_missing_filtered_source_is_an_error() {
        let fx = fixture(MANIFEST);
        let filters = FilterRegistry::with_markdown(["md"]);
        let templates = Templates::builtin();
        let mut files = FileSet::new();
        files.insert(ResolvedFile::new("lost", "lost.md", ""));

        let exporter = Exporter::new(&fx.book, fx.work.path(), &filters, &templates);
        assert!(matches!(exporter.export(&files), Err(BuildError::Export(_))));
    }

    #[test]
    fn test_non_utf8_filtered_source_is_an_error() {
        let fx = fixture(MANIFEST);
        fs::write(fx.source.path().join("chapters/latin1.md"), [b'#', b' ', 0xE9, b'\n']).unwrap();
        let filters = FilterRegistry::with_markdown(["md"]);
        let templates = Templates::builtin();
        let mut files = FileSet::new();
        files.insert(ResolvedFile::new("latin1", "chapters/latin1.md", "text/markdown"));

        let exporter = Exporter::new(&fx.book, fx.work.path(), &filters, &templates);
        assert!(matches!(exporter.export(&files), Err(BuildError::Export(_))));
        assert!(!fx.work.path().join("chapters/latin1.xhtml").exists());
    }

    #[test]
    fn test_stylesheet_is_only_referenced_when_present() {
        let fx = fixture(MANIFEST);
        fs::remove_file(fx.source.path().join("style.css")).unwrap();
        let filters = FilterRegistry::with_markdown(["md"]);
        let templates = Templates::builtin();
        let mut files = FileSet::new();
        files.insert(ResolvedFile::new("ch1", "chapters/ch1.md", ""));

        let exporter = Exporter::new(&fx.book, fx.work.path(), &filters, &templates)
            .with_stylesheet("style.css");
        exporter.export(&files).unwrap();

        let page = fs::read_to_string(fx.work.path().join("chapters/ch1.xhtml")).unwrap();
        assert!(!page.contains("stylesheet"));
    }

    #[test]
    fn test_xhtml_path() {
        assert_eq!(xhtml_path("ch1.md"), "ch1.xhtml");
        assert_eq!(xhtml_path("chapters/part.one.md"), "chapters/part.one.xhtml");
        assert_eq!(xhtml_path("a/b/README"), "a/b/README.xhtml");
    }
}
