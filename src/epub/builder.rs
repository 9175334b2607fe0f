//! 构建流程
//!
//! 清单加载 → 文件集解析 → 脊柱解析 → 内容导出 → 描述文件生成 → 打包。
//! 每次构建使用独立的临时工作目录，构建结束（无论成功与否）后删除。

use crate::epub::archive::Archiver;
use crate::epub::config::BuildConfig;
use crate::epub::container::{CONTAINER_PATH, Container, OPF_FILE};
use crate::epub::error::{BuildError, Result};
use crate::epub::export::{ContentFilter, Exporter, FilterRegistry, TemplateRenderer, Templates};
use crate::epub::manifest::BookManifest;
use crate::epub::ncx::{Ncx, extract_chapters};
use crate::epub::opf::PackageDocument;
use crate::epub::resolve::media_type;
use crate::epub::resolve::{FileSet, ResolvedFile, Spine, resolve_files, resolve_spine};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 一次构建的统计信息
#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    pub book_id: String,
    pub title: String,
    /// 包描述中的文件数
    pub files: usize,
    /// 脊柱条目数
    pub spine_items: usize,
    /// 导航中的章节数（没有导航文件时为0）
    pub chapters: usize,
}

/// 电子书构建器
pub struct BookBuilder {
    config: BuildConfig,
    filters: FilterRegistry,
    renderer: Box<dyn TemplateRenderer>,
    work_root: Option<PathBuf>,
}

impl BookBuilder {
    /// 根据构建配置创建构建器
    ///
    /// 为配置中的每个Markdown扩展名注册Markdown过滤器；
    /// 配置了模板目录时页面模板从该目录查找。
    pub fn new(config: BuildConfig) -> Self {
        let filters = FilterRegistry::with_markdown(&config.markdown_extensions);
        let templates = match &config.templates_dir {
            Some(dir) => Templates::from_dir(dir),
            None => Templates::builtin(),
        };

        Self {
            config,
            filters,
            renderer: Box::new(templates),
            work_root: None,
        }
    }

    /// 为扩展名注册（或替换）内容过滤器
    pub fn with_filter<F>(mut self, extension: &str, filter: F) -> Self
    where
        F: ContentFilter + 'static,
    {
        self.filters.register(extension, filter);
        self
    }

    /// 使用自定义模板渲染器
    pub fn with_renderer<R>(mut self, renderer: R) -> Self
    where
        R: TemplateRenderer + 'static,
    {
        self.renderer = Box::new(renderer);
        self
    }

    /// 在指定目录下创建工作目录（默认使用系统临时目录）
    pub fn with_work_root<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.work_root = Some(dir.into());
        self
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// 将源目录构建为EPUB文件
    ///
    /// # 参数
    /// * `src_dir` - 包含清单文件的源目录
    /// * `out_file` - 输出的EPUB文件路径（已存在时被替换）
    ///
    /// # 返回值
    /// * `Result<BuildReport>` - 任一阶段失败时立即返回对应类别的错误
    pub fn build<P: AsRef<Path>, Q: AsRef<Path>>(&self, src_dir: P, out_file: Q) -> Result<BuildReport> {
        let book = BookManifest::load(src_dir, &self.config)?;

        let files = resolve_files(book.home(), book.raw_files())?;
        let spine = resolve_spine(book.raw_spine(), &files)?;
        info!(files = files.len(), spine = spine.len(), "文件集解析完成");

        let work_dir = self.create_work_dir(book.id())?;
        debug!(work_dir = %work_dir.path().display(), "创建工作目录");

        let report = self.assemble(&book, &files, &spine, work_dir.path(), out_file.as_ref())?;
        work_dir.close()?;

        Ok(report)
    }

    fn create_work_dir(&self, book_id: &str) -> Result<tempfile::TempDir> {
        let prefix = format!("{}-", work_dir_prefix(book_id));
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix);

        let work_dir = match &self.work_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };
        work_dir.map_err(|e| BuildError::Export(format!("无法创建工作目录: {}", e)))
    }

    fn assemble(
        &self,
        book: &BookManifest,
        files: &FileSet,
        spine: &Spine,
        work_dir: &Path,
        out_file: &Path,
    ) -> Result<BuildReport> {
        let content_dir = self.config.content_dir.as_str();
        let content_root = work_dir.join(content_dir);
        create_dir(&content_root)?;
        create_dir(&work_dir.join("META-INF"))?;

        let container = self.renderer.render_container(&Container::for_content_dir(content_dir))?;
        write_descriptor(&work_dir.join(CONTAINER_PATH), &container)?;

        let exporter = Exporter::new(book, &content_root, &self.filters, self.renderer.as_ref())
            .with_stylesheet(&self.config.stylesheet);
        let exported = exporter.export(files)?;

        let package = PackageDocument::new(book, &exported, spine);
        write_descriptor(&content_root.join(OPF_FILE), &self.renderer.render_package(&package)?)?;

        let chapters = match navigation_target(&exported, spine) {
            Some(target) => {
                let chapters = extract_chapters(&content_root, &exported, spine);
                let ncx = Ncx::from_chapters(book.id(), book.title(), &target.path, &chapters);
                write_descriptor(
                    &content_root.join(&target.path),
                    &self.renderer.render_navigation(&ncx)?,
                )?;
                info!(path = %target.path, chapters = chapters.len(), "导航文件生成完成");
                chapters.len()
            }
            None => 0,
        };

        let mut archiver = Archiver::new(self.config.archive_excludes.clone());
        if let Some(template) = self.template_archive() {
            archiver = archiver.with_template_archive(template);
        }
        archiver.create(work_dir, out_file)?;

        Ok(BuildReport {
            book_id: book.id().to_string(),
            title: book.title().to_string(),
            files: exported.len(),
            spine_items: spine.len(),
            chapters,
        })
    }

    fn template_archive(&self) -> Option<PathBuf> {
        self.config
            .templates_dir
            .as_ref()
            .and_then(|dir| Templates::from_dir(dir).template_archive())
    }
}

/// 导航文件：脊柱指定的NCX文件，否则为ID是 `ncx` 的文件
fn navigation_target<'a>(files: &'a FileSet, spine: &Spine) -> Option<&'a ResolvedFile> {
    spine
        .toc
        .as_deref()
        .and_then(|id| files.get(id))
        .filter(|file| file.media_type == media_type::NCX)
        .or_else(|| files.get("ncx"))
}

/// 书籍ID中只保留字母数字、`-` 和 `_`
fn work_dir_prefix(book_id: &str) -> String {
    book_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect()
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .map_err(|e| BuildError::Export(format!("无法创建目录 '{}': {}", path.display(), e)))
}

fn write_descriptor(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir(parent)?;
    }
    debug!(path = %path.display(), "写入描述文件");
    fs::write(path, content)
        .map_err(|e| BuildError::Export(format!("无法写入 '{}': {}", path.display(), e)))
}
