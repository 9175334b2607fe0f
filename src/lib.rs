pub mod epub;

// === 核心API重新导出 ===

/// 电子书构建器（主要接口）
pub use epub::{BookBuilder, BuildReport};

/// 构建配置
pub use epub::BuildConfig;

/// 错误处理
pub use epub::{BuildError, Result};

// === 构建阶段（高级用法） ===

/// 清单加载
pub use epub::{BookManifest, BookMetadata};

/// 文件集与脊柱解析
pub use epub::{
    FileResolver,
    FileSet,
    ResolvedFile,
    Spine,
    generate_file_id,
    resolve_files,
    resolve_spine,
};

/// 内容过滤器与模板
pub use epub::{
    ContentFilter,
    Exporter,
    FilterRegistry,
    MarkdownFilter,
    PageContext,
    TemplateRenderer,
    Templates,
};

/// 描述文件
pub use epub::{Container, RootFile, PackageDocument, Ncx, Chapter, Section};

/// 打包与校验
pub use epub::{Archiver, PackageReader};

// === 库信息 ===

/// bookpress库的版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// bookpress库的描述
pub const DESCRIPTION: &str = "一个将Markdown源目录打包为EPUB电子书的Rust工具";

// === 便捷函数 ===

/// 使用默认配置构建电子书
///
/// 这是 `BookBuilder::new(BuildConfig::default()).build(..)` 的便捷包装函数。
///
/// # 参数
/// * `src_dir` - 包含 `book.json` 的源目录
/// * `out_file` - 输出的EPUB文件路径
///
/// # 示例
///
/// ```no_run
/// let report = bookpress::build("my-book", "my-book.epub")?;
/// println!("书名: {}", report.title);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn build<P, Q>(src_dir: P, out_file: Q) -> Result<BuildReport>
where
    P: AsRef<std::path::Path>,
    Q: AsRef<std::path::Path>,
{
    BookBuilder::new(BuildConfig::default()).build(src_dir, out_file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_description() {
        assert!(!DESCRIPTION.is_empty());
    }

    #[test]
    fn test_build_missing_source() {
        let result = build("/nonexistent/bookpress-source", "/tmp/never.epub");
        assert!(matches!(result, Err(BuildError::Manifest(_))));
    }
}
