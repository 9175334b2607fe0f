pub mod error;
pub mod config;
pub mod manifest;
pub mod resolve;
pub mod export;
pub mod opf;
pub mod ncx;
pub mod container;
pub mod archive;
pub mod reader;
pub mod builder;

mod href;
mod xml;

// 重新导出错误处理
pub use error::{BuildError, Result};

// 重新导出配置和清单
pub use config::BuildConfig;
pub use manifest::{BookManifest, BookMetadata};

// 重新导出文件集与脊柱解析
pub use resolve::{
    FileResolver,
    FileSet,
    ResolvedFile,
    Spine,
    generate_file_id,
    resolve_files,
    resolve_spine
};

// 重新导出内容导出相关
pub use export::{
    ContentFilter,
    Exporter,
    FilterRegistry,
    MarkdownFilter,
    PageContext,
    TemplateRenderer,
    Templates
};

// 重新导出描述文件相关
pub use container::{Container, RootFile};
pub use opf::{PackageDocument, Metadata, ManifestItem, SpineItem};
pub use ncx::{Ncx, NavPoint, NavMap, Chapter, Section, extract_chapters};

// 重新导出打包、校验和构建流程
pub use archive::Archiver;
pub use reader::PackageReader;
pub use builder::{BookBuilder, BuildReport};
