//! OPF（Open Packaging Format）包描述模块
//!
//! 此模块负责生成EPUB包中的content.opf，包括元数据、清单、脊柱等信息。

mod manifest;
mod metadata;
mod package;
mod spine;

pub use manifest::ManifestItem;
pub use metadata::{DublinCore, Metadata, UNIQUE_IDENTIFIER};
pub use package::PackageDocument;
pub use spine::SpineItem;
