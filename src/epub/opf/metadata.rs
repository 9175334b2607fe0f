//! 元数据模块
//!
//! 将书籍清单中的身份信息和可选元数据转换为OPF中的Dublin Core元素。

use crate::epub::manifest::BookManifest;

/// OPF中唯一标识符元素的ID
pub const UNIQUE_IDENTIFIER: &str = "BookId";

/// 单个Dublin Core元素，如 `<dc:creator opf:role="aut">张三</dc:creator>`
#[derive(Debug, Clone, PartialEq)]
pub struct DublinCore {
    /// 带前缀的标签名（如 `dc:title`）
    pub tag: &'static str,
    /// 元素内容
    pub value: String,
    /// 元素属性
    pub attributes: Vec<(&'static str, String)>,
}

impl DublinCore {
    pub fn new(tag: &'static str, value: impl Into<String>) -> Self {
        Self {
            tag,
            value: value.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attributes.push((name, value.into()));
        self
    }
}

/// OPF文件中的元数据信息
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    elements: Vec<DublinCore>,
}

impl Metadata {
    /// 由书籍清单构建元数据，按固定顺序输出，缺省的可选字段不会出现
    pub fn from_manifest(manifest: &BookManifest) -> Self {
        let mut metadata = Self::default();
        let optional = manifest.metadata();

        metadata.push(
            DublinCore::new("dc:identifier", manifest.id()).with_attribute("id", UNIQUE_IDENTIFIER),
        );
        metadata.push(DublinCore::new("dc:title", manifest.title()));
        metadata.push(DublinCore::new("dc:language", manifest.language()));

        for author in &optional.authors {
            metadata.push(DublinCore::new("dc:creator", author.as_str()).with_attribute("opf:role", "aut"));
        }

        let singles = [
            ("dc:date", &optional.date),
            ("dc:description", &optional.description),
            ("dc:publisher", &optional.publisher),
            ("dc:relation", &optional.relation),
            ("dc:rights", &optional.rights),
        ];
        for (tag, value) in singles {
            if let Some(value) = value {
                metadata.push(DublinCore::new(tag, value.as_str()));
            }
        }

        for subject in &optional.subjects {
            metadata.push(DublinCore::new("dc:subject", subject.as_str()));
        }

        metadata
    }

    pub fn push(&mut self, element: DublinCore) {
        self.elements.push(element);
    }

    pub fn elements(&self) -> &[DublinCore] {
        &self.elements
    }

    /// 获取第一个指定标签的值
    pub fn first(&self, tag: &str) -> Option<&str> {
        self.elements
            .iter()
            .find(|element| element.tag == tag)
            .map(|element| element.value.as_str())
    }
}
