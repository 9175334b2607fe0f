use crate::epub::error::Result;
use crate::epub::manifest::BookManifest;
use crate::epub::opf::manifest::ManifestItem;
use crate::epub::opf::metadata::{Metadata, UNIQUE_IDENTIFIER};
use crate::epub::opf::spine::SpineItem;
use crate::epub::resolve::{FileSet, Spine};
use crate::epub::xml;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

/// OPF包描述文件（content.opf）
#[derive(Debug, Clone, PartialEq)]
pub struct PackageDocument {
    /// 元数据
    pub metadata: Metadata,
    /// 清单项（按文件集顺序）
    pub manifest: Vec<ManifestItem>,
    /// 阅读顺序
    pub spine: Vec<SpineItem>,
    /// 脊柱引用的目录文件ID
    pub toc: Option<String>,
}

impl PackageDocument {
    /// 由清单、导出后的文件集和脊柱构建包描述
    pub fn new(book: &BookManifest, files: &FileSet, spine: &Spine) -> Self {
        Self {
            metadata: Metadata::from_manifest(book),
            manifest: files.iter().map(ManifestItem::from).collect(),
            spine: spine.items.iter().cloned().map(SpineItem::new).collect(),
            toc: spine.toc.clone(),
        }
    }

    /// 生成OPF 2.0格式的content.opf内容
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = xml::new_writer();
        xml::write_declaration(&mut writer)?;

        writer.write_event(Event::Start(BytesStart::new("package").with_attributes([
            ("xmlns", "http://www.idpf.org/2007/opf"),
            ("unique-identifier", UNIQUE_IDENTIFIER),
            ("version", "2.0"),
        ])))?;

        writer.write_event(Event::Start(BytesStart::new("metadata").with_attributes([
            ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
            ("xmlns:opf", "http://www.idpf.org/2007/opf"),
        ])))?;
        for element in self.metadata.elements() {
            let attributes = element
                .attributes
                .iter()
                .map(|(name, value)| (*name, value.as_str()));
            writer
                .create_element(element.tag)
                .with_attributes(attributes)
                .write_text_content(BytesText::new(&element.value))?;
        }
        writer.write_event(Event::End(BytesEnd::new("metadata")))?;

        writer.write_event(Event::Start(BytesStart::new("manifest")))?;
        for item in &self.manifest {
            writer
                .create_element("item")
                .with_attribute(("id", item.id.as_str()))
                .with_attribute(("href", item.href.as_str()))
                .with_attribute(("media-type", item.media_type.as_str()))
                .write_empty()?;
        }
        writer.write_event(Event::End(BytesEnd::new("manifest")))?;

        let mut spine = BytesStart::new("spine");
        if let Some(toc) = &self.toc {
            spine.push_attribute(("toc", toc.as_str()));
        }
        if self.spine.is_empty() {
            writer.write_event(Event::Empty(spine))?;
        } else {
            writer.write_event(Event::Start(spine))?;
            for item in &self.spine {
                writer
                    .create_element("itemref")
                    .with_attribute(("idref", item.idref.as_str()))
                    .write_empty()?;
            }
            writer.write_event(Event::End(BytesEnd::new("spine")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("package")))?;
        Ok(xml::into_string(writer))
    }
}
