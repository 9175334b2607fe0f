use crate::epub::error::{BuildError, Result};
use crate::epub::xml;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::reader::Reader;

/// OPF包文件的媒体类型
pub const OPF_MEDIA_TYPE: &str = "application/oebps-package+xml";

/// 内容目录中OPF文件的名称
pub const OPF_FILE: &str = "content.opf";

/// container.xml在包内的路径
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Container.xml中的rootfile信息
#[derive(Debug, Clone, PartialEq)]
pub struct RootFile {
    pub full_path: String,
    pub media_type: String,
}

/// Container.xml的内容
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub rootfiles: Vec<RootFile>,
}

impl Container {
    /// 创建指向内容目录中 `content.opf` 的容器描述
    pub fn for_content_dir(content_dir: &str) -> Self {
        Self {
            rootfiles: vec![RootFile {
                full_path: format!("{}/{}", content_dir, OPF_FILE),
                media_type: OPF_MEDIA_TYPE.to_string(),
            }],
        }
    }

    /// 生成container.xml内容
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = xml::new_writer();
        xml::write_declaration(&mut writer)?;

        writer.write_event(Event::Start(BytesStart::new("container").with_attributes([
            ("version", "1.0"),
            ("xmlns", "urn:oasis:names:tc:opendocument:xmlns:container"),
        ])))?;
        writer.write_event(Event::Start(BytesStart::new("rootfiles")))?;
        for rootfile in &self.rootfiles {
            writer
                .create_element("rootfile")
                .with_attribute(("full-path", rootfile.full_path.as_str()))
                .with_attribute(("media-type", rootfile.media_type.as_str()))
                .write_empty()?;
        }
        writer.write_event(Event::End(BytesEnd::new("rootfiles")))?;
        writer.write_event(Event::End(BytesEnd::new("container")))?;

        Ok(xml::into_string(writer))
    }

    /// 解析container.xml内容
    ///
    /// 没有任何完整的rootfile条目时返回 `BuildError::InvalidPackage`。
    pub fn parse_xml(xml_content: &str) -> Result<Container> {
        let mut reader = Reader::from_str(xml_content);
        reader.config_mut().trim_text(true);

        let mut rootfiles = Vec::new();
        loop {
            match reader.read_event()? {
                Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"rootfile" => {
                    let full_path = attribute(&e, b"full-path")?;
                    let media_type = attribute(&e, b"media-type")?;
                    if let (Some(full_path), Some(media_type)) = (full_path, media_type) {
                        rootfiles.push(RootFile {
                            full_path,
                            media_type,
                        });
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if rootfiles.is_empty() {
            return Err(BuildError::InvalidPackage(
                "container.xml中没有找到任何rootfile条目".to_string(),
            ));
        }
        Ok(Container { rootfiles })
    }

    /// 获取主要的OPF文件路径
    pub fn get_opf_path(&self) -> Option<String> {
        self.rootfiles
            .iter()
            .find(|rootfile| rootfile.media_type == OPF_MEDIA_TYPE)
            .or_else(|| self.rootfiles.first())
            .map(|rootfile| rootfile.full_path.clone())
    }
}

/// 读取元素上非空的属性值
fn attribute(element: &BytesStart, name: &[u8]) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| BuildError::InvalidPackage(format!("container.xml属性无效: {}", e)))?;
        if attr.key.local_name().as_ref() == name && !attr.value.is_empty() {
            return Ok(Some(String::from_utf8_lossy(&attr.value).into_owned()));
        }
    }
    Ok(None)
}
