//! NCX文档生成

use crate::epub::error::Result;
use crate::epub::href::relative_href;
use crate::epub::ncx::navigation::{NavMap, NavPoint};
use crate::epub::ncx::toc::Chapter;
use crate::epub::xml;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

const NCX_DOCTYPE: &str =
    r#"ncx PUBLIC "-//NISO//DTD ncx 2005-1//EN" "http://www.daisy.org/z3986/2005/ncx-2005-1.dtd""#;

/// NCX导航文件
#[derive(Debug, Clone, PartialEq)]
pub struct Ncx {
    /// 书籍ID（dtb:uid）
    pub uid: String,
    /// 文档标题
    pub title: String,
    pub nav_map: NavMap,
}

impl Ncx {
    /// 由提取的章节构建NCX
    ///
    /// # 参数
    /// * `uid` - 书籍ID
    /// * `title` - 书籍标题
    /// * `ncx_path` - NCX文件在内容目录中的路径，用于计算相对引用
    /// * `chapters` - 按阅读顺序排列的章节
    pub fn from_chapters(uid: &str, title: &str, ncx_path: &str, chapters: &[Chapter]) -> Self {
        let mut nav_map = NavMap::new();
        let mut play_order = 0;
        let mut next_point = |label: &str, src: &str| {
            play_order += 1;
            NavPoint::new(play_order, label, relative_href(ncx_path, src))
        };

        for chapter in chapters {
            let mut point = next_point(&chapter.title, &chapter.src);
            for section in &chapter.sections {
                point.add_child(next_point(&section.title, &section.src));
            }
            nav_map.push(point);
        }

        Self {
            uid: uid.to_string(),
            title: title.to_string(),
            nav_map,
        }
    }

    /// 导航深度（dtb:depth）
    pub fn depth(&self) -> u32 {
        self.nav_map.depth()
    }

    /// 生成toc.ncx内容
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = xml::new_writer();
        xml::write_declaration(&mut writer)?;
        xml::write_doctype(&mut writer, NCX_DOCTYPE)?;

        writer.write_event(Event::Start(BytesStart::new("ncx").with_attributes([
            ("xmlns", "http://www.daisy.org/z3986/2005/ncx/"),
            ("version", "2005-1"),
        ])))?;

        writer.write_event(Event::Start(BytesStart::new("head")))?;
        let depth = self.depth().to_string();
        let metas = [
            ("dtb:uid", self.uid.as_str()),
            ("dtb:depth", depth.as_str()),
            ("dtb:totalPageCount", "0"),
            ("dtb:maxPageNumber", "0"),
        ];
        for (name, content) in metas {
            writer
                .create_element("meta")
                .with_attribute(("name", name))
                .with_attribute(("content", content))
                .write_empty()?;
        }
        writer.write_event(Event::End(BytesEnd::new("head")))?;

        writer.write_event(Event::Start(BytesStart::new("docTitle")))?;
        writer
            .create_element("text")
            .write_text_content(BytesText::new(&self.title))?;
        writer.write_event(Event::End(BytesEnd::new("docTitle")))?;

        if self.nav_map.is_empty() {
            writer.write_event(Event::Empty(BytesStart::new("navMap")))?;
        } else {
            writer.write_event(Event::Start(BytesStart::new("navMap")))?;
            for point in &self.nav_map.points {
                write_nav_point(&mut writer, point)?;
            }
            writer.write_event(Event::End(BytesEnd::new("navMap")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("ncx")))?;
        Ok(xml::into_string(writer))
    }
}

fn write_nav_point(writer: &mut Writer<Vec<u8>>, point: &NavPoint) -> Result<()> {
    let play_order = point.play_order.to_string();
    writer.write_event(Event::Start(BytesStart::new("navPoint").with_attributes([
        ("id", point.id.as_str()),
        ("playOrder", play_order.as_str()),
    ])))?;

    writer.write_event(Event::Start(BytesStart::new("navLabel")))?;
    writer
        .create_element("text")
        .write_text_content(BytesText::new(&point.label))?;
    writer.write_event(Event::End(BytesEnd::new("navLabel")))?;

    writer
        .create_element("content")
        .with_attribute(("src", point.src.as_str()))
        .write_empty()?;

    for child in &point.children {
        write_nav_point(writer, child)?;
    }

    writer.write_event(Event::End(BytesEnd::new("navPoint")))?;
    Ok(())
}
