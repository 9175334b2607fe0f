//! XML输出辅助函数

use crate::epub::error::Result;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, Event};

/// 两空格缩进的内存写入器
pub(crate) fn new_writer() -> Writer<Vec<u8>> {
    Writer::new_with_indent(Vec::new(), b' ', 2)
}

/// 写入 `<?xml version="1.0" encoding="UTF-8"?>`
pub(crate) fn write_declaration(writer: &mut Writer<Vec<u8>>) -> Result<()> {
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    Ok(())
}

/// 写入DOCTYPE声明
pub(crate) fn write_doctype(writer: &mut Writer<Vec<u8>>, doctype: &str) -> Result<()> {
    writer.write_event(Event::DocType(quick_xml::events::BytesText::from_escaped(doctype)))?;
    Ok(())
}

pub(crate) fn into_string(writer: Writer<Vec<u8>>) -> String {
    let mut content = String::from_utf8_lossy(&writer.into_inner()).into_owned();
    content.push('\n');
    content
}
