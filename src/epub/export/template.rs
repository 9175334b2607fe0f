//! 模板服务
//!
//! 四类模板：container.xml、包描述（content.opf）、导航描述（toc.ncx）和页面包装。
//! 页面模板按 "文件ID专属模板 > 默认page模板 > 内置模板" 的顺序查找。

use crate::epub::container::Container;
use crate::epub::error::{BuildError, Result};
use crate::epub::ncx::Ncx;
use crate::epub::opf::PackageDocument;
use quick_xml::escape::escape;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// 默认页面模板的文件名（不含扩展名）
pub const DEFAULT_PAGE_TEMPLATE: &str = "page";

/// 模板归档文件名
pub const TEMPLATE_ARCHIVE: &str = "mimetype.zip";

/// 页面包装模板的取值
#[derive(Debug, Clone, Copy, Default)]
pub struct PageContext<'a> {
    /// 书名
    pub title: &'a str,
    /// 过滤器转换后的内容（原样插入）
    pub content: &'a str,
    /// 样式表引用（相对于页面）
    pub style: Option<&'a str>,
    /// 书籍描述
    pub description: Option<&'a str>,
}

/// 模板渲染接口
pub trait TemplateRenderer {
    fn render_container(&self, container: &Container) -> Result<String> {
        container.to_xml()
    }

    fn render_package(&self, package: &PackageDocument) -> Result<String> {
        package.to_xml()
    }

    fn render_navigation(&self, ncx: &Ncx) -> Result<String> {
        ncx.to_xml()
    }

    /// 渲染页面，`file_id` 用于查找专属模板
    fn render_page(&self, file_id: &str, page: &PageContext<'_>) -> Result<String>;
}

/// 默认模板集，可选地从模板目录加载页面模板
#[derive(Debug, Clone, Default)]
pub struct Templates {
    dir: Option<PathBuf>,
}

impl Templates {
    /// 仅使用内置模板
    pub fn builtin() -> Self {
        Self { dir: None }
    }

    /// 使用模板目录中的覆盖
    pub fn from_dir<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    /// 模板目录中的模板归档（如果存在）
    pub fn template_archive(&self) -> Option<PathBuf> {
        self.dir
            .as_ref()
            .map(|dir| dir.join(TEMPLATE_ARCHIVE))
            .filter(|path| path.is_file())
    }

    /// 查找页面模板：文件ID专属模板优先于默认page模板
    fn find_page_template(&self, file_id: &str) -> Result<Option<String>> {
        let Some(dir) = &self.dir else {
            return Ok(None);
        };

        for name in [file_id, DEFAULT_PAGE_TEMPLATE] {
            let path = dir.join(format!("{}.xhtml", name));
            if path.is_file() {
                debug!(template = %path.display(), %file_id, "使用页面模板");
                let template = fs::read_to_string(&path).map_err(|e| {
                    BuildError::Export(format!("无法读取页面模板 '{}': {}", path.display(), e))
                })?;
                return Ok(Some(template));
            }
        }
        Ok(None)
    }
}

impl TemplateRenderer for Templates {
    fn render_page(&self, file_id: &str, page: &PageContext<'_>) -> Result<String> {
        match self.find_page_template(file_id)? {
            Some(template) => Ok(fill_placeholders(&template, page)),
            None => Ok(builtin_page(page)),
        }
    }
}

/// 替换 `{{BookTitle}}` 等占位符
fn fill_placeholders(template: &str, page: &PageContext<'_>) -> String {
    let description = page.description.map(escape).unwrap_or_default();
    template
        .replace("{{BookTitle}}", &escape(page.title))
        .replace("{{BookStyle}}", &escape(page.style.unwrap_or_default()))
        .replace("{{BookDescription}}", &description)
        .replace("{{BookContent}}", page.content)
}

fn builtin_page(page: &PageContext<'_>) -> String {
    let mut head = format!(
        "  <meta http-equiv=\"Content-Type\" content=\"application/xhtml+xml; charset=utf-8\"/>\n  <title>{}</title>\n",
        escape(page.title)
    );
    if let Some(style) = page.style {
        head.push_str(&format!(
            "  <link rel=\"stylesheet\" type=\"text/css\" href=\"{}\"/>\n",
            escape(style)
        ));
    }
    if let Some(description) = page.description {
        head.push_str(&format!(
            "  <meta name=\"description\" content=\"{}\"/>\n",
            escape(description)
        ));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN" "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd">
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
{head}</head>
<body>
{content}
</body>
</html>
"#,
        head = head,
        content = page.content.trim_end()
    )
}
