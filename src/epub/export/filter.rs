//! 内容过滤器
//!
//! 过滤器把源文件文本转换为页面内容（例如Markdown转换为XHTML片段），按扩展名注册。

use pulldown_cmark::{Options, Parser, html};
use std::collections::HashMap;
use std::fmt;

/// 文本转换接口
pub trait ContentFilter {
    fn transform(&self, text: &str) -> String;
}

impl<F> ContentFilter for F
where
    F: Fn(&str) -> String,
{
    fn transform(&self, text: &str) -> String {
        self(text)
    }
}

/// 基于pulldown-cmark的Markdown过滤器
#[derive(Debug, Clone, Copy)]
pub struct MarkdownFilter {
    options: Options,
}

impl MarkdownFilter {
    /// 启用表格、脚注、删除线和标题属性（`## 标题 {#锚点}`）
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        Self { options }
    }
}

impl Default for MarkdownFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentFilter for MarkdownFilter {
    fn transform(&self, text: &str) -> String {
        let parser = Parser::new_ext(text, self.options);
        let mut output = String::with_capacity(text.len() * 3 / 2);
        html::push_html(&mut output, parser);
        output
    }
}

/// 扩展名到过滤器的映射
#[derive(Default)]
pub struct FilterRegistry {
    filters: HashMap<String, Box<dyn ContentFilter>>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为给定的扩展名注册Markdown过滤器
    pub fn with_markdown<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Self::new();
        for extension in extensions {
            registry.register(extension.as_ref(), MarkdownFilter::new());
        }
        registry
    }

    /// 注册过滤器（扩展名不含点，区分大小写）
    pub fn register<F>(&mut self, extension: &str, filter: F)
    where
        F: ContentFilter + 'static,
    {
        self.filters.insert(extension.to_string(), Box::new(filter));
    }

    pub fn get(&self, extension: &str) -> Option<&dyn ContentFilter> {
        self.filters.get(extension).map(|filter| filter.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut extensions: Vec<&String> = self.filters.keys().collect();
        extensions.sort();
        f.debug_struct("FilterRegistry")
            .field("extensions", &extensions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_filter() {
        let html = MarkdownFilter::new().transform("# Title\n\n## Part {#part-1}\n\nSome *text*.");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains(r#"<h2 id="part-1">Part</h2>"#));
        assert!(html.contains("<em>text</em>"));
    }

    #[test]
    fn test_closure_filter_and_lookup() {
        let mut registry = FilterRegistry::new();
        assert!(registry.is_empty());
        registry.register("txt", |text: &str| format!("<pre>{}</pre>", text.trim()));

        let filter = registry.get("txt").unwrap();
        assert_eq!(filter.transform(" hi \n"), "<pre>hi</pre>");
        assert!(registry.get("md").is_none());
    }

    #[test]
    fn test_with_markdown_registers_all_extensions() {
        let registry = FilterRegistry::with_markdown(["md", "markdown"]);
        assert!(registry.get("md").is_some());
        assert!(registry.get("markdown").is_some());
        assert_eq!(format!("{:?}", registry), r#"FilterRegistry { extensions: ["markdown", "md"] }"#);
    }
}
