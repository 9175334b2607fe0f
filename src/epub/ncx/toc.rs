//! 目录提取模块
//!
//! 从已导出的页面中提取章节结构：一级标题为章节，带 `id` 的二级标题为小节。

use crate::epub::resolve::{FileSet, Spine};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::warn;

static H1_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("body h1").expect("有效的h1选择器"));

static H2_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("body h2[id]").expect("有效的h2选择器"));

/// 章节下的小节
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    /// 小节标题
    pub title: String,
    /// 引用路径，形如 `path#anchor`
    pub src: String,
}

/// 章节
#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    /// 对应的文件ID
    pub id: String,
    /// 章节标题
    pub title: String,
    /// 章节文件路径
    pub src: String,
    /// 小节列表
    pub sections: Vec<Section>,
}

/// 单个页面中的标题结构
#[derive(Debug, Clone, PartialEq)]
pub struct Headings {
    /// 第一个一级标题
    pub title: String,
    /// `(锚点, 标题)` 形式的二级标题
    pub sections: Vec<(String, String)>,
}

/// 从页面标记中提取标题；没有一级标题时返回 `None`
pub fn extract_headings(markup: &str) -> Option<Headings> {
    let document = Html::parse_document(markup);
    let title = document.select(&H1_SELECTOR).next().map(element_text)?;

    let sections = document
        .select(&H2_SELECTOR)
        .filter_map(|heading| {
            let anchor = heading.value().attr("id")?.trim();
            if anchor.is_empty() {
                return None;
            }
            Some((anchor.to_string(), element_text(heading)))
        })
        .collect();

    Some(Headings { title, sections })
}

/// 按脊柱顺序从已导出的文件中提取章节
///
/// # 参数
/// * `content_root` - 工作目录中的内容目录
/// * `files` - 导出后的文件集
/// * `spine` - 阅读顺序
///
/// 无法读取或没有一级标题的文件会被跳过，不会中断构建。
/// 脊柱中重复出现的条目只生成一个章节。
pub fn extract_chapters(content_root: &Path, files: &FileSet, spine: &Spine) -> Vec<Chapter> {
    let mut chapters = Vec::new();
    let mut seen = HashSet::new();

    for id in &spine.items {
        if !seen.insert(id.as_str()) {
            continue;
        }
        let Some(file) = files.get(id) else {
            continue;
        };

        let markup = match fs::read(content_root.join(&file.path)) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                warn!(%id, path = %file.path, error = %e, "无法读取目录源文件，已跳过");
                continue;
            }
        };

        let Some(headings) = extract_headings(&markup) else {
            warn!(%id, path = %file.path, "文件中没有一级标题，已跳过");
            continue;
        };

        let sections = headings
            .sections
            .into_iter()
            .map(|(anchor, title)| Section {
                title,
                src: format!("{}#{}", file.path, anchor),
            })
            .collect();

        chapters.push(Chapter {
            id: id.clone(),
            title: headings.title,
            src: file.path.clone(),
            sections,
        });
    }

    chapters
}

/// 元素的纯文本内容，连续空白折叠为单个空格
fn element_text(element: ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
