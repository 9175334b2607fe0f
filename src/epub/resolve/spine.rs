//! 脊柱解析模块
//!
//! 根据清单中的 `spine` 声明和已解析的文件集确定阅读顺序与目录文件。

use crate::epub::error::{BuildError, Result};
use crate::epub::resolve::files::FileSet;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

/// 阅读顺序（脊柱）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Spine {
    /// 目录文件ID（只有在文件集中存在时才会设置）
    pub toc: Option<String>,
    /// 按阅读顺序排列的文件ID
    pub items: Vec<String>,
}

impl Spine {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// 脊柱条目：字面ID或 `|...|` 形式的通配模式
#[derive(Debug)]
enum SpineEntry<'a> {
    Literal(&'a str),
    Pattern(Regex),
}

impl<'a> SpineEntry<'a> {
    fn parse(item: &'a str) -> Result<Self> {
        if item.len() >= 2 && item.starts_with('|') && item.ends_with('|') {
            let inner = &item[1..item.len() - 1];
            let pattern = Regex::new(&inner.replace('|', "/")).map_err(|e| {
                BuildError::Resolution(format!("无效的脊柱模式 '{}': {}", item, e))
            })?;
            Ok(SpineEntry::Pattern(pattern))
        } else {
            Ok(SpineEntry::Literal(item))
        }
    }
}

/// 解析原始 `spine` 声明
///
/// 未知ID和不匹配任何文件的模式会被静默丢弃；模式按文件集插入顺序展开，
/// 同一文件在一次展开中只出现一次。模式同时匹配文件ID和文件路径。
pub fn resolve_spine(raw: &Value, files: &FileSet) -> Result<Spine> {
    let section = raw
        .as_object()
        .ok_or_else(|| BuildError::Resolution("spine 必须是一个对象".to_string()))?;

    let toc = match section.get("toc") {
        None | Some(Value::Null) => None,
        Some(Value::String(toc)) if files.contains(toc) => Some(toc.clone()),
        Some(Value::String(toc)) => {
            warn!(%toc, "目录文件不在文件集中，已忽略");
            None
        }
        Some(other) => {
            return Err(BuildError::Resolution(format!("无效的 spine.toc: {}", other)));
        }
    };

    let raw_items = section
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| BuildError::Resolution("spine 缺少 items 列表".to_string()))?;

    let mut items = Vec::new();
    for raw_item in raw_items {
        let item = raw_item
            .as_str()
            .ok_or_else(|| BuildError::Resolution(format!("无效的 spine 条目: {}", raw_item)))?;

        match SpineEntry::parse(item)? {
            SpineEntry::Literal(id) => {
                if files.contains(id) {
                    items.push(id.to_string());
                } else {
                    warn!(%id, "脊柱条目不在文件集中，已忽略");
                }
            }
            SpineEntry::Pattern(pattern) => {
                let before = items.len();
                items.extend(
                    files
                        .iter()
                        .filter(|file| pattern.is_match(&file.id) || pattern.is_match(&file.path))
                        .map(|file| file.id.clone()),
                );
                debug!(%item, matched = items.len() - before, "展开脊柱模式");
            }
        }
    }

    Ok(Spine { toc, items })
}
