//! 包内相对引用

/// 计算从 `from_file` 所在目录指向 `to_path` 的相对引用（两者均相对于内容目录）
pub(crate) fn relative_href(from_file: &str, to_path: &str) -> String {
    let from_dirs: Vec<&str> = match from_file.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    let to_parts: Vec<&str> = to_path.split('/').collect();

    let common = from_dirs
        .iter()
        .zip(to_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();
    // 文件名本身不能作为公共前缀
    let common = common.min(to_parts.len().saturating_sub(1));

    let mut parts: Vec<&str> = vec![".."; from_dirs.len() - common];
    parts.extend(&to_parts[common..]);
    parts.join("/")
}
