//! 打包模块
//!
//! 将工作目录打包为EPUB文件：第一个条目必须是未压缩的 `mimetype`，
//! 随后按深度优先顺序加入工作目录中的所有目录和文件。

use crate::epub::error::{BuildError, Result};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// mimetype条目的名称
pub const MIMETYPE_ENTRY: &str = "mimetype";

/// EPUB包的mimetype内容
pub const EPUB_MIMETYPE: &str = "application/epub+zip";

/// EPUB打包器
#[derive(Debug, Clone)]
pub struct Archiver {
    excludes: Vec<String>,
    template_archive: Option<PathBuf>,
}

impl Archiver {
    /// 创建打包器，`excludes` 中的文件名不会被打包
    pub fn new(excludes: Vec<String>) -> Self {
        Self {
            excludes,
            template_archive: None,
        }
    }

    /// 使用已包含mimetype条目的模板归档作为起点
    pub fn with_template_archive<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.template_archive = Some(path.into());
        self
    }

    /// 打包工作目录并原子地替换目标文件
    ///
    /// # 参数
    /// * `work_dir` - 工作目录根
    /// * `target` - 输出的EPUB文件路径
    ///
    /// # 返回值
    /// * `Result<()>` - 模板归档不存在、归档无法写入或最终移动失败时返回 `BuildError::Packaging`
    pub fn create(&self, work_dir: &Path, target: &Path) -> Result<()> {
        let target_dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut package = NamedTempFile::new_in(target_dir)
            .map_err(packaging("无法创建临时归档文件"))?;

        let mut zip = match &self.template_archive {
            Some(template) => {
                let mut source = File::open(template).map_err(|e| {
                    BuildError::Packaging(format!("模板归档 '{}' 不存在: {}", template.display(), e))
                })?;
                io::copy(&mut source, package.as_file_mut())
                    .map_err(packaging("无法复制模板归档"))?;
                ZipWriter::new_append(package.as_file()).map_err(packaging("无法打开归档"))?
            }
            None => {
                let mut zip = ZipWriter::new(package.as_file());
                zip.start_file(MIMETYPE_ENTRY, stored_options())
                    .map_err(packaging("无法写入mimetype条目"))?;
                zip.write_all(EPUB_MIMETYPE.as_bytes())
                    .map_err(packaging("无法写入mimetype条目"))?;
                zip
            }
        };

        let walker = WalkDir::new(work_dir)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_excluded(entry.file_name().to_string_lossy().as_ref()));

        let mut entries = 0usize;
        for entry in walker {
            let entry = entry.map_err(packaging("无法遍历工作目录"))?;
            let name = entry_name(work_dir, entry.path())?;

            if entry.file_type().is_dir() {
                debug!(%name, "加入目录");
                zip.add_directory(format!("{}/", name), deflated_options())
                    .map_err(packaging("无法写入目录条目"))?;
            } else if entry.file_type().is_file() {
                debug!(%name, "加入文件");
                let bytes = fs::read(entry.path()).map_err(packaging("无法读取待打包文件"))?;
                zip.start_file(name.as_str(), deflated_options())
                    .map_err(packaging("无法写入文件条目"))?;
                zip.write_all(&bytes).map_err(packaging("无法写入文件条目"))?;
            }
            entries += 1;
        }

        zip.finish().map_err(packaging("无法完成归档"))?;
        package.persist(target).map_err(|e| {
            BuildError::Packaging(format!("无法移动归档到 '{}': {}", target.display(), e.error))
        })?;

        info!(target = %target.display(), entries, "EPUB打包完成");
        Ok(())
    }

    fn is_excluded(&self, file_name: &str) -> bool {
        self.excludes.iter().any(|exclude| exclude == file_name)
    }
}

/// 固定时间戳保证相同输入得到相同的包
fn fixed_time() -> DateTime {
    DateTime::default()
}

fn stored_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Stored)
        .last_modified_time(fixed_time())
}

fn deflated_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(fixed_time())
}

/// 相对于工作目录、以 `/` 分隔的条目名
fn entry_name(work_dir: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(work_dir).map_err(|_| {
        BuildError::Packaging(format!("'{}' 不在工作目录中", path.display()))
    })?;
    let parts: Vec<String> = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}

fn packaging<E: std::fmt::Display>(context: &'static str) -> impl FnOnce(E) -> BuildError {
    move |e| BuildError::Packaging(format!("{}: {}", context, e))
}
