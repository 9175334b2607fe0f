use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;
use zip::{CompressionMethod, ZipArchive};

use crate::epub::archive::{EPUB_MIMETYPE, MIMETYPE_ENTRY};
use crate::epub::container::{CONTAINER_PATH, Container};
use crate::epub::error::{BuildError, Result};

/// 已打包的EPUB文件，用于校验构建结果
pub struct PackageReader {
    archive: ZipArchive<File>,
    container: Container,
}

impl PackageReader {
    /// 打开并校验EPUB文件
    ///
    /// 检查步骤：
    /// 1. 第一个条目是未压缩的mimetype文件
    /// 2. mimetype文件的内容为"application/epub+zip"
    /// 3. META-INF/container.xml可以解析且声明了rootfile
    ///
    /// # 参数
    /// * `path` - epub文件的路径
    ///
    /// # 返回值
    /// * `Result<PackageReader>` - 校验失败时返回 `BuildError::InvalidPackage`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<PackageReader> {
        let file = File::open(path.as_ref())?;
        let mut archive = ZipArchive::new(file)
            .map_err(|e| BuildError::InvalidPackage(format!("无法读取归档: {}", e)))?;

        validate_mimetype(&mut archive)?;
        let container = read_container(&mut archive)?;
        debug!(path = %path.as_ref().display(), entries = archive.len(), "EPUB校验成功");

        Ok(PackageReader { archive, container })
    }

    /// 包内的container.xml
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// 主OPF文件在包内的路径
    pub fn opf_path(&self) -> Result<String> {
        self.container.get_opf_path().ok_or_else(|| {
            BuildError::InvalidPackage("container.xml中没有找到有效的rootfile".to_string())
        })
    }

    /// 按归档顺序列出所有条目
    pub fn list_files(&mut self) -> Result<Vec<String>> {
        let mut files = Vec::with_capacity(self.archive.len());
        for i in 0..self.archive.len() {
            let file = self.archive.by_index(i)?;
            files.push(file.name().to_string());
        }
        Ok(files)
    }

    /// 读取指定条目的文本内容
    pub fn read_file(&mut self, name: &str) -> Result<String> {
        let mut file = self.archive.by_name(name)?;
        let mut content = String::new();
        file.read_to_string(&mut content)?;
        Ok(content)
    }

    /// 读取指定条目的二进制内容
    pub fn read_binary_file(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut file = self.archive.by_name(name)?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        Ok(buffer)
    }
}

fn validate_mimetype(archive: &mut ZipArchive<File>) -> Result<()> {
    if archive.is_empty() {
        return Err(BuildError::InvalidPackage("归档为空".to_string()));
    }

    let mut first = archive.by_index(0)?;
    if first.name() != MIMETYPE_ENTRY {
        return Err(BuildError::InvalidPackage(format!(
            "第一个条目应为mimetype，实际为 '{}'",
            first.name()
        )));
    }
    if first.compression() != CompressionMethod::Stored {
        return Err(BuildError::InvalidPackage("mimetype条目不能被压缩".to_string()));
    }

    let mut content = String::new();
    first.read_to_string(&mut content)?;
    if content != EPUB_MIMETYPE {
        return Err(BuildError::InvalidPackage(format!(
            "mimetype内容应为 '{}'，实际为 '{}'",
            EPUB_MIMETYPE, content
        )));
    }
    Ok(())
}

fn read_container(archive: &mut ZipArchive<File>) -> Result<Container> {
    let mut file = archive
        .by_name(CONTAINER_PATH)
        .map_err(|_| BuildError::InvalidPackage(format!("缺少 {}", CONTAINER_PATH)))?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    Container::parse_xml(&content)
}
