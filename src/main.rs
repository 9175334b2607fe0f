use bookpress::{BookBuilder, BuildConfig, BuildReport, PackageReader, Result};
use clap::error::ErrorKind;
use clap::{Arg, ArgAction, Command, CommandFactory, FromArgMatches, Parser};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// 参数缺失或无效
const EXIT_USAGE: i32 = 1;
/// 源目录无效
const EXIT_INVALID_SOURCE: i32 = 2;
/// 目标文件不可写
const EXIT_UNWRITABLE_TARGET: i32 = 3;

/// 📚 bookpress - EPUB构建工具
#[derive(Parser)]
#[command(name = "bookpress")]
#[command(about = "将包含book.json清单的源目录构建为EPUB电子书")]
#[command(version, disable_version_flag = true)]
struct Args {
    /// 源目录
    #[arg(help = "包含book.json的源目录", required_unless_present = "init_config")]
    source: Option<PathBuf>,

    /// 目标文件
    #[arg(help = "输出的EPUB文件路径", required_unless_present = "init_config")]
    target: Option<PathBuf>,

    /// 详细输出模式
    #[arg(long, help = "显示详细的构建日志")]
    verbose: bool,

    /// 构建配置文件
    #[arg(long, value_name = "FILE", help = "YAML格式的构建配置文件")]
    config: Option<PathBuf>,

    /// 模板目录
    #[arg(long, value_name = "DIR", help = "页面模板和模板归档所在目录")]
    templates: Option<PathBuf>,

    /// 构建后校验
    #[arg(long, help = "构建完成后校验生成的EPUB文件")]
    check: bool,

    /// 生成默认配置
    #[arg(long, value_name = "FILE", help = "将默认构建配置写入指定文件后退出")]
    init_config: Option<PathBuf>,
}

/// `-v` 用作版本参数
fn command() -> Command {
    Args::command().arg(
        Arg::new("version")
            .short('v')
            .long("version")
            .action(ArgAction::Version)
            .help("显示版本信息"),
    )
}

fn main() {
    let matches = match command().try_get_matches() {
        Ok(matches) => matches,
        Err(e) => exit_with_clap_error(e),
    };
    let args = match Args::from_arg_matches(&matches) {
        Ok(args) => args,
        Err(e) => exit_with_clap_error(e),
    };

    init_tracing(args.verbose);
    process::exit(run(args));
}

fn exit_with_clap_error(e: clap::Error) -> ! {
    let _ = e.print();
    match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => process::exit(0),
        _ => process::exit(EXIT_USAGE),
    }
}

fn init_tracing(verbose: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            "bookpress=debug".into()
        } else {
            "bookpress=info".into()
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(args: Args) -> i32 {
    if let Some(path) = &args.init_config {
        return match BuildConfig::generate_default_config(path) {
            Ok(()) => {
                println!("✅ 已生成默认配置文件: {}", path.display());
                0
            }
            Err(e) => {
                eprintln!("❌ 错误: {}", e);
                e.exit_code()
            }
        };
    }

    let (Some(source), Some(target)) = (args.source.as_deref(), args.target.as_deref()) else {
        eprintln!("❌ 错误: 需要提供源目录和目标文件");
        return EXIT_USAGE;
    };

    if !source.is_dir() {
        eprintln!("❌ 错误: '{}' 不是一个目录", source.display());
        return EXIT_INVALID_SOURCE;
    }

    if !is_writable_target(target) {
        eprintln!("❌ 错误: 无法写入目标文件 '{}'", target.display());
        return EXIT_UNWRITABLE_TARGET;
    }

    let mut config = match &args.config {
        Some(path) => match BuildConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("❌ 错误: {}", e);
                return e.exit_code();
            }
        },
        None => BuildConfig::default(),
    };
    if let Some(templates) = &args.templates {
        config = config.with_templates_dir(templates);
    }

    println!("📚 bookpress - EPUB构建工具");
    if args.verbose {
        println!("🔍 详细模式已启用");
    }
    println!("正在构建: {} → {}", source.display(), target.display());

    match BookBuilder::new(config).build(source, target) {
        Ok(report) => display_report(&report),
        Err(e) => {
            eprintln!("❌ 错误: {}", e);
            return e.exit_code();
        }
    }

    if args.check {
        if let Err(e) = check_package(target, args.verbose) {
            eprintln!("❌ 校验失败: {}", e);
            return e.exit_code();
        }
    }

    println!("🎉 EPUB构建完成！");
    0
}

/// 目标本身不是目录，且当前用户能在父目录中创建文件
fn is_writable_target(target: &Path) -> bool {
    if target.is_dir() {
        return false;
    }
    let parent = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    parent.is_dir() && tempfile::NamedTempFile::new_in(parent).is_ok()
}

fn display_report(report: &BuildReport) {
    println!("\n📖 书籍信息:");
    println!("  ID: {}", report.book_id);
    println!("  书名: {}", report.title);
    println!("  文件数: {}", report.files);
    println!("  阅读顺序: {} 项", report.spine_items);
    if report.chapters > 0 {
        println!("  导航章节: {} 个", report.chapters);
    }
}

fn check_package(path: &Path, verbose: bool) -> Result<()> {
    let mut package = PackageReader::open(path)?;

    println!("\n📁 EPUB文件内容:");
    let files = package.list_files()?;
    if verbose {
        for (i, file) in files.iter().enumerate() {
            println!("  {}. {}", i + 1, file);
        }
    } else {
        println!("  共 {} 个条目", files.len());
    }

    println!("\n📦 Container.xml信息:");
    println!("  📚 主OPF文件路径: {}", package.opf_path()?);
    println!("✅ EPUB校验成功");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_writable_target_in_existing_directory() {
        let dir = TempDir::new().unwrap();
        assert!(is_writable_target(&dir.path().join("book.epub")));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_directory_or_missing_parent_is_not_writable() {
        let dir = TempDir::new().unwrap();
        assert!(!is_writable_target(dir.path()));
        assert!(!is_writable_target(&dir.path().join("missing/book.epub")));
    }
}
