//! registry-gen 命令行工具
//!
//! 在构建脚本之外手动运行扫描、查看或清空共享存储。

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use registry_common::{
    init_logging, EnvironmentOptionSource, LoggingConfig, MapOptionSource, OptionsLoader,
    ProcessorOptions, TomlOptionSource,
};
use registry_processor::{build, ArtifactWriter, FinishOutcome, RegistryProcessor, SourceContext};
use registry_store::{FileSharedStore, SharedStore};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "registry-gen")]
#[command(version)]
#[command(about = "跨模块注册表生成工具")]
struct Cli {
    /// 输出调试日志
    #[arg(short, long, global = true)]
    verbose: bool,

    /// 以 JSON 格式输出日志
    #[arg(long, global = true)]
    log_json: bool,

    /// 配置文件路径（默认读取 crate 目录下的 registry.toml）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// cargo 目标目录，未配置 outputRoot 时用于定位共享存储
    #[arg(long, global = true, default_value = "target")]
    target_dir: PathBuf,

    /// 构建配置名（dev、release 或自定义配置）
    #[arg(long, global = true, default_value = "debug")]
    profile: String,

    /// 覆盖配置项，格式 key=value，可重复
    #[arg(short = 'O', long = "option", global = true, value_name = "KEY=VALUE")]
    options: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 扫描一个 crate 并写入共享存储，收集模块同时生成注册表
    Scan {
        /// crate 目录（包含 Cargo.toml）
        #[arg(short, long, default_value = ".")]
        manifest_dir: PathBuf,

        /// 生成文件输出目录（默认 <outputRoot>/generated/registry）
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// 作为收集模块运行
        #[arg(long)]
        collector: bool,

        /// 注册表返回的句柄类型
        #[arg(long)]
        handle_type: Option<String>,

        /// 以 JSON 输出本轮结果
        #[arg(long)]
        json: bool,
    },

    /// 共享存储操作
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },
}

#[derive(Subcommand, Debug)]
enum StoreAction {
    /// 列出共享存储中的注册项
    List {
        /// 以 JSON 输出
        #[arg(long)]
        json: bool,
    },

    /// 删除共享存储文件
    Clear,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logging = if cli.verbose {
        LoggingConfig::development()
    } else {
        LoggingConfig::default()
    };
    logging.json_format = cli.log_json;
    init_logging(&logging).context("初始化日志失败")?;

    match &cli.command {
        Commands::Scan {
            manifest_dir,
            out_dir,
            collector,
            handle_type,
            json,
        } => {
            let mut overrides = cli.options.clone();
            if *collector {
                overrides.push("collector=true".to_string());
            }
            if let Some(handle_type) = handle_type {
                overrides.push(format!("handleType={}", handle_type));
            }
            let options = load_options(&cli, manifest_dir, &overrides)?;
            run_scan(manifest_dir, out_dir.as_deref(), options, *json)
        }
        Commands::Store { action } => {
            let options = load_options(&cli, Path::new("."), &cli.options)?;
            let store = FileSharedStore::new(options.resolved_store_path());
            if !store.path().is_file() {
                warn!(
                    "共享存储不存在: {}，请检查 --target-dir / --profile 或 outputRoot 配置",
                    store.location()
                );
            }
            match action {
                StoreAction::List { json } => list_store(&store, *json),
                StoreAction::Clear if !store.path().exists() => Ok(()),
                StoreAction::Clear => {
                    store.clear().context("清空共享存储失败")?;
                    info!("已清空共享存储: {}", store.location());
                    Ok(())
                }
            }
        }
    }
}

/// 按 配置文件 < 环境变量 < 命令行 的优先级加载配置
///
/// 未配置 outputRoot 时使用 `<target-dir>/<profile>`，与构建脚本写入的位置一致。
fn load_options(cli: &Cli, manifest_dir: &Path, overrides: &[String]) -> Result<ProcessorOptions> {
    let config_file = cli
        .config
        .clone()
        .unwrap_or_else(|| manifest_dir.join(build::CONFIG_FILE_NAME));

    let mut options = OptionsLoader::new()
        .with_source(TomlOptionSource::new(&config_file))
        .with_source(EnvironmentOptionSource::new())
        .with_source(MapOptionSource::from_pairs(overrides).context("命令行配置项格式错误")?)
        .load()
        .with_context(|| format!("加载配置失败: {}", config_file.display()))?;

    if options.output_root.is_none() {
        options.output_root = Some(build::output_root_for_profile(&cli.target_dir, &cli.profile));
    }
    Ok(options)
}

fn run_scan(
    manifest_dir: &Path,
    out_dir: Option<&Path>,
    options: ProcessorOptions,
    json: bool,
) -> Result<()> {
    let context = SourceContext::from_manifest_dir(manifest_dir)
        .with_context(|| format!("无法加载 crate: {}", manifest_dir.display()))?;

    let out_dir = out_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| options.output_root().join("generated/registry"));
    let writer = ArtifactWriter::new(&out_dir, options.on_existing);

    let mut processor = RegistryProcessor::with_file_store(options);
    let round = processor.process(&context);
    let finish = processor.finish(&writer).context("生成注册表失败")?;

    if json {
        let report = serde_json::json!({
            "module": context.crate_name(),
            "round": round,
            "finish": finish,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for entry in &round.discovered {
        println!("discovered {}", entry.qualified_name());
    }
    for declaration in &round.deferred {
        println!(
            "deferred   {} ({})",
            declaration.qualified_name(),
            declaration.unresolved.join(", ")
        );
    }
    if let FinishOutcome::Emitted {
        artifact,
        module_count,
    } = &finish
    {
        println!(
            "generated  {} ({} modules, {:?})",
            artifact.path.display(),
            module_count,
            artifact.status
        );
    }
    Ok(())
}

fn list_store(store: &FileSharedStore, json: bool) -> Result<()> {
    let entries = store
        .read()
        .with_context(|| format!("读取共享存储失败: {}", store.location()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for entry in &entries {
            println!("{}", entry.to_line());
        }
        info!("共享存储 {} 中共 {} 个注册项", store.location(), entries.len());
    }
    Ok(())
}
