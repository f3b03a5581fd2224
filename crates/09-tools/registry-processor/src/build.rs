//! 构建脚本接入
//!
//! 在模块 crate 的 `build.rs` 中调用：
//!
//! ```rust,ignore
//! fn main() -> anyhow::Result<()> {
//!     registry_processor::build::BuildScript::from_env()?.run()?;
//!     Ok(())
//! }
//! ```
//!
//! 收集模块额外指定 `collector` 和句柄类型，生成文件写入 `OUT_DIR`。

use crate::artifact::ArtifactWriter;
use crate::processor::{FinishOutcome, RegistryProcessor, RoundOutcome};
use crate::source_context::SourceContext;
use registry_common::{
    init_logging, EnvironmentOptionSource, LoggingConfig, MapOptionSource, OptionsLoader,
    ProcessorError, ProcessorOptions, ProcessorResult, TomlOptionSource, OPTION_KEYS,
};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 模块目录下的可选配置文件
pub const CONFIG_FILE_NAME: &str = "registry.toml";

/// 从 `OUT_DIR`（`target/<profile>/build/<pkg>-<hash>/out`）推导构建输出根目录
pub fn output_root_from_out_dir(out_dir: &Path) -> Option<PathBuf> {
    out_dir.ancestors().nth(3).map(Path::to_path_buf)
}

/// 由 cargo 目标目录和构建配置名推导构建输出根目录
///
/// `dev`/`test` 配置输出到 `debug`，`bench` 输出到 `release`，自定义配置使用同名目录。
pub fn output_root_for_profile(target_dir: &Path, profile: &str) -> PathBuf {
    let profile_dir = match profile {
        "dev" | "test" => "debug",
        "bench" => "release",
        other => other,
    };
    target_dir.join(profile_dir)
}

/// 构建脚本运行结果
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub round: RoundOutcome,
    pub finish: FinishOutcome,
}

/// 构建脚本驱动
#[derive(Debug, Clone)]
pub struct BuildScript {
    manifest_dir: PathBuf,
    out_dir: PathBuf,
    overrides: HashMap<String, String>,
    emit_cargo_directives: bool,
}

impl BuildScript {
    /// 从 cargo 提供的环境变量创建
    pub fn from_env() -> ProcessorResult<Self> {
        let manifest_dir = required_env("CARGO_MANIFEST_DIR")?;
        let out_dir = required_env("OUT_DIR")?;
        Ok(Self::new(manifest_dir, out_dir))
    }

    /// 显式指定目录创建
    pub fn new<M: AsRef<Path>, O: AsRef<Path>>(manifest_dir: M, out_dir: O) -> Self {
        Self {
            manifest_dir: manifest_dir.as_ref().to_path_buf(),
            out_dir: out_dir.as_ref().to_path_buf(),
            overrides: HashMap::new(),
            emit_cargo_directives: true,
        }
    }

    /// 设置配置项，优先级高于配置文件和环境变量
    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.insert(key.into(), value.into());
        self
    }

    /// 作为收集模块运行，生成返回指定句柄类型的注册表
    pub fn collector(self, handle_type: impl Into<String>) -> Self {
        self.option("collector", "true")
            .option("handleType", handle_type)
    }

    /// 是否向 stdout 输出 `cargo:` 指令
    pub fn emit_cargo_directives(mut self, enabled: bool) -> Self {
        self.emit_cargo_directives = enabled;
        self
    }

    /// 加载最终配置
    pub fn load_options(&self) -> ProcessorResult<ProcessorOptions> {
        let mut options = OptionsLoader::new()
            .with_source(TomlOptionSource::new(self.manifest_dir.join(CONFIG_FILE_NAME)))
            .with_source(EnvironmentOptionSource::new())
            .with_source(MapOptionSource::new(self.overrides.clone()))
            .load()?;

        if options.output_root.is_none() {
            options.output_root = match output_root_from_out_dir(&self.out_dir) {
                Some(root) => Some(root),
                None => {
                    warn!(
                        "无法从 OUT_DIR 推导构建输出根目录: {}，改用 crate 下的 target",
                        self.out_dir.display()
                    );
                    Some(self.manifest_dir.join("target"))
                }
            };
        }
        Ok(options)
    }

    /// 执行一轮扫描并收尾
    pub fn run(self) -> ProcessorResult<BuildReport> {
        // 同一进程内重复初始化会失败，可以忽略
        let _ = init_logging(&LoggingConfig::build_script());

        let options = self.load_options()?;
        let context = SourceContext::from_manifest_dir(&self.manifest_dir)?;
        self.print_rerun_directives(&context, &options);

        debug!(
            "构建脚本: crate {}，收集模块 {}，共享存储 {}",
            context.crate_name(),
            options.collector,
            options.resolved_store_path().display()
        );

        let writer = ArtifactWriter::new(&self.out_dir, options.on_existing);
        let mut processor = RegistryProcessor::with_file_store(options);
        let round = processor.process(&context);
        let finish = processor.finish(&writer)?;

        Ok(BuildReport { round, finish })
    }

    fn print_rerun_directives(&self, context: &SourceContext, options: &ProcessorOptions) {
        if !self.emit_cargo_directives {
            return;
        }

        if let Some(source_dir) = context.source_dir() {
            println!("cargo:rerun-if-changed={}", source_dir.display());
        }
        println!(
            "cargo:rerun-if-changed={}",
            self.manifest_dir.join("Cargo.toml").display()
        );
        let config_file = self.manifest_dir.join(CONFIG_FILE_NAME);
        if config_file.is_file() {
            println!("cargo:rerun-if-changed={}", config_file.display());
        }
        if options.collector {
            println!(
                "cargo:rerun-if-changed={}",
                options.resolved_store_path().display()
            );
        }
        for (_, env_name) in OPTION_KEYS {
            println!("cargo:rerun-if-env-changed={}", env_name);
        }
    }
}

fn required_env(name: &str) -> ProcessorResult<PathBuf> {
    env::var_os(name)
        .map(PathBuf::from)
        .ok_or_else(|| ProcessorError::BootstrapFailed {
            message: format!("缺少环境变量 {}，只能在 cargo 构建脚本中使用", name),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ArtifactStatus;
    use std::fs;
    use tempfile::TempDir;

    fn write_crate(root: &Path, name: &str, body: &str) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(dir.join("src")).unwrap();
        fs::write(
            dir.join("Cargo.toml"),
            format!(
                "[package]\nname = \"{}\"\nversion = \"0.1.0\"\n\n[dependencies]\ndemo-di = \"*\"\nregistry-macros = \"*\"\n",
                name
            ),
        )
        .unwrap();
        fs::write(dir.join("src/lib.rs"), body).unwrap();
        dir
    }

    fn out_dir(target: &Path, name: &str) -> PathBuf {
        let dir = target.join("debug/build").join(format!("{}-0123", name)).join("out");
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_output_root_from_out_dir() {
        let root = output_root_from_out_dir(Path::new("/work/target/debug/build/app-1a2b/out"));

        assert_eq!(root, Some(PathBuf::from("/work/target/debug")));
    }

    #[test]
    fn test_output_root_for_profile() {
        let target = Path::new("target");

        assert_eq!(output_root_for_profile(target, "debug"), target.join("debug"));
        assert_eq!(output_root_for_profile(target, "dev"), target.join("debug"));
        assert_eq!(output_root_for_profile(target, "bench"), target.join("release"));
        assert_eq!(output_root_for_profile(target, "ci"), target.join("ci"));
        // 与构建脚本从 OUT_DIR 推导的位置一致
        assert_eq!(
            output_root_for_profile(target, "dev"),
            output_root_from_out_dir(Path::new("target/debug/build/app-1a2b/out")).unwrap()
        );
    }

    #[test]
    fn test_module_then_collector_build() {
        let workspace = TempDir::new().unwrap();
        let target = workspace.path().join("target");
        let module = write_crate(
            workspace.path(),
            "module-a",
            "#[registry_macros::module_factory]\npub fn module_a_koin() -> demo_di::Module { demo_di::Module::new(\"a\") }\n",
        );
        let app = write_crate(workspace.path(), "app", "pub fn main_entry() {}\n");

        let module_report = BuildScript::new(&module, out_dir(&target, "module-a"))
            .emit_cargo_directives(false)
            .run()
            .unwrap();
        let app_out = out_dir(&target, "app");
        let app_report = BuildScript::new(&app, &app_out)
            .collector("demo_di::Module")
            .emit_cargo_directives(false)
            .run()
            .unwrap();

        assert_eq!(module_report.finish, FinishOutcome::NotCollector);
        assert_eq!(module_report.round.discovered.len(), 1);
        assert!(target
            .join("debug/generated/registry/registry-modules.txt")
            .is_file());
        match app_report.finish {
            FinishOutcome::Emitted {
                artifact,
                module_count,
            } => {
                assert_eq!(module_count, 1);
                assert_eq!(artifact.status, ArtifactStatus::Written);
                assert_eq!(artifact.path, app_out.join("module_registry.rs"));
                let source = fs::read_to_string(artifact.path).unwrap();
                assert!(source.contains("\"module_a_koin\""));
            }
            other => panic!("期望生成注册表，实际 {:?}", other),
        }
    }
}
