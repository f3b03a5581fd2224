//! 为 `tests/scenario.rs` 生成三个注册表：
//! 间接调用（三个模块）、间接调用（其中一个名称不存在）、直接引用。

use anyhow::Result;
use registry_common::{EmitStrategy, Entry, ExistingArtifactPolicy, ProcessorOptions};
use registry_processor::{ArtifactWriter, RegistryProcessor, SourceContext};
use registry_store::InMemorySharedStore;
use std::env;
use std::path::PathBuf;

/// 集成测试目标 `tests/scenario.rs` 的 crate 名
const SCENARIO_CRATE: &str = "scenario";

const MODULE_C_SOURCE: &str = r#"
    pub mod module_c {
        #[registry_macros::module_factory]
        pub fn module_c_koin() -> demo_di::Module {
            demo_di::Module::new("module_c")
        }
    }
"#;

fn main() -> Result<()> {
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let scenario_file = manifest_dir.join("tests/scenario.rs");
    println!("cargo:rerun-if-changed={}", scenario_file.display());
    println!("cargo:rerun-if-changed=build.rs");

    let writer = ArtifactWriter::new(&out_dir, ExistingArtifactPolicy::Overwrite);
    let module_c = SourceContext::from_source(SCENARIO_CRATE, MODULE_C_SOURCE)
        .with_dependencies(["demo_di", "registry_macros"]);

    // 共享存储中已有 module_a、module_b，本轮扫描发现 module_c
    emit(
        &writer,
        options("ScenarioRegistry", "scenario_registry.rs", EmitStrategy::Indirect),
        vec![entry("module_a", "module_a_koin"), entry("module_b", "module_b_koin")],
        &module_c,
    )?;

    // module_b 的名称在运行时没有登记
    emit(
        &writer,
        options("PartialRegistry", "partial_registry.rs", EmitStrategy::Indirect),
        vec![entry("module_a", "module_a_koin"), entry("module_b", "missing_koin")],
        &module_c,
    )?;

    // 直接引用：扫描测试源文件本身
    let scenario = SourceContext::from_file(SCENARIO_CRATE, &scenario_file)
        .with_dependencies(["demo_di", "registry_macros", "registry_runtime"]);
    emit(
        &writer,
        options("DirectRegistry", "direct_registry.rs", EmitStrategy::Direct),
        Vec::new(),
        &scenario,
    )?;

    Ok(())
}

fn entry(module: &str, symbol: &str) -> Entry {
    Entry::new(format!("{}::{}", SCENARIO_CRATE, module), symbol)
}

fn options(registry_name: &str, output_file: &str, strategy: EmitStrategy) -> ProcessorOptions {
    ProcessorOptions {
        collector: true,
        handle_type: Some("demo_di::Module".to_string()),
        registry_name: registry_name.to_string(),
        output_file: output_file.to_string(),
        strategy,
        ..ProcessorOptions::default()
    }
}

fn emit(
    writer: &ArtifactWriter,
    options: ProcessorOptions,
    stored: Vec<Entry>,
    context: &SourceContext,
) -> Result<()> {
    let mut processor = RegistryProcessor::new(options, InMemorySharedStore::with_entries(stored));
    processor.process(context);
    processor.finish(writer)?;
    Ok(())
}
