//! 跨模块聚合的集成测试
//!
//! 每个模块使用独立的处理器实例，只通过磁盘上的共享存储交换数据。

use registry_common::{EmitStrategy, Entry, ExistingArtifactPolicy, ProcessorOptions};
use registry_processor::{
    ArtifactStatus, ArtifactWriter, FinishOutcome, ProcessorState, RegistryProcessor,
    SourceContext,
};
use registry_store::{FileSharedStore, SharedStore};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn module_source(symbol: &str) -> String {
    format!(
        "use demo_di::Module;\n#[registry_macros::module_factory]\npub fn {}() -> Module {{ Module::new(\"{}\") }}\n",
        symbol, symbol
    )
}

fn module_context(crate_name: &str, symbol: &str) -> SourceContext {
    SourceContext::from_source(crate_name, module_source(symbol))
        .with_dependencies(["demo-di", "registry-macros"])
}

fn module_options(output_root: &Path) -> ProcessorOptions {
    ProcessorOptions {
        output_root: Some(output_root.to_path_buf()),
        ..ProcessorOptions::default()
    }
}

fn collector_options(output_root: &Path) -> ProcessorOptions {
    ProcessorOptions {
        collector: true,
        handle_type: Some("demo_di::Module".to_string()),
        ..module_options(output_root)
    }
}

/// 以非收集模块身份完成一个模块的构建
fn build_module(output_root: &Path, crate_name: &str, symbol: &str) {
    let options = module_options(output_root);
    let writer = ArtifactWriter::new(output_root.join(crate_name), options.on_existing);
    let mut processor = RegistryProcessor::with_file_store(options);

    processor.process(&module_context(crate_name, symbol));
    assert_eq!(processor.finish(&writer).unwrap(), FinishOutcome::NotCollector);
}

/// 以收集模块身份完成构建，返回生成文件路径
fn build_collector(output_root: &Path, options: ProcessorOptions, source: &str) -> PathBuf {
    let writer = ArtifactWriter::new(output_root.join("app-out"), options.on_existing);
    let mut processor = RegistryProcessor::with_file_store(options);

    processor.process(&SourceContext::from_source("app", source));
    match processor.finish(&writer).unwrap() {
        FinishOutcome::Emitted { artifact, .. } => artifact.path,
        other => panic!("期望生成注册表，实际 {:?}", other),
    }
}

/// 生成文件中注册项出现的顺序
fn entry_positions(source: &str, symbols: &[&str]) -> Vec<usize> {
    symbols
        .iter()
        .map(|symbol| {
            source
                .find(&format!("\"{}\"", symbol))
                .unwrap_or_else(|| panic!("生成文件中缺少 {}", symbol))
        })
        .collect()
}

#[test]
fn test_union_is_complete_regardless_of_module_order() {
    for order in [["module_a", "module_b"], ["module_b", "module_a"]] {
        let root = TempDir::new().unwrap();
        for crate_name in order {
            build_module(root.path(), crate_name, &format!("{}_koin", crate_name));
        }

        let artifact = build_collector(root.path(), collector_options(root.path()), "");
        let source = fs::read_to_string(artifact).unwrap();

        assert!(source.contains("\"module_a_koin\""));
        assert!(source.contains("\"module_b_koin\""));
        let positions = entry_positions(&source, &[order[0], order[1]]);
        assert!(positions[0] < positions[1], "应按写入共享存储的顺序排列");
    }
}

#[test]
fn test_store_entries_then_current_module() {
    let root = TempDir::new().unwrap();
    let options = collector_options(root.path());
    let store_path = options.resolved_store_path();
    fs::create_dir_all(store_path.parent().unwrap()).unwrap();
    fs::write(&store_path, "moduleA:moduleAKoin\nmoduleB:moduleBKoin\n").unwrap();

    let source = "#[module_factory] pub fn moduleCKoin() -> demo_di::Module { todo!() }";
    let writer = ArtifactWriter::new(root.path().join("app-out"), options.on_existing);
    let mut processor = RegistryProcessor::with_file_store(options);
    let round = processor.process(
        &SourceContext::from_source("moduleC", source).with_dependencies(["demo_di"]),
    );
    let outcome = processor.finish(&writer).unwrap();

    assert_eq!(round.discovered, vec![Entry::new("moduleC", "moduleCKoin")]);
    let FinishOutcome::Emitted {
        artifact,
        module_count,
    } = outcome
    else {
        panic!("期望生成注册表");
    };
    assert_eq!(module_count, 3);
    let generated = fs::read_to_string(&artifact.path).unwrap();
    syn::parse_file(&generated).unwrap();
    let positions = entry_positions(&generated, &["moduleAKoin", "moduleBKoin", "moduleCKoin"]);
    assert!(positions[0] < positions[1] && positions[1] < positions[2]);

    // 当前模块的注册项也已写回共享存储
    let stored = FileSharedStore::new(&store_path).read().unwrap();
    assert_eq!(stored.len(), 3);
}

#[test]
fn test_malformed_store_line_is_skipped() {
    let root = TempDir::new().unwrap();
    let options = collector_options(root.path());
    let store_path = options.resolved_store_path();
    fs::create_dir_all(store_path.parent().unwrap()).unwrap();
    fs::write(&store_path, "module_a:module_a_koin\nmodule_b_without_delimiter\n\n").unwrap();

    let writer = ArtifactWriter::new(root.path().join("app-out"), options.on_existing);
    let mut processor = RegistryProcessor::with_file_store(options);
    processor.process(&SourceContext::from_source("app", ""));

    match processor.finish(&writer).unwrap() {
        FinishOutcome::Emitted { module_count, .. } => assert_eq!(module_count, 1),
        other => panic!("期望生成注册表，实际 {:?}", other),
    }
}

#[test]
fn test_keyword_store_line_does_not_break_direct_emission() {
    let root = TempDir::new().unwrap();
    let options = ProcessorOptions {
        strategy: EmitStrategy::Direct,
        ..collector_options(root.path())
    };
    let store_path = options.resolved_store_path();
    fs::create_dir_all(store_path.parent().unwrap()).unwrap();
    fs::write(
        &store_path,
        "module_a:fn\nmodule_a:module_a_koin\nmodule_b::r#type:r#match\n",
    )
    .unwrap();

    let artifact = build_collector(root.path(), options, "");
    let source = fs::read_to_string(artifact).unwrap();
    let compact: String = source.chars().filter(|c| !c.is_whitespace()).collect();

    assert!(compact.contains("::std::vec![::module_a::module_a_koin(),::module_b::r#type::r#match()]"));
    assert!(compact.contains("module_count()->usize{2}"));
}

#[test]
fn test_finalize_twice_and_rebuild_are_tolerated() {
    let root = TempDir::new().unwrap();
    build_module(root.path(), "module_a", "module_a_koin");
    let options = collector_options(root.path());
    let writer = ArtifactWriter::new(root.path().join("app-out"), options.on_existing);

    let mut processor = RegistryProcessor::with_file_store(options.clone());
    processor.process(&SourceContext::from_source("app", ""));
    assert!(matches!(
        processor.finish(&writer).unwrap(),
        FinishOutcome::Emitted { .. }
    ));
    assert_eq!(
        processor.finish(&writer).unwrap(),
        FinishOutcome::AlreadyFinished
    );
    assert_eq!(processor.state(), ProcessorState::Done);

    // 同一次构建中再次调用（新实例）时生成文件已存在
    let mut rebuilt = RegistryProcessor::with_file_store(options.clone());
    rebuilt.process(&SourceContext::from_source("app", ""));
    match rebuilt.finish(&writer).unwrap() {
        FinishOutcome::Emitted { artifact, .. } => {
            assert_eq!(artifact.status, ArtifactStatus::Unchanged)
        }
        other => panic!("期望生成注册表，实际 {:?}", other),
    }

    let skip_writer = ArtifactWriter::new(root.path().join("app-out"), ExistingArtifactPolicy::Skip);
    let mut skipped = RegistryProcessor::with_file_store(options);
    skipped.process(&SourceContext::from_source("app", ""));
    match skipped.finish(&skip_writer).unwrap() {
        FinishOutcome::Emitted { artifact, .. } => {
            assert_eq!(artifact.status, ArtifactStatus::Skipped)
        }
        other => panic!("期望生成注册表，实际 {:?}", other),
    }
}

#[test]
fn test_empty_build_emits_empty_registry() {
    let root = TempDir::new().unwrap();
    let options = ProcessorOptions {
        strategy: EmitStrategy::Direct,
        ..collector_options(root.path())
    };

    let artifact = build_collector(root.path(), options, "pub fn main_entry() {}");
    let source = fs::read_to_string(artifact).unwrap();
    let compact: String = source.chars().filter(|c| !c.is_whitespace()).collect();

    assert!(compact.contains("=&[];"));
    assert!(compact.contains("module_count()->usize{0}"));
    assert!(!root.path().join("generated/registry/registry-modules.txt").exists());
}

#[test]
fn test_unwritable_store_does_not_fail_module_build() {
    let root = TempDir::new().unwrap();
    let blocker = root.path().join("blocker");
    fs::write(&blocker, "a file where a directory is expected").unwrap();
    let options = ProcessorOptions {
        store_path: Some(blocker.join("registry-modules.txt")),
        ..module_options(root.path())
    };
    let writer = ArtifactWriter::new(root.path().join("out"), options.on_existing);
    let mut processor = RegistryProcessor::with_file_store(options);

    let round = processor.process(&module_context("module_a", "module_a_koin"));

    assert_eq!(round.discovered.len(), 1);
    assert_eq!(processor.finish(&writer).unwrap(), FinishOutcome::NotCollector);
}
