//! 并发调度的模块构建共享同一个存储文件

use registry_common::{ExistingArtifactPolicy, ProcessorOptions};
use registry_processor::{ArtifactWriter, FinishOutcome, RegistryProcessor, SourceContext};
use registry_store::{FileSharedStore, SharedStore};
use std::path::PathBuf;
use tempfile::TempDir;

const MODULE_COUNT: usize = 8;

fn build_module(output_root: PathBuf, index: usize) -> anyhow::Result<()> {
    let crate_name = format!("module_{}", index);
    let source = format!(
        "#[module_factory] pub fn module_{}_koin() -> demo_di::Module {{ todo!() }}\n\
         #[module_factory] pub fn shared_koin() -> demo_di::Module {{ todo!() }}\n",
        index
    );
    let options = ProcessorOptions {
        output_root: Some(output_root.clone()),
        ..ProcessorOptions::default()
    };
    let writer = ArtifactWriter::new(output_root.join(&crate_name), options.on_existing);
    let mut processor = RegistryProcessor::with_file_store(options);

    processor.process(&SourceContext::from_source(crate_name, source).with_dependencies(["demo_di"]));
    processor.finish(&writer)?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_module_builds_lose_no_entries() {
    let root = TempDir::new().unwrap();

    let handles: Vec<_> = (0..MODULE_COUNT)
        .map(|index| {
            let output_root = root.path().to_path_buf();
            tokio::task::spawn_blocking(move || build_module(output_root, index))
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let options = ProcessorOptions {
        collector: true,
        handle_type: Some("demo_di::Module".to_string()),
        output_root: Some(root.path().to_path_buf()),
        ..ProcessorOptions::default()
    };
    let stored = FileSharedStore::new(options.resolved_store_path())
        .read()
        .unwrap();
    assert_eq!(stored.len(), MODULE_COUNT * 2);

    let writer = ArtifactWriter::new(root.path().join("app-out"), ExistingArtifactPolicy::Overwrite);
    let mut collector = RegistryProcessor::with_file_store(options);
    collector.process(&SourceContext::from_source("app", ""));
    match collector.finish(&writer).unwrap() {
        FinishOutcome::Emitted { module_count, .. } => assert_eq!(module_count, MODULE_COUNT * 2),
        other => panic!("期望生成注册表，实际 {:?}", other),
    }
}
