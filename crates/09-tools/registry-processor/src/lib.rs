//! # Registry Processor
//!
//! 构建期跨模块注册表生成器。
//!
//! 每个模块 crate 在构建时扫描带有 `#[module_factory]` 标记的函数，把发现的注册项
//! 写入同一次构建共享的存储文件；被配置为收集模块的 crate 在收尾时重新读取存储，
//! 聚合去重后生成一个注册表源文件。
//!
//! ## 组成
//!
//! - [`scanner`] - 标记声明扫描与 [`CompilationContext`] 抽象
//! - [`source_context`] - 基于 `syn` 的源码上下文
//! - [`aggregator`] - 共享存储与本轮结果的聚合
//! - [`emitter`] - 注册表源码渲染
//! - [`artifact`] - 生成文件写入
//! - [`processor`] - 多轮处理的状态机
//! - [`build`] - 构建脚本接入
//!
//! ## 使用示例
//!
//! ```rust
//! use registry_common::{Entry, ExistingArtifactPolicy, ProcessorOptions};
//! use registry_processor::{ArtifactWriter, FinishOutcome, RegistryProcessor, SourceContext};
//! use registry_store::InMemorySharedStore;
//!
//! let store = InMemorySharedStore::with_entries([Entry::new("module_a", "module_a_koin")]);
//! let options = ProcessorOptions {
//!     collector: true,
//!     handle_type: Some("demo_di::Module".to_string()),
//!     ..ProcessorOptions::default()
//! };
//! let mut processor = RegistryProcessor::new(options, store);
//!
//! let context = SourceContext::from_source(
//!     "app",
//!     "#[module_factory] pub fn app_module() -> String { String::new() }",
//! );
//! processor.process(&context);
//!
//! let out_dir = tempfile::tempdir().unwrap();
//! let writer = ArtifactWriter::new(out_dir.path(), ExistingArtifactPolicy::Overwrite);
//! let outcome = processor.finish(&writer).unwrap();
//! assert!(matches!(outcome, FinishOutcome::Emitted { module_count: 2, .. }));
//! ```

pub mod aggregator;
pub mod artifact;
pub mod build;
pub mod emitter;
pub mod processor;
pub mod scanner;
pub mod source_context;

pub use aggregator::Aggregator;
pub use artifact::{ArtifactOutcome, ArtifactStatus, ArtifactWriter};
pub use build::{BuildReport, BuildScript};
pub use emitter::{RegistryEmitter, GENERATED_HEADER};
pub use processor::{FinishOutcome, ProcessorState, RegistryProcessor, RoundOutcome};
pub use scanner::{CompilationContext, Declaration, MarkerAnnotation, ScanResult, Scanner};
pub use source_context::SourceContext;
