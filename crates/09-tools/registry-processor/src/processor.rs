//! 处理流程控制器
//!
//! 每个模块的构建驱动自己的 [`RegistryProcessor`] 实例：
//! 每轮调用一次 [`RegistryProcessor::process`]，最后调用一次 [`RegistryProcessor::finish`]。
//! 只有配置为收集模块的实例会在 `finish` 中重新读取共享存储、聚合并生成注册表。

use crate::aggregator::Aggregator;
use crate::artifact::{ArtifactOutcome, ArtifactWriter};
use crate::emitter::RegistryEmitter;
use crate::scanner::{CompilationContext, Declaration, MarkerAnnotation, Scanner};
use registry_common::{Catalog, Entry, ProcessorOptions, ProcessorResult};
use registry_store::{FileSharedStore, SharedStore};
use serde::Serialize;
use tracing::{debug, error, info, warn};

/// 控制器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProcessorState {
    /// 尚未完成任何一轮扫描
    Scanning,
    /// 至少完成一轮扫描，等待收尾
    AwaitingFinalize,
    /// 正在聚合和生成
    Finalizing,
    /// 已结束，后续调用不再产生任何效果
    Done,
}

/// 一轮处理的结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoundOutcome {
    /// 本轮新发现的注册项
    pub discovered: Vec<Entry>,
    /// 推迟到下一轮的声明
    pub deferred: Vec<Declaration>,
}

/// 收尾结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FinishOutcome {
    /// 非收集模块，不生成任何文件
    NotCollector,
    /// 已生成注册表
    Emitted {
        artifact: ArtifactOutcome,
        module_count: usize,
    },
    /// 之前已经结束过
    AlreadyFinished,
}

/// 注册表处理器
pub struct RegistryProcessor<S: SharedStore> {
    options: ProcessorOptions,
    store: S,
    scanner: Scanner,
    module_name: Option<String>,
    module_entries: Catalog,
    deferred: Vec<Declaration>,
    state: ProcessorState,
    rounds: usize,
}

impl RegistryProcessor<FileSharedStore> {
    /// 使用配置中的共享存储路径创建处理器
    pub fn with_file_store(options: ProcessorOptions) -> Self {
        let store = FileSharedStore::new(options.resolved_store_path());
        Self::new(options, store)
    }
}

impl<S: SharedStore> RegistryProcessor<S> {
    /// 创建处理器
    pub fn new(options: ProcessorOptions, store: S) -> Self {
        let scanner = Scanner::new(MarkerAnnotation::new(&options.annotation));
        Self {
            options,
            store,
            scanner,
            module_name: None,
            module_entries: Catalog::new(),
            deferred: Vec::new(),
            state: ProcessorState::Scanning,
            rounds: 0,
        }
    }

    /// 当前状态
    pub fn state(&self) -> ProcessorState {
        self.state
    }

    /// 处理器配置
    pub fn options(&self) -> &ProcessorOptions {
        &self.options
    }

    /// 共享存储
    pub fn store(&self) -> &S {
        &self.store
    }

    /// 本模块累计发现的注册项
    pub fn module_entries(&self) -> &Catalog {
        &self.module_entries
    }

    /// 仍在等待解析的声明
    pub fn deferred(&self) -> &[Declaration] {
        &self.deferred
    }

    /// 执行一轮扫描
    ///
    /// 新发现的注册项立即写入共享存储；扫描或存储失败只记录日志，不中断构建。
    pub fn process(&mut self, context: &dyn CompilationContext) -> RoundOutcome {
        if self.state == ProcessorState::Done {
            debug!("处理器已结束，忽略模块 {} 的新一轮扫描", context.module_name());
            return RoundOutcome::default();
        }

        self.rounds += 1;
        self.module_name = Some(context.module_name().to_string());

        let scan = match self.scanner.scan(context) {
            Ok(scan) => scan,
            Err(e) => {
                error!("模块 {} 第 {} 轮扫描失败: {}", context.module_name(), self.rounds, e);
                self.state = ProcessorState::AwaitingFinalize;
                return RoundOutcome::default();
            }
        };

        let discovered: Vec<Entry> = scan
            .resolved
            .into_iter()
            .filter(|entry| self.module_entries.insert(entry.clone()))
            .collect();

        if !discovered.is_empty() {
            match self.store.write_all(&discovered) {
                Ok(outcome) => debug!(
                    "写入共享存储 {}: 新增 {} 个，已存在 {} 个",
                    self.store.location(),
                    outcome.added,
                    outcome.already_present
                ),
                Err(e) => warn!(
                    "写入共享存储失败，本模块的注册项可能不会出现在最终注册表中: {}",
                    e
                ),
            }
        }

        self.deferred = scan.deferred.clone();
        self.state = ProcessorState::AwaitingFinalize;

        info!(
            "模块 {} 第 {} 轮: 发现 {} 个，推迟 {} 个",
            context.module_name(),
            self.rounds,
            discovered.len(),
            scan.deferred.len()
        );
        RoundOutcome {
            discovered,
            deferred: scan.deferred,
        }
    }

    /// 结束处理
    ///
    /// 收集模块重新读取共享存储，与本模块注册项聚合后生成一次注册表。
    /// 生成文件写入失败是唯一会返回错误的情况。
    pub fn finish(&mut self, writer: &ArtifactWriter) -> ProcessorResult<FinishOutcome> {
        if self.state == ProcessorState::Done {
            debug!("处理器已结束，忽略重复的收尾调用");
            return Ok(FinishOutcome::AlreadyFinished);
        }

        for declaration in &self.deferred {
            warn!(
                "声明直到最后一轮仍无法解析，未纳入注册表: {}，未解析的名称: {:?}",
                declaration.qualified_name(),
                declaration.unresolved
            );
        }

        if !self.options.collector {
            self.state = ProcessorState::Done;
            debug!("非收集模块，跳过注册表生成");
            return Ok(FinishOutcome::NotCollector);
        }

        self.state = ProcessorState::Finalizing;
        match self.emit(writer) {
            Ok(outcome) => {
                self.state = ProcessorState::Done;
                Ok(outcome)
            }
            Err(e) => {
                self.state = ProcessorState::AwaitingFinalize;
                Err(e)
            }
        }
    }

    fn emit(&self, writer: &ArtifactWriter) -> ProcessorResult<FinishOutcome> {
        let stored = match self.store.read() {
            Ok(entries) => entries,
            Err(e) => {
                warn!("读取共享存储失败，仅使用本模块的注册项: {}", e);
                Vec::new()
            }
        };

        let catalog =
            Aggregator::new(self.options.order).aggregate(stored, self.module_entries.iter());
        let own_crate = self.module_name.as_deref().unwrap_or_default();
        let emitter = RegistryEmitter::from_options(&self.options, own_crate)?;
        let source = emitter.render(&catalog)?;
        debug!(
            "写入注册表 {} 到目录 {}",
            self.options.output_file,
            writer.out_dir().display()
        );
        let artifact = writer.write(&self.options.output_file, &source)?;

        info!(
            "注册表 {} 已生成（{:?}）: {} 个模块 -> {}",
            self.options.registry_name,
            emitter.strategy(),
            catalog.len(),
            artifact.path.display()
        );
        Ok(FinishOutcome::Emitted {
            artifact,
            module_count: catalog.len(),
        })
    }
}
