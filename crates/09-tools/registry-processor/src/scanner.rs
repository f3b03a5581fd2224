//! 标记声明扫描
//!
//! 扫描器只关心"哪些声明带有标记、是否已经可以解析"。
//! 源码从哪里来由 [`CompilationContext`] 决定，扫描结果的持久化由控制器负责。

use registry_common::{Entry, ProcessorResult, PATH_SEPARATOR};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// 标记注解
///
/// 以完全限定路径配置，例如 `registry_macros::module_factory`。
/// 源码中写成完整路径或只写最后一段（配合 `use` 导入）都视为匹配。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerAnnotation {
    segments: Vec<String>,
}

impl MarkerAnnotation {
    /// 从完全限定路径创建标记
    pub fn new(path: &str) -> Self {
        let segments = path
            .trim()
            .trim_start_matches(PATH_SEPARATOR)
            .split(PATH_SEPARATOR)
            .map(|segment| segment.trim().to_string())
            .filter(|segment| !segment.is_empty())
            .collect();
        Self { segments }
    }

    /// 完全限定路径
    pub fn path(&self) -> String {
        self.segments.join(PATH_SEPARATOR)
    }

    /// 路径最后一段
    pub fn simple_name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// 判断属性路径是否指向该标记
    pub fn matches(&self, path: &syn::Path) -> bool {
        let written: Vec<String> = path
            .segments
            .iter()
            .map(|segment| segment.ident.to_string())
            .collect();

        match written.len() {
            0 => false,
            1 => written[0] == self.simple_name(),
            _ => written == self.segments,
        }
    }
}

impl fmt::Display for MarkerAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#[{}]", self.path())
    }
}

/// 带有标记的声明
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Declaration {
    /// 所在模块路径
    pub container_path: String,
    /// 函数名称
    pub symbol_name: String,
    /// 签名中尚未解析的名称
    pub unresolved: Vec<String>,
}

impl Declaration {
    /// 创建已解析的声明
    pub fn new(container_path: impl Into<String>, symbol_name: impl Into<String>) -> Self {
        Self {
            container_path: container_path.into(),
            symbol_name: symbol_name.into(),
            unresolved: Vec::new(),
        }
    }

    /// 附加未解析的名称
    pub fn with_unresolved<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unresolved.extend(names.into_iter().map(Into::into));
        self
    }

    /// 是否已经可以解析
    pub fn is_resolved(&self) -> bool {
        self.unresolved.is_empty()
    }

    /// 转换为注册项
    pub fn to_entry(&self) -> Entry {
        Entry::new(self.container_path.clone(), self.symbol_name.clone())
    }

    /// 完全限定名称
    pub fn qualified_name(&self) -> String {
        format!("{}{}{}", self.container_path, PATH_SEPARATOR, self.symbol_name)
    }
}

/// 编译上下文
///
/// 一个模块（crate）在一轮处理中可见的源码视图。
pub trait CompilationContext {
    /// 当前模块名称（crate 名）
    fn module_name(&self) -> &str;

    /// 返回带有指定标记的全部候选声明，包括尚未解析的
    fn declarations_annotated_with(
        &self,
        marker: &MarkerAnnotation,
    ) -> ProcessorResult<Vec<Declaration>>;
}

/// 一次扫描的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    /// 已解析的注册项，按源码顺序
    pub resolved: Vec<Entry>,
    /// 推迟到下一轮的声明
    pub deferred: Vec<Declaration>,
}

/// 标记声明扫描器
#[derive(Debug, Clone)]
pub struct Scanner {
    marker: MarkerAnnotation,
}

impl Scanner {
    /// 创建扫描器
    pub fn new(marker: MarkerAnnotation) -> Self {
        Self { marker }
    }

    /// 当前使用的标记
    pub fn marker(&self) -> &MarkerAnnotation {
        &self.marker
    }

    /// 扫描编译上下文，把候选声明分为已解析和推迟两组
    pub fn scan(&self, context: &dyn CompilationContext) -> ProcessorResult<ScanResult> {
        let declarations = context.declarations_annotated_with(&self.marker)?;
        let mut result = ScanResult::default();

        for declaration in declarations {
            if !declaration.is_resolved() {
                debug!(
                    "推迟声明 {}，未解析的名称: {:?}",
                    declaration.qualified_name(),
                    declaration.unresolved
                );
                result.deferred.push(declaration);
                continue;
            }

            let entry = declaration.to_entry();
            if !entry.is_well_formed() {
                warn!("声明无法表示为注册项，已跳过: {}", entry);
                continue;
            }
            result.resolved.push(entry);
        }

        debug!(
            "模块 {} 扫描 {}: 已解析 {} 个，推迟 {} 个",
            context.module_name(),
            self.marker,
            result.resolved.len(),
            result.deferred.len()
        );
        Ok(result)
    }
}
