//! 模块工厂表

use crate::error::{ResolveError, ResolveResult};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, info, warn};

/// 模块工厂函数类型：无参数，返回类型擦除后的句柄
pub type FactoryFn = fn() -> Box<dyn Any + Send>;

/// 模块工厂表
///
/// 以 `(container_path, symbol_name)` 为键保存工厂函数，保持登记顺序。
#[derive(Default)]
pub struct FactoryTable {
    factories: RwLock<IndexMap<(String, String), FactoryFn>>,
}

impl FactoryTable {
    /// 创建空的工厂表
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记模块工厂
    ///
    /// 同一个键重复登记时保留第一次的工厂并返回 `false`。
    pub fn register(&self, container_path: &str, symbol_name: &str, factory: FactoryFn) -> bool {
        let key = (container_path.to_string(), symbol_name.to_string());
        let mut factories = self.factories.write();
        if factories.contains_key(&key) {
            warn!(
                "模块工厂重复登记，保留首次登记: {}::{}",
                container_path, symbol_name
            );
            return false;
        }
        factories.insert(key, factory);
        debug!("登记模块工厂: {}::{}", container_path, symbol_name);
        true
    }

    /// 是否已登记
    pub fn contains(&self, container_path: &str, symbol_name: &str) -> bool {
        self.factories
            .read()
            .contains_key(&(container_path.to_string(), symbol_name.to_string()))
    }

    /// 已登记的工厂数量
    pub fn len(&self) -> usize {
        self.factories.read().len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.factories.read().is_empty()
    }

    /// 所有已登记的键，按登记顺序
    pub fn registrations(&self) -> Vec<(String, String)> {
        self.factories.read().keys().cloned().collect()
    }

    /// 按名称解析并调用模块工厂，期望返回 `T`
    pub fn resolve<T: Any>(&self, container_path: &str, symbol_name: &str) -> ResolveResult<T> {
        let qualified_name = format!("{}::{}", container_path, symbol_name);

        // 调用工厂前释放读锁，工厂内部可能再次访问工厂表
        let factory = self
            .factories
            .read()
            .get(&(container_path.to_string(), symbol_name.to_string()))
            .copied()
            .ok_or_else(|| ResolveError::NotRegistered {
                qualified_name: qualified_name.clone(),
            })?;

        let handle = panic::catch_unwind(AssertUnwindSafe(factory)).map_err(|payload| {
            ResolveError::InvocationPanicked {
                qualified_name: qualified_name.clone(),
                message: panic_message(payload.as_ref()),
            }
        })?;

        handle
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| ResolveError::TypeMismatch {
                qualified_name,
                expected: std::any::type_name::<T>(),
            })
    }

    /// 依次解析所有注册项，返回成功的句柄和失败的原因
    pub fn try_collect<T: Any>(&self, entries: &[(&str, &str)]) -> (Vec<T>, Vec<ResolveError>) {
        let mut handles = Vec::with_capacity(entries.len());
        let mut failures = Vec::new();
        for (container_path, symbol_name) in entries {
            match self.resolve::<T>(container_path, symbol_name) {
                Ok(handle) => handles.push(handle),
                Err(e) => failures.push(e),
            }
        }
        (handles, failures)
    }

    /// 依次解析所有注册项，失败的注册项记录警告后跳过
    pub fn collect<T: Any>(&self, entries: &[(&str, &str)]) -> Vec<T> {
        let (handles, failures) = self.try_collect::<T>(entries);
        for failure in &failures {
            warn!("跳过无法解析的模块: {}", failure);
        }
        info!(
            "模块解析完成: 成功 {} 个，跳过 {} 个",
            handles.len(),
            failures.len()
        );
        handles
    }
}

impl std::fmt::Debug for FactoryTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactoryTable")
            .field("registrations", &self.registrations())
            .field("factories", &"<functions>")
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "未知 panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Module(&'static str);

    fn module_a() -> Box<dyn Any + Send> {
        Box::new(Module("module_a"))
    }

    fn module_b() -> Box<dyn Any + Send> {
        Box::new(Module("module_b"))
    }

    fn wrong_type() -> Box<dyn Any + Send> {
        Box::new(42_u32)
    }

    fn exploding() -> Box<dyn Any + Send> {
        panic!("模块初始化失败")
    }

    #[test]
    fn test_resolve_registered_factory() {
        let table = FactoryTable::new();
        table.register("module_a", "module_a_koin", module_a);

        let module: Module = table.resolve("module_a", "module_a_koin").unwrap();

        assert_eq!(module, Module("module_a"));
    }

    #[test]
    fn test_resolve_failures_are_typed() {
        let table = FactoryTable::new();
        table.register("module_x", "wrong", wrong_type);
        table.register("module_x", "exploding", exploding);

        assert!(matches!(
            table.resolve::<Module>("module_x", "missing"),
            Err(ResolveError::NotRegistered { .. })
        ));
        assert!(matches!(
            table.resolve::<Module>("module_x", "wrong"),
            Err(ResolveError::TypeMismatch { .. })
        ));
        match table.resolve::<Module>("module_x", "exploding") {
            Err(ResolveError::InvocationPanicked { message, .. }) => {
                assert_eq!(message, "模块初始化失败")
            }
            other => panic!("期望 InvocationPanicked，实际 {:?}", other),
        }
    }

    #[test]
    fn test_collect_skips_failures_and_keeps_order() {
        let table = FactoryTable::new();
        table.register("module_a", "module_a_koin", module_a);
        table.register("module_b", "module_b_koin", module_b);
        table.register("module_x", "exploding", exploding);

        let (modules, failures) = table.try_collect::<Module>(&[
            ("module_b", "module_b_koin"),
            ("module_x", "exploding"),
            ("module_c", "module_c_koin"),
            ("module_a", "module_a_koin"),
        ]);

        assert_eq!(modules, vec![Module("module_b"), Module("module_a")]);
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[1].qualified_name(), "module_c::module_c_koin");
    }

    #[test]
    fn test_duplicate_registration_keeps_first() {
        let table = FactoryTable::new();
        assert!(table.register("module_a", "module_a_koin", module_a));
        assert!(!table.register("module_a", "module_a_koin", module_b));

        let module: Module = table.resolve("module_a", "module_a_koin").unwrap();
        assert_eq!(module, Module("module_a"));
        assert_eq!(table.len(), 1);
    }
}
