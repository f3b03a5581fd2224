//! # Registry Runtime
//!
//! 生成的模块注册表在运行时依赖的工厂表。
//!
//! 被 `#[module_factory]` 标记的函数会在程序启动时（通过 `ctor`）把自己登记到
//! 全局 [`FactoryTable`]，键为 `(module_path!(), 函数名)`，与构建期扫描得到的注册项一致。
//! 间接调用策略生成的代码只保存名称，运行时再到这里按名称解析，
//! 所以收集模块不需要在编译期依赖每一个模块。
//!
//! ## 使用示例
//!
//! ```rust
//! use registry_runtime::{global_factory_table, register_factory};
//!
//! fn demo_factory() -> String {
//!     "demo".to_string()
//! }
//!
//! register_factory("demo_crate", "demo_factory", || Box::new(demo_factory()));
//!
//! let modules: Vec<String> = global_factory_table().collect(&[("demo_crate", "demo_factory")]);
//! assert_eq!(modules, vec!["demo".to_string()]);
//! ```

pub mod error;
pub mod table;

pub use error::*;
pub use table::*;

use once_cell::sync::Lazy;

/// 全局工厂表
static GLOBAL_FACTORY_TABLE: Lazy<FactoryTable> = Lazy::new(FactoryTable::new);

/// 获取全局工厂表
pub fn global_factory_table() -> &'static FactoryTable {
    &GLOBAL_FACTORY_TABLE
}

/// 向全局工厂表登记一个模块工厂
pub fn register_factory(container_path: &str, symbol_name: &str, factory: FactoryFn) {
    GLOBAL_FACTORY_TABLE.register(container_path, symbol_name, factory);
}

/// 宏展开时使用的内部导出，不属于公开 API
#[doc(hidden)]
pub mod __private {
    pub use ctor;
}
