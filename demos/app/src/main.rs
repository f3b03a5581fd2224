//! # 注册表演示应用
//!
//! 构建脚本作为收集模块生成 `ModuleRegistry`，这里只负责引入并枚举。

// 间接调用策略不在编译期引用模块函数，需要显式链接各模块 crate
use module_a as _;
use module_b as _;
use module_c as _;

use demo_di::Module;
use registry_common::{init_logging, LoggingConfig};
use registry_macros::module_factory;
use tracing::info;

include!(concat!(env!("OUT_DIR"), "/module_registry.rs"));

#[module_factory]
fn app_module() -> Module {
    Module::new("app").single("Startup")
}

fn main() {
    let _ = init_logging(&LoggingConfig::default());

    let modules = ModuleRegistry::all_modules();
    info!(
        "共加载 {} 个模块（注册表记录 {} 个）",
        modules.len(),
        ModuleRegistry::module_count()
    );
    for module in &modules {
        println!("{}", module);
    }
}
