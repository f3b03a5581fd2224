//! 订单模块

use demo_di::Module;
use registry_macros::module_factory;

#[module_factory]
pub fn module_a_koin() -> Module {
    Module::new("module_a")
        .single("OrderRepository")
        .single("OrderService")
}
