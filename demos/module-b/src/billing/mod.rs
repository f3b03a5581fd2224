use registry_macros::module_factory;

/// 模块注册在 `module_b::billing` 下
#[module_factory]
pub fn module_b_koin() -> demo_di::Module {
    demo_di::Module::new("module_b").single("InvoiceService")
}
