//! 通知模块

use demo_di::Module;

#[registry_macros::module_factory]
pub fn module_c_koin() -> Module {
    Module::new("module_c").single("NotificationSender")
}

/// 未标记的函数不会进入注册表
pub fn unregistered_module() -> Module {
    Module::new("unregistered")
}
