//! `#[module_factory]` 与运行时工厂表

use demo_di::Module;
use registry_macros::module_factory;
use registry_runtime::{global_factory_table, ResolveError};

#[module_factory]
fn orders_module() -> Module {
    Module::new("orders").single("OrderService")
}

#[module_factory]
fn label_module() -> String {
    "not a module".to_string()
}

#[module_factory]
fn broken_module() -> Module {
    panic!("模块初始化失败")
}

#[module_factory(runtime = "::registry_runtime")]
pub fn explicit_runtime_module() -> Module {
    Module::new("explicit")
}

#[test]
fn test_macro_registers_under_module_path() {
    let table = global_factory_table();

    assert!(table.contains(module_path!(), "orders_module"));
    assert!(table.contains(module_path!(), "explicit_runtime_module"));

    let module: Module = table.resolve(module_path!(), "orders_module").unwrap();
    assert_eq!(module.definitions(), &["OrderService".to_string()]);
}

#[test]
fn test_each_failure_is_isolated() {
    let (modules, failures) = global_factory_table().try_collect::<Module>(&[
        (module_path!(), "orders_module"),
        (module_path!(), "label_module"),
        (module_path!(), "broken_module"),
        (module_path!(), "absent_module"),
        (module_path!(), "explicit_runtime_module"),
    ]);

    assert_eq!(
        modules.iter().map(Module::name).collect::<Vec<_>>(),
        vec!["orders", "explicit"]
    );
    assert!(matches!(failures[0], ResolveError::TypeMismatch { .. }));
    assert!(matches!(failures[1], ResolveError::InvocationPanicked { .. }));
    assert!(matches!(failures[2], ResolveError::NotRegistered { .. }));
}

#[test]
fn test_same_function_resolves_as_its_own_type() {
    let label: String = global_factory_table()
        .resolve(module_path!(), "label_module")
        .unwrap();

    assert_eq!(label, "not a module");
}
