use demo_di::Module;
use registry_macros::module_factory;
use registry_runtime::global_factory_table;

#[module_factory]
pub fn ok_module() -> Module {
    Module::new("ok")
}

fn main() {
    let module: Module = global_factory_table()
        .resolve(module_path!(), "ok_module")
        .unwrap();
    assert_eq!(module.name(), "ok");
}
