use demo_di::Module;
use registry_macros::module_factory;
use registry_runtime::global_factory_table;

#[module_factory]
pub fn r#match() -> Module {
    Module::new("match")
}

#[module_factory]
pub fn 模块() -> Module {
    Module::new("模块")
}

fn main() {
    let table = global_factory_table();

    let raw: Module = table.resolve(module_path!(), "r#match").unwrap();
    let unicode: Module = table.resolve(module_path!(), "模块").unwrap();

    assert_eq!(raw.name(), "match");
    assert_eq!(unicode.name(), "模块");
}
