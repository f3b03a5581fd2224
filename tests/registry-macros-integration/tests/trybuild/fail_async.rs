#![allow(dead_code)]

use registry_macros::module_factory;

struct Module;

#[module_factory]
async fn async_module() -> Module {
    Module
}

fn main() {}
