#![allow(dead_code)]

use registry_macros::module_factory;

struct Module;

#[module_factory]
fn module_with_arguments(_name: &str) -> Module {
    Module
}

fn main() {}
