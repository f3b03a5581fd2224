#![allow(dead_code)]

use registry_macros::module_factory;

struct Module;

#[module_factory]
fn generic_module<T: Default>() -> T {
    T::default()
}

fn main() {}
