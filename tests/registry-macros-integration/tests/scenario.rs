//! 三模块场景：构建期生成的注册表在运行时的表现

include!(concat!(env!("OUT_DIR"), "/scenario_registry.rs"));
include!(concat!(env!("OUT_DIR"), "/partial_registry.rs"));
include!(concat!(env!("OUT_DIR"), "/direct_registry.rs"));

mod module_a {
    use demo_di::Module;
    use registry_macros::module_factory;

    #[module_factory]
    pub fn module_a_koin() -> Module {
        Module::new("module_a")
    }
}

mod module_b {
    use demo_di::Module;
    use registry_macros::module_factory;

    #[module_factory]
    pub fn module_b_koin() -> Module {
        Module::new("module_b")
    }
}

mod module_c {
    #[registry_macros::module_factory]
    pub fn module_c_koin() -> demo_di::Module {
        demo_di::Module::new("module_c")
    }
}

fn names(modules: &[demo_di::Module]) -> Vec<&str> {
    modules.iter().map(|module| module.name()).collect()
}

#[test]
fn test_indirect_registry_returns_three_handles() {
    let modules = ScenarioRegistry::all_modules();

    assert_eq!(
        ScenarioRegistry::ENTRIES,
        &[
            ("scenario::module_a", "module_a_koin"),
            ("scenario::module_b", "module_b_koin"),
            ("scenario::module_c", "module_c_koin"),
        ]
    );
    assert_eq!(names(&modules), vec!["module_a", "module_b", "module_c"]);
    assert_eq!(ScenarioRegistry::module_count(), 3);
}

#[test]
fn test_unregistered_name_is_skipped() {
    let modules = PartialRegistry::all_modules();

    assert_eq!(PartialRegistry::module_count(), 3);
    assert_eq!(names(&modules), vec!["module_a", "module_c"]);
}

#[test]
fn test_direct_registry_calls_each_function() {
    let modules = DirectRegistry::all_modules();

    assert_eq!(names(&modules), vec!["module_a", "module_b", "module_c"]);
    assert_eq!(DirectRegistry::module_count(), 3);
}
