//! trybuild compile-time tests for registry_macros

#[test]
fn trybuild_module_factory() {
    let t = trybuild::TestCases::new();
    t.pass("tests/trybuild/module_factory_ok.rs");
    t.pass("tests/trybuild/module_factory_raw_ident.rs");
    t.compile_fail("tests/trybuild/fail_with_arguments.rs");
    t.compile_fail("tests/trybuild/fail_generic.rs");
    t.compile_fail("tests/trybuild/fail_async.rs");
}
