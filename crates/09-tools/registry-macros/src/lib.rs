//! # Registry Macros
//!
//! 这个 crate 提供标记模块工厂函数的过程宏。
//!
//! ## 核心宏
//!
//! - [`module_factory`] - 标记一个模块工厂函数
//!
//! 构建期扫描器按名称发现被标记的函数并写入共享存储；
//! 宏展开的注册代码则在运行时把同一个函数登记到 `registry_runtime` 的工厂表，
//! 两边的键都是 `(module_path!(), 函数名)`。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use registry_macros::module_factory;
//!
//! #[module_factory]
//! pub fn orders_module() -> demo_di::Module {
//!     demo_di::Module::new("orders")
//! }
//! ```

use proc_macro::TokenStream;
use syn::{parse_macro_input, ItemFn};

mod factory;

/// 模块工厂标记宏
///
/// 被标记的函数必须是无参数、非泛型、非 async 的自由函数，并且声明返回类型；
/// 返回类型需满足 `Send + 'static`。
///
/// # 参数
///
/// - `runtime = "::path::to::runtime"` - 运行时工厂表所在 crate（默认 `::registry_runtime`）
///
/// # 示例
///
/// ```rust,ignore
/// #[module_factory]
/// pub fn billing_module() -> Module {
///     Module::new("billing")
/// }
/// ```
#[proc_macro_attribute]
pub fn module_factory(args: TokenStream, input: TokenStream) -> TokenStream {
    let factory_args = if args.is_empty() {
        factory::FactoryArgs::default()
    } else {
        match syn::parse::<factory::FactoryArgs>(args) {
            Ok(args) => args,
            Err(e) => return e.to_compile_error().into(),
        }
    };

    let item_fn = parse_macro_input!(input as ItemFn);
    factory::module_factory_impl(factory_args, item_fn).into()
}
