//! 模块工厂宏实现

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    parse::Parse, parse::ParseStream, parse_quote, punctuated::Punctuated, Expr, Ident, ItemFn,
    Lit, Meta, Path, Result, ReturnType, Token,
};

/// 模块工厂宏参数
#[derive(Debug, Clone)]
pub struct FactoryArgs {
    /// 运行时工厂表所在 crate 的路径
    pub runtime: Path,
}

impl Default for FactoryArgs {
    fn default() -> Self {
        Self {
            runtime: parse_quote!(::registry_runtime),
        }
    }
}

impl Parse for FactoryArgs {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut args = FactoryArgs::default();

        let parsed = Punctuated::<Meta, Token![,]>::parse_terminated(input)?;

        for meta in parsed {
            match meta {
                Meta::NameValue(nv) if nv.path.is_ident("runtime") => match nv.value {
                    Expr::Lit(expr_lit) => match expr_lit.lit {
                        Lit::Str(lit_str) => args.runtime = lit_str.parse()?,
                        other => {
                            return Err(syn::Error::new_spanned(
                                other,
                                "runtime 参数必须是字符串形式的路径",
                            ))
                        }
                    },
                    other => {
                        return Err(syn::Error::new_spanned(
                            other,
                            "runtime 参数必须是字符串形式的路径",
                        ))
                    }
                },
                other => {
                    return Err(syn::Error::new_spanned(
                        other,
                        "#[module_factory] 只支持 runtime = \"...\" 参数",
                    ))
                }
            }
        }

        Ok(args)
    }
}

/// 实现 #[module_factory] 宏
///
/// 校验失败时仍然输出原函数，只附加编译错误，避免引出连带错误。
pub fn module_factory_impl(args: FactoryArgs, item_fn: ItemFn) -> TokenStream {
    if let Err(e) = validate_signature(&item_fn) {
        let error = e.to_compile_error();
        return quote! {
            #error
            #item_fn
        };
    }

    let registration_code = generate_registration_code(&args.runtime, &item_fn.sig.ident);

    quote! {
        #item_fn

        #registration_code
    }
}

/// 校验模块工厂函数签名
fn validate_signature(item_fn: &ItemFn) -> Result<()> {
    let sig = &item_fn.sig;

    if sig.asyncness.is_some() {
        return Err(syn::Error::new_spanned(
            &sig.asyncness,
            "#[module_factory] 函数不能是 async",
        ));
    }

    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "#[module_factory] 函数不能带泛型参数",
        ));
    }

    if !sig.inputs.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.inputs,
            "#[module_factory] 函数不能带参数",
        ));
    }

    if let ReturnType::Default = sig.output {
        return Err(syn::Error::new_spanned(
            &sig.ident,
            "#[module_factory] 函数必须声明返回的模块类型",
        ));
    }

    Ok(())
}

/// 生成运行时登记代码
///
/// 登记名保留原始标识符前缀（`r#match`），与扫描器写入共享存储的符号名一致。
fn generate_registration_code(runtime: &Path, fn_name: &Ident) -> TokenStream {
    let fn_name_string = fn_name.to_string();
    let registration_fn_name = format_ident!("__register_module_factory_{}", fn_name);

    quote! {
        const _: () = {
            // 程序启动时把工厂登记到运行时工厂表
            #[#runtime::__private::ctor::ctor]
            fn #registration_fn_name() {
                #runtime::register_factory(
                    ::core::module_path!(),
                    #fn_name_string,
                    || ::std::boxed::Box::new(#fn_name())
                        as ::std::boxed::Box<dyn ::std::any::Any + ::std::marker::Send>,
                );
            }
        };
    }
}
