//! 注册表代码生成
//!
//! 把聚合后的目录渲染为 Rust 源码。生成的文件通过
//! `include!(concat!(env!("OUT_DIR"), "/module_registry.rs"))` 引入收集模块。

use proc_macro2::{Literal, TokenStream};
use quote::quote;
use registry_common::{Catalog, EmitError, EmitResult, EmitStrategy, Entry, ProcessorOptions};
use tracing::debug;

/// 生成文件头
pub const GENERATED_HEADER: &str =
    "// @generated by registry-gen. 请勿手动修改，每次构建都会重新生成。\n";

/// 注册表代码生成器
#[derive(Debug, Clone)]
pub struct RegistryEmitter {
    strategy: EmitStrategy,
    handle_type: syn::Type,
    registry_name: syn::Ident,
    runtime_crate: syn::Path,
    emit_count: bool,
    own_crate: String,
}

impl RegistryEmitter {
    /// 从处理器配置创建生成器
    ///
    /// `own_crate` 是收集模块自身的 crate 名，直接引用策略会把它的路径改写为 `crate::`。
    pub fn from_options(options: &ProcessorOptions, own_crate: &str) -> EmitResult<Self> {
        let handle_type = options
            .handle_type
            .as_deref()
            .ok_or(EmitError::MissingHandleType)?;

        Ok(Self {
            strategy: options.strategy,
            handle_type: parse_fragment(handle_type)?,
            registry_name: parse_fragment(&options.registry_name)?,
            runtime_crate: parse_fragment(&options.runtime_crate)?,
            emit_count: options.emit_count,
            own_crate: own_crate.to_string(),
        })
    }

    /// 当前使用的生成策略
    pub fn strategy(&self) -> EmitStrategy {
        self.strategy
    }

    /// 渲染目录为源码文本
    ///
    /// 每个条目、属性和成员各占一行，便于排查构建产物。
    pub fn render(&self, catalog: &Catalog) -> EmitResult<String> {
        let declaration = self.render_declaration(catalog);
        let implementation = self.render_impl(catalog)?;
        debug!(
            "渲染注册表 {}，策略 {:?}，{} 个模块",
            self.registry_name,
            self.strategy,
            catalog.len()
        );
        Ok(format!(
            "{}\n{}\n\n{}\n",
            GENERATED_HEADER, declaration, implementation
        ))
    }

    fn render_declaration(&self, catalog: &Catalog) -> String {
        let registry_name = &self.registry_name;
        let summary = format!(" 共收集 {} 个模块。", catalog.len());
        let lines = [
            quote!(#[doc = " 跨模块收集的模块注册表。"]),
            quote!(#[doc = ""]),
            quote!(#[doc = #summary]),
            quote!(#[allow(dead_code)]),
            quote!(pub struct #registry_name;),
        ];
        join_lines(&lines, "")
    }

    fn render_impl(&self, catalog: &Catalog) -> EmitResult<String> {
        let handle_type = &self.handle_type;

        let entries: Vec<TokenStream> = catalog
            .iter()
            .map(|entry| {
                let container_path = &entry.container_path;
                let symbol_name = &entry.symbol_name;
                quote!((#container_path, #symbol_name))
            })
            .collect();
        let entries_text = if entries.is_empty() {
            "&[]".to_string()
        } else {
            format!("&[\n{}\n    ]", join_lines(&entries, "        ").replace('\n', ",\n"))
        };
        let entries_member = format!(
            "{}\n    pub const ENTRIES: &'static [(&'static str, &'static str)] = {};",
            quote!(#[doc = " 注册项 `(模块路径, 函数名)`，按目录顺序"]),
            entries_text
        );

        let body = match self.strategy {
            EmitStrategy::Direct => {
                let calls = catalog
                    .iter()
                    .map(|entry| self.direct_call(entry))
                    .collect::<EmitResult<Vec<_>>>()?;
                quote! {
                    ::std::vec![#(#calls),*]
                }
            }
            EmitStrategy::Indirect => {
                let runtime_crate = &self.runtime_crate;
                quote! {
                    #runtime_crate::global_factory_table().collect::<#handle_type>(Self::ENTRIES)
                }
            }
        };
        let mut members = vec![
            entries_member,
            format!(
                "{}\n    {} {{\n        {}\n    }}",
                quote!(#[doc = " 返回所有模块句柄，按目录顺序"]),
                quote!(pub fn all_modules() -> ::std::vec::Vec<#handle_type>),
                body
            ),
        ];

        if self.emit_count {
            let count = Literal::usize_unsuffixed(catalog.len());
            members.push(format!(
                "{}\n    {}",
                quote!(#[doc = " 收集到的模块数量"]),
                quote!(pub const fn module_count() -> usize { #count })
            ));
        }

        let registry_name = &self.registry_name;
        Ok(format!(
            "{}\n{} {{\n    {}\n}}",
            quote!(#[allow(dead_code)]),
            quote!(impl #registry_name),
            members.join("\n\n    ")
        ))
    }

    fn direct_call(&self, entry: &Entry) -> EmitResult<TokenStream> {
        let qualified_name = entry.qualified_name();
        let path_text = if entry.crate_name() == self.own_crate {
            format!("crate{}", &qualified_name[self.own_crate.len()..])
        } else {
            format!("::{}", qualified_name)
        };

        let path: syn::Path =
            syn::parse_str(&path_text).map_err(|e| EmitError::InvalidPath {
                qualified_name: qualified_name.clone(),
                message: e.to_string(),
            })?;
        Ok(quote!(#path()))
    }
}

fn join_lines(lines: &[TokenStream], indent: &str) -> String {
    lines
        .iter()
        .map(|line| format!("{}{}", indent, line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_fragment<T: syn::parse::Parse>(value: &str) -> EmitResult<T> {
    syn::parse_str(value).map_err(|e| EmitError::InvalidType {
        value: value.to_string(),
        message: e.to_string(),
    })
}
