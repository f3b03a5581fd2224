//! 基于 `syn` 的源码编译上下文
//!
//! 从 crate 根文件（`src/lib.rs` 或 `src/main.rs`）出发，沿 `mod x;` 声明和内联模块
//! 建立模块树，找出带有标记的自由函数，并判断其签名是否已经可以解析。

use crate::scanner::{CompilationContext, Declaration, MarkerAnnotation};
use registry_common::{crate_name_from_package, ProcessorError, ProcessorResult, PATH_SEPARATOR};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use syn::ext::IdentExt;
use syn::visit::{self, Visit};
use syn::punctuated::Punctuated;
use syn::{Attribute, Item, ItemFn, Meta, ReturnType, Token, UseTree};
use tracing::{debug, warn};

/// 无需导入即可使用的名称：基本类型和标准 prelude
const PRELUDE_NAMES: &[&str] = &[
    "bool", "char", "str", "u8", "u16", "u32", "u64", "u128", "usize", "i8", "i16", "i32", "i64",
    "i128", "isize", "f32", "f64", "Option", "Some", "None", "Result", "Ok", "Err", "Vec",
    "String", "Box", "ToString", "ToOwned", "Clone", "Copy", "Send", "Sync", "Sized", "Unpin",
    "Fn", "FnMut", "FnOnce", "Drop", "Iterator", "IntoIterator", "DoubleEndedIterator",
    "ExactSizeIterator", "Extend", "FromIterator", "Default", "Eq", "PartialEq", "Ord",
    "PartialOrd", "AsRef", "AsMut", "Into", "From", "TryFrom", "TryInto",
];

/// 始终可用的路径起点
const PATH_ROOTS: &[&str] = &["crate", "self", "super", "Self", "std", "core", "alloc"];

/// 源码来源
#[derive(Debug, Clone)]
enum SourceRoot {
    /// crate 根文件
    File(PathBuf),
    /// 内存中的单文件源码，外部模块文件不可加载
    Inline(String),
}

/// 基于源码的编译上下文
#[derive(Debug, Clone)]
pub struct SourceContext {
    crate_name: String,
    root: SourceRoot,
    dependencies: HashSet<String>,
    generated_names: HashSet<String>,
}

impl SourceContext {
    /// 以 crate 根文件创建上下文
    pub fn from_file<P: AsRef<Path>>(crate_name: impl Into<String>, root_file: P) -> Self {
        Self {
            crate_name: crate_name.into(),
            root: SourceRoot::File(root_file.as_ref().to_path_buf()),
            dependencies: HashSet::new(),
            generated_names: HashSet::new(),
        }
    }

    /// 以内存中的源码创建上下文
    pub fn from_source(crate_name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            crate_name: crate_name.into(),
            root: SourceRoot::Inline(source.into()),
            dependencies: HashSet::new(),
            generated_names: HashSet::new(),
        }
    }

    /// 读取 `Cargo.toml` 创建上下文
    ///
    /// crate 名取 `[lib] name` 或包名，依赖 crate 名来自 `[dependencies]`
    /// 以及 `[target.*.dependencies]`。
    pub fn from_manifest_dir<P: AsRef<Path>>(manifest_dir: P) -> ProcessorResult<Self> {
        let manifest_dir = manifest_dir.as_ref();
        let manifest_path = manifest_dir.join("Cargo.toml");
        let content = fs::read_to_string(&manifest_path).map_err(|e| {
            ProcessorError::scan_failed(format!(
                "无法读取清单文件 {}: {}",
                manifest_path.display(),
                e
            ))
        })?;
        let manifest: Manifest = toml::from_str(&content).map_err(|e| {
            ProcessorError::scan_failed(format!(
                "无法解析清单文件 {}: {}",
                manifest_path.display(),
                e
            ))
        })?;

        let crate_name = manifest.crate_name().ok_or_else(|| {
            ProcessorError::scan_failed(format!(
                "清单文件缺少 [package] name: {}",
                manifest_path.display()
            ))
        })?;
        let root_file = manifest.root_file(manifest_dir).ok_or_else(|| {
            ProcessorError::scan_failed(format!(
                "找不到 crate 根文件 (src/lib.rs 或 src/main.rs): {}",
                manifest_dir.display()
            ))
        })?;

        debug!(
            "加载 crate {}，根文件 {}",
            crate_name,
            root_file.display()
        );
        Ok(Self::from_file(crate_name, root_file).with_dependencies(manifest.dependency_names()))
    }

    /// 添加依赖 crate 名称
    pub fn with_dependencies<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.dependencies.extend(
            names
                .into_iter()
                .map(|name| crate_name_from_package(name.as_ref())),
        );
        self
    }

    /// 添加由其他生成器产生的名称，使依赖它们的声明在后续轮次可以解析
    pub fn with_generated_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.generated_names
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// crate 名称
    pub fn crate_name(&self) -> &str {
        &self.crate_name
    }

    /// 源码目录，内存源码时为 `None`
    pub fn source_dir(&self) -> Option<&Path> {
        match &self.root {
            SourceRoot::File(path) => path.parent(),
            SourceRoot::Inline(_) => None,
        }
    }

    fn is_known_root(&self, name: &str, scope: &ModuleScope) -> bool {
        PATH_ROOTS.contains(&name)
            || PRELUDE_NAMES.contains(&name)
            || scope.names.contains(name)
            || self.dependencies.contains(name)
            || self.generated_names.contains(name)
    }

    fn is_known_crate(&self, name: &str) -> bool {
        matches!(name, "std" | "core" | "alloc") || self.dependencies.contains(name)
    }
}

impl CompilationContext for SourceContext {
    fn module_name(&self) -> &str {
        &self.crate_name
    }

    fn declarations_annotated_with(
        &self,
        marker: &MarkerAnnotation,
    ) -> ProcessorResult<Vec<Declaration>> {
        let mut walker = ModuleWalker {
            context: self,
            marker,
            declarations: Vec::new(),
        };
        let crate_path = vec![self.crate_name.clone()];

        match &self.root {
            SourceRoot::File(path) => {
                let content = fs::read_to_string(path).map_err(|e| {
                    ProcessorError::scan_failed(format!(
                        "无法读取 crate 根文件 {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
                let dirs = ModuleDirs {
                    child_dir: Some(dir.clone()),
                    path_base: Some(dir),
                };
                walker.walk_source(&content, path.display().to_string(), &crate_path, &dirs);
            }
            SourceRoot::Inline(source) => {
                let dirs = ModuleDirs {
                    child_dir: None,
                    path_base: None,
                };
                walker.walk_source(source, "<inline>".to_string(), &crate_path, &dirs);
            }
        }

        Ok(walker.declarations)
    }
}

/// `Cargo.toml` 中扫描需要的部分
#[derive(Debug, Deserialize)]
struct Manifest {
    package: Option<PackageSection>,
    lib: Option<LibSection>,
    #[serde(default)]
    dependencies: toml::Table,
    #[serde(default)]
    target: toml::Table,
}

#[derive(Debug, Deserialize)]
struct PackageSection {
    name: String,
}

#[derive(Debug, Deserialize)]
struct LibSection {
    name: Option<String>,
    path: Option<PathBuf>,
}

impl Manifest {
    fn crate_name(&self) -> Option<String> {
        self.lib
            .as_ref()
            .and_then(|lib| lib.name.clone())
            .or_else(|| self.package.as_ref().map(|package| package.name.clone()))
            .map(|name| crate_name_from_package(&name))
    }

    fn root_file(&self, manifest_dir: &Path) -> Option<PathBuf> {
        if let Some(path) = self.lib.as_ref().and_then(|lib| lib.path.as_ref()) {
            return Some(manifest_dir.join(path));
        }
        ["src/lib.rs", "src/main.rs"]
            .iter()
            .map(|candidate| manifest_dir.join(candidate))
            .find(|candidate| candidate.is_file())
    }

    fn dependency_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.dependencies.keys().cloned().collect();
        for platform in self.target.values() {
            if let Some(dependencies) = platform.get("dependencies").and_then(|d| d.as_table()) {
                names.extend(dependencies.keys().cloned());
            }
        }
        names
    }
}

/// 模块所在目录信息
#[derive(Debug, Clone)]
struct ModuleDirs {
    /// `mod x;` 查找子模块文件的目录
    child_dir: Option<PathBuf>,
    /// `#[path]` 相对路径的基准目录
    path_base: Option<PathBuf>,
}

/// 模块内可见的名称
#[derive(Debug, Default)]
struct ModuleScope {
    names: HashSet<String>,
    /// 有 glob 导入或宏调用时无法静态确定全部名称
    opaque: bool,
}

impl ModuleScope {
    fn collect(items: &[Item]) -> Self {
        let mut scope = Self::default();
        for item in items {
            match item {
                Item::Const(item) => scope.insert(&item.ident),
                Item::Enum(item) => scope.insert(&item.ident),
                Item::ExternCrate(item) => match &item.rename {
                    Some((_, rename)) => scope.insert(rename),
                    None => scope.insert(&item.ident),
                },
                Item::Fn(item) => scope.insert(&item.sig.ident),
                Item::ForeignMod(foreign) => {
                    for foreign_item in &foreign.items {
                        match foreign_item {
                            syn::ForeignItem::Fn(item) => scope.insert(&item.sig.ident),
                            syn::ForeignItem::Static(item) => scope.insert(&item.ident),
                            syn::ForeignItem::Type(item) => scope.insert(&item.ident),
                            _ => {}
                        }
                    }
                }
                Item::Macro(item) => match &item.ident {
                    Some(ident) => scope.insert(ident),
                    None => scope.opaque = true,
                },
                Item::Mod(item) => scope.insert(&item.ident),
                Item::Static(item) => scope.insert(&item.ident),
                Item::Struct(item) => scope.insert(&item.ident),
                Item::Trait(item) => scope.insert(&item.ident),
                Item::TraitAlias(item) => scope.insert(&item.ident),
                Item::Type(item) => scope.insert(&item.ident),
                Item::Union(item) => scope.insert(&item.ident),
                Item::Use(item) => scope.collect_use_tree(&item.tree, None),
                Item::Verbatim(_) => scope.opaque = true,
                _ => {}
            }
        }
        scope
    }

    fn insert(&mut self, ident: &syn::Ident) {
        self.names.insert(ident.unraw().to_string());
    }

    fn collect_use_tree(&mut self, tree: &UseTree, parent: Option<&syn::Ident>) {
        match tree {
            UseTree::Path(path) => self.collect_use_tree(&path.tree, Some(&path.ident)),
            UseTree::Name(name) => {
                if name.ident == "self" {
                    if let Some(parent) = parent {
                        self.insert(parent);
                    }
                } else {
                    self.insert(&name.ident);
                }
            }
            UseTree::Rename(rename) => {
                if rename.rename != "_" {
                    self.insert(&rename.rename);
                }
            }
            UseTree::Glob(_) => self.opaque = true,
            UseTree::Group(group) => {
                for item in &group.items {
                    self.collect_use_tree(item, parent);
                }
            }
        }
    }
}

/// 签名中出现的路径起点
#[derive(Default)]
struct PathRoots {
    roots: Vec<(bool, String)>,
}

impl<'ast> Visit<'ast> for PathRoots {
    fn visit_path(&mut self, path: &'ast syn::Path) {
        if let Some(first) = path.segments.first() {
            self.roots
                .push((path.leading_colon.is_some(), first.ident.unraw().to_string()));
        }
        visit::visit_path(self, path);
    }
}

struct ModuleWalker<'a> {
    context: &'a SourceContext,
    marker: &'a MarkerAnnotation,
    declarations: Vec<Declaration>,
}

impl ModuleWalker<'_> {
    fn walk_source(&mut self, content: &str, origin: String, module_path: &[String], dirs: &ModuleDirs) {
        match syn::parse_file(content) {
            Ok(file) => self.walk_items(&file.items, module_path, dirs),
            Err(e) => warn!("源码解析失败，已跳过 {}: {}", origin, e),
        }
    }

    fn walk_items(&mut self, items: &[Item], module_path: &[String], dirs: &ModuleDirs) {
        let scope = ModuleScope::collect(items);

        for item in items {
            match item {
                Item::Fn(item_fn) if self.has_marker(&item_fn.attrs) => {
                    self.visit_candidate(item_fn, module_path, &scope)
                }
                Item::Mod(item_mod) => {
                    if is_test_only(&item_mod.attrs) {
                        continue;
                    }
                    // 路径段保留 `r#`，目录和文件名不带
                    let name = item_mod.ident.unraw().to_string();
                    let mut child_path = module_path.to_vec();
                    child_path.push(item_mod.ident.to_string());

                    match &item_mod.content {
                        Some((_, content)) => {
                            let inner_dir = dirs.child_dir.as_ref().map(|dir| dir.join(&name));
                            let inner_dirs = ModuleDirs {
                                child_dir: inner_dir.clone(),
                                path_base: inner_dir,
                            };
                            self.walk_items(content, &child_path, &inner_dirs);
                        }
                        None => self.walk_module_file(item_mod, &name, &child_path, dirs),
                    }
                }
                Item::Impl(item_impl) => {
                    for impl_item in &item_impl.items {
                        if let syn::ImplItem::Fn(method) = impl_item {
                            if self.has_marker(&method.attrs) {
                                warn!(
                                    "{} 只能用于自由函数，已跳过方法 {}::{}",
                                    self.marker,
                                    module_path.join(PATH_SEPARATOR),
                                    method.sig.ident
                                );
                            }
                        }
                    }
                }
                other => {
                    if item_attrs(other).is_some_and(|attrs| self.has_marker(attrs)) {
                        warn!(
                            "{} 只能用于自由函数，已跳过 {} 中的非函数项",
                            self.marker,
                            module_path.join(PATH_SEPARATOR)
                        );
                    }
                }
            }
        }
    }

    fn walk_module_file(
        &mut self,
        item_mod: &syn::ItemMod,
        name: &str,
        child_path: &[String],
        dirs: &ModuleDirs,
    ) {
        let module_name = child_path.join(PATH_SEPARATOR);

        let located = match path_attribute(&item_mod.attrs) {
            Some(relative) => dirs.path_base.as_ref().map(|base| {
                let file = base.join(relative);
                // #[path] 加载的文件按 mod.rs 处理
                let child_dir = file.parent().map(Path::to_path_buf);
                (file, child_dir)
            }),
            None => dirs.child_dir.as_ref().and_then(|dir| {
                let flat = dir.join(format!("{}.rs", name));
                let nested = dir.join(name).join("mod.rs");
                let child_dir = Some(dir.join(name));
                if flat.is_file() {
                    Some((flat, child_dir))
                } else if nested.is_file() {
                    Some((nested, child_dir))
                } else {
                    warn!("找不到模块 {} 的源文件", module_name);
                    None
                }
            }),
        };

        let Some((file, child_dir)) = located else {
            if dirs.child_dir.is_none() {
                debug!("内存源码无法加载外部模块 {}，已跳过", module_name);
            }
            return;
        };

        match fs::read_to_string(&file) {
            Ok(content) => {
                let file_dirs = ModuleDirs {
                    path_base: file.parent().map(Path::to_path_buf),
                    child_dir,
                };
                self.walk_source(&content, file.display().to_string(), child_path, &file_dirs);
            }
            Err(e) => warn!("无法读取模块 {} 的源文件 {}: {}", module_name, file.display(), e),
        }
    }

    fn visit_candidate(&mut self, item_fn: &ItemFn, module_path: &[String], scope: &ModuleScope) {
        let sig = &item_fn.sig;
        let container_path = module_path.join(PATH_SEPARATOR);
        let symbol_name = sig.ident.to_string();

        let rejection = if sig.asyncness.is_some() {
            Some("不能是 async 函数")
        } else if !sig.generics.params.is_empty() {
            Some("不能带泛型参数")
        } else if !sig.inputs.is_empty() {
            Some("不能带参数")
        } else if matches!(sig.output, ReturnType::Default) {
            Some("必须声明返回类型")
        } else {
            None
        };
        if let Some(reason) = rejection {
            warn!(
                "{} 标记的函数{}，已跳过: {}::{}",
                self.marker, reason, container_path, symbol_name
            );
            return;
        }

        let unresolved = if scope.opaque {
            Vec::new()
        } else {
            self.unresolved_names(&sig.output, scope)
        };

        self.declarations.push(
            Declaration::new(container_path, symbol_name).with_unresolved(unresolved),
        );
    }

    fn unresolved_names(&self, output: &ReturnType, scope: &ModuleScope) -> Vec<String> {
        let mut roots = PathRoots::default();
        roots.visit_return_type(output);

        let mut unresolved: Vec<String> = Vec::new();
        for (leading_colon, name) in roots.roots {
            let known = if leading_colon {
                self.context.is_known_crate(&name)
            } else {
                self.context.is_known_root(&name, scope)
            };
            if !known && !unresolved.contains(&name) {
                unresolved.push(name);
            }
        }
        unresolved
    }

    fn has_marker(&self, attrs: &[Attribute]) -> bool {
        attrs.iter().any(|attr| self.marker.matches(attr.path()))
    }
}

fn item_attrs(item: &Item) -> Option<&[Attribute]> {
    let attrs = match item {
        Item::Const(item) => &item.attrs,
        Item::Enum(item) => &item.attrs,
        Item::Static(item) => &item.attrs,
        Item::Struct(item) => &item.attrs,
        Item::Trait(item) => &item.attrs,
        Item::Type(item) => &item.attrs,
        Item::Union(item) => &item.attrs,
        _ => return None,
    };
    Some(attrs)
}

fn is_test_only(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|attr| {
        attr.path().is_ident("cfg")
            && attr
                .parse_args::<Meta>()
                .map(|meta| cfg_requires_test(&meta))
                .unwrap_or(false)
    })
}

/// `test` 或 `all(.., test, ..)` 形式的条件只在测试构建中成立
fn cfg_requires_test(meta: &Meta) -> bool {
    match meta {
        Meta::Path(path) => path.is_ident("test"),
        Meta::List(list) if list.path.is_ident("all") => list
            .parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)
            .map(|nested| nested.iter().any(cfg_requires_test))
            .unwrap_or(false),
        _ => false,
    }
}

fn path_attribute(attrs: &[Attribute]) -> Option<String> {
    attrs.iter().find_map(|attr| {
        if !attr.path().is_ident("path") {
            return None;
        }
        match &attr.meta {
            syn::Meta::NameValue(nv) => match &nv.value {
                syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Str(value),
                    ..
                }) => Some(value.value()),
                _ => None,
            },
            _ => None,
        }
    })
}
