//! 注册项定义
//!
//! 注册项是发现的最小单位，由容器路径和符号名组成

use serde::Serialize;
use std::fmt;

/// 存储文件中字段之间的分隔符
///
/// Rust 路径本身包含 `::`，因此解析时按最后一个分隔符切分
pub const FIELD_DELIMITER: char = ':';

/// 路径段之间的分隔符
pub const PATH_SEPARATOR: &str = "::";

/// 注册项
///
/// 两个注册项只要 `(container_path, symbol_name)` 相同就是同一个逻辑注册，
/// 与产生它们的模块或轮次无关。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Entry {
    /// 所在模块路径，例如 `module_a::di`
    pub container_path: String,
    /// 符号名称，例如 `module_a_koin`
    pub symbol_name: String,
}

impl Entry {
    /// 创建新的注册项
    pub fn new(container_path: impl Into<String>, symbol_name: impl Into<String>) -> Self {
        Self {
            container_path: container_path.into(),
            symbol_name: symbol_name.into(),
        }
    }

    /// 完全限定名称
    pub fn qualified_name(&self) -> String {
        format!("{}{}{}", self.container_path, PATH_SEPARATOR, self.symbol_name)
    }

    /// 容器路径的第一段，即所属 crate 名称
    pub fn crate_name(&self) -> &str {
        self.container_path
            .split(PATH_SEPARATOR)
            .next()
            .unwrap_or(&self.container_path)
    }

    /// 序列化为存储文件中的一行（不含换行符）
    pub fn to_line(&self) -> String {
        format!("{}{}{}", self.container_path, FIELD_DELIMITER, self.symbol_name)
    }

    /// 从存储文件中的一行解析注册项
    ///
    /// 空行、缺少分隔符、字段不是合法路径或标识符的行返回 `None`。
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let (container, symbol) = line.rsplit_once(FIELD_DELIMITER)?;
        // "a::b" 会被切成 ("a:", "b")，这说明根本没有字段分隔符
        if container.ends_with(FIELD_DELIMITER) {
            return None;
        }
        if !is_module_path(container) || !is_identifier(symbol) {
            return None;
        }

        Some(Self::new(container, symbol))
    }

    /// 检查注册项两个字段是否都合法
    pub fn is_well_formed(&self) -> bool {
        is_module_path(&self.container_path) && is_identifier(&self.symbol_name)
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified_name())
    }
}

/// 检查是否为合法的 Rust 标识符
///
/// 遵循 Unicode XID 规则；关键字只能以原始标识符形式（`r#match`）出现。
pub fn is_identifier(value: &str) -> bool {
    match syn::parse_str::<syn::Ident>(value) {
        // 解析会丢弃首尾空白和注释，要求原文完全一致
        Ok(ident) => ident == value,
        Err(_) => false,
    }
}

/// 检查是否为 `::` 分隔的模块路径
pub fn is_module_path(value: &str) -> bool {
    !value.is_empty() && value.split(PATH_SEPARATOR).all(is_identifier)
}

/// 将 Cargo 包名转换为 crate 名称
pub fn crate_name_from_package(package: &str) -> String {
    package.replace('-', "_")
}
