//! 运行时解析错误

use thiserror::Error;

/// 按名称解析模块工厂失败的原因
///
/// 每个注册项独立失败，不影响其他注册项。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("模块工厂未登记: {qualified_name}（所在 crate 是否已链接进最终产物？）")]
    NotRegistered { qualified_name: String },

    #[error("模块工厂返回类型不匹配: {qualified_name}, 期望 {expected}")]
    TypeMismatch {
        qualified_name: String,
        expected: &'static str,
    },

    #[error("模块工厂调用失败: {qualified_name}, 原因: {message}")]
    InvocationPanicked {
        qualified_name: String,
        message: String,
    },
}

impl ResolveError {
    /// 出错注册项的完全限定名称
    pub fn qualified_name(&self) -> &str {
        match self {
            Self::NotRegistered { qualified_name }
            | Self::TypeMismatch { qualified_name, .. }
            | Self::InvocationPanicked { qualified_name, .. } => qualified_name,
        }
    }
}

/// 解析结果类型别名
pub type ResolveResult<T> = Result<T, ResolveError>;
