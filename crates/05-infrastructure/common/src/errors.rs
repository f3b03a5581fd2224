//! 错误类型定义

use std::path::PathBuf;
use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败: {path}, 原因: {source}")]
    FileReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("配置解析失败: {source}")]
    ParseError {
        #[from]
        source: toml::de::Error,
    },

    #[error("配置值无效: {key} = {value}, 期望: {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: String,
    },

    #[error("配置类型转换失败: {message}")]
    TypeConversionError { message: String },
}

impl ConfigError {
    /// 创建配置值无效错误
    pub fn invalid_value(
        key: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
            expected: expected.into(),
        }
    }
}

/// 共享存储错误类型
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("共享存储读取失败: {path}, 原因: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("共享存储写入失败: {path}, 原因: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("共享存储加锁失败: {path}, 原因: {source}")]
    LockFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("注册项格式无效: {entry}")]
    InvalidEntry { entry: String },
}

/// 代码生成错误类型
#[derive(Error, Debug)]
pub enum EmitError {
    #[error("未配置句柄类型 (handleType)，无法生成注册表")]
    MissingHandleType,

    #[error("类型路径无效: {value}, 原因: {message}")]
    InvalidType { value: String, message: String },

    #[error("注册项无法渲染为路径: {qualified_name}, 原因: {message}")]
    InvalidPath {
        qualified_name: String,
        message: String,
    },

    #[error("生成文件写入失败: {path}, 原因: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// 处理器错误类型
#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("共享存储错误: {source}")]
    StoreError {
        #[from]
        source: StoreError,
    },

    #[error("代码生成错误: {source}")]
    EmitError {
        #[from]
        source: EmitError,
    },

    #[error("源码扫描失败: {message}")]
    ScanFailed { message: String },

    #[error("处理器启动失败: {message}")]
    BootstrapFailed { message: String },
}

impl ProcessorError {
    /// 创建扫描错误
    pub fn scan_failed(message: impl Into<String>) -> Self {
        Self::ScanFailed {
            message: message.into(),
        }
    }
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type StoreResult<T> = Result<T, StoreError>;
pub type EmitResult<T> = Result<T, EmitError>;
pub type ProcessorResult<T> = Result<T, ProcessorError>;
