//! # Registry Common
//!
//! 这个 crate 提供了模块注册表生成器各个组件共用的模型、错误类型和配置。
//!
//! ## 核心组件
//!
//! - [`Entry`] - 一次发现的注册项（容器路径 + 符号名）
//! - [`Catalog`] - 去重且保持顺序的注册项集合
//! - [`ProcessorOptions`] - 处理器配置，支持分层加载
//! - [`LoggingConfig`] - 日志系统配置
//!
//! ## 设计原则
//!
//! - 注册项以 `(container_path, symbol_name)` 二元组作为唯一标识
//! - 存储文件格式是纯文本，每行一个注册项
//! - 除了最终产物无法写入之外，任何错误都不应中断宿主编译

pub mod catalog;
pub mod configuration;
pub mod entry;
pub mod errors;
pub mod logging;

pub use catalog::*;
pub use configuration::*;
pub use entry::*;
pub use errors::*;
pub use logging::*;
