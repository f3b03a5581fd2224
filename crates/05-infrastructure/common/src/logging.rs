//! 日志系统初始化

use crate::errors::{ProcessorError, ProcessorResult};
use tracing_subscriber::EnvFilter;

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 日志级别（`RUST_LOG` 存在时以其为准）
    pub level: tracing::Level,
    /// 是否显示目标
    pub show_target: bool,
    /// 是否显示文件名
    pub show_file: bool,
    /// 是否显示行号
    pub show_line_number: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
    /// 是否输出 ANSI 颜色
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: true,
            show_file: false,
            show_line_number: false,
            json_format: false,
            ansi: true,
        }
    }
}

impl LoggingConfig {
    /// 创建开发环境日志配置
    pub fn development() -> Self {
        Self {
            level: tracing::Level::DEBUG,
            show_target: true,
            show_file: true,
            show_line_number: true,
            json_format: false,
            ansi: true,
        }
    }

    /// 创建构建脚本日志配置
    ///
    /// cargo 会捕获构建脚本的输出，因此关闭颜色
    pub fn build_script() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: false,
            show_file: false,
            show_line_number: false,
            json_format: false,
            ansi: false,
        }
    }

    /// 创建 CI 环境日志配置
    pub fn production() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: false,
            show_file: false,
            show_line_number: false,
            json_format: true,
            ansi: false,
        }
    }
}

/// 初始化日志系统
///
/// 日志写到 stderr，stdout 留给 cargo 指令。已经初始化过时返回错误，调用方可以忽略。
pub fn init_logging(config: &LoggingConfig) -> ProcessorResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str().to_lowercase()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(config.ansi)
        .with_target(config.show_target)
        .with_file(config.show_file)
        .with_line_number(config.show_line_number);

    if config.json_format {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    }
    .map_err(|e| ProcessorError::BootstrapFailed {
        message: format!("日志初始化失败: {}", e),
    })?;

    tracing::debug!("日志系统初始化完成");
    Ok(())
}
