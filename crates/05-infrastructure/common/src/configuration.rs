//! 处理器配置
//!
//! 配置以字符串键值对的形式传入，按优先级分层合并：
//! 默认值 < TOML 文件 < 环境变量 < 显式键值对

use crate::errors::{ConfigError, ConfigResult};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

/// 默认标记注解
pub const DEFAULT_ANNOTATION: &str = "registry_macros::module_factory";

/// 默认注册表类型名称
pub const DEFAULT_REGISTRY_NAME: &str = "ModuleRegistry";

/// 默认生成文件名
pub const DEFAULT_OUTPUT_FILE: &str = "module_registry.rs";

/// 默认运行时 crate 路径
pub const DEFAULT_RUNTIME_CRATE: &str = "::registry_runtime";

/// 共享存储相对于构建输出根目录的位置
pub const STORE_RELATIVE_PATH: &str = "generated/registry/registry-modules.txt";

/// 环境变量前缀
pub const ENV_PREFIX: &str = "REGISTRY_";

/// 配置键与环境变量名的对应关系
pub const OPTION_KEYS: &[(&str, &str)] = &[
    ("collector", "REGISTRY_COLLECTOR"),
    ("storePath", "REGISTRY_STORE_PATH"),
    ("outputRoot", "REGISTRY_OUTPUT_ROOT"),
    ("annotation", "REGISTRY_ANNOTATION"),
    ("strategy", "REGISTRY_STRATEGY"),
    ("handleType", "REGISTRY_HANDLE_TYPE"),
    ("registryName", "REGISTRY_NAME"),
    ("outputFile", "REGISTRY_OUTPUT_FILE"),
    ("runtimeCrate", "REGISTRY_RUNTIME_CRATE"),
    ("emitCount", "REGISTRY_EMIT_COUNT"),
    ("onExisting", "REGISTRY_ON_EXISTING"),
    ("order", "REGISTRY_ORDER"),
];

/// 生成策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmitStrategy {
    /// 直接引用：编译期按路径调用每个符号
    Direct,
    /// 间接调用：运行时按名称解析
    #[default]
    Indirect,
}

impl FromStr for EmitStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "indirect" | "reflection" => Ok(Self::Indirect),
            _ => Err(ConfigError::invalid_value("strategy", s, "direct | indirect")),
        }
    }
}

/// 生成文件已存在时的处理策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExistingArtifactPolicy {
    /// 覆盖（内容相同时不触碰文件）
    #[default]
    Overwrite,
    /// 跳过并记录警告
    Skip,
}

impl FromStr for ExistingArtifactPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "overwrite" => Ok(Self::Overwrite),
            "skip" => Ok(Self::Skip),
            _ => Err(ConfigError::invalid_value("onExisting", s, "overwrite | skip")),
        }
    }
}

/// 目录排序策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogOrder {
    /// 首次发现顺序
    #[default]
    Discovery,
    /// 按完全限定名称排序
    Sorted,
}

impl FromStr for CatalogOrder {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "discovery" => Ok(Self::Discovery),
            "sorted" => Ok(Self::Sorted),
            _ => Err(ConfigError::invalid_value("order", s, "discovery | sorted")),
        }
    }
}

/// 处理器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorOptions {
    /// 是否为收集模块
    pub collector: bool,
    /// 共享存储路径覆盖
    pub store_path: Option<PathBuf>,
    /// 构建输出根目录
    pub output_root: Option<PathBuf>,
    /// 标记注解的完全限定名称
    pub annotation: String,
    /// 生成策略
    pub strategy: EmitStrategy,
    /// 注册表返回的句柄类型
    pub handle_type: Option<String>,
    /// 生成的注册表类型名称
    pub registry_name: String,
    /// 生成文件名
    pub output_file: String,
    /// 运行时 crate 路径
    pub runtime_crate: String,
    /// 是否生成计数方法
    pub emit_count: bool,
    /// 生成文件已存在时的策略
    pub on_existing: ExistingArtifactPolicy,
    /// 目录排序策略
    pub order: CatalogOrder,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            collector: false,
            store_path: None,
            output_root: None,
            annotation: DEFAULT_ANNOTATION.to_string(),
            strategy: EmitStrategy::default(),
            handle_type: None,
            registry_name: DEFAULT_REGISTRY_NAME.to_string(),
            output_file: DEFAULT_OUTPUT_FILE.to_string(),
            runtime_crate: DEFAULT_RUNTIME_CRATE.to_string(),
            emit_count: true,
            on_existing: ExistingArtifactPolicy::default(),
            order: CatalogOrder::default(),
        }
    }
}

impl ProcessorOptions {
    /// 从字符串键值对创建配置
    pub fn from_map(map: &HashMap<String, String>) -> ConfigResult<Self> {
        let mut options = Self::default();
        options.merge(map)?;
        Ok(options)
    }

    /// 合并一组键值对，按键名排序以保证结果确定
    pub fn merge(&mut self, map: &HashMap<String, String>) -> ConfigResult<()> {
        let mut keys: Vec<&String> = map.keys().collect();
        keys.sort();
        for key in keys {
            self.apply(key, &map[key])?;
        }
        Ok(())
    }

    /// 应用单个配置项
    pub fn apply(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        match key {
            "collector" => self.collector = parse_bool(key, value)?,
            "storePath" => self.store_path = non_empty(value).map(PathBuf::from),
            "outputRoot" | "projectDir" => self.output_root = non_empty(value).map(PathBuf::from),
            "annotation" => {
                self.annotation = non_empty(value)
                    .ok_or_else(|| ConfigError::invalid_value(key, value, "非空注解路径"))?
                    .to_string()
            }
            "strategy" => self.strategy = value.parse()?,
            "handleType" => self.handle_type = non_empty(value).map(str::to_string),
            "registryName" => {
                self.registry_name = non_empty(value)
                    .ok_or_else(|| ConfigError::invalid_value(key, value, "非空类型名称"))?
                    .to_string()
            }
            "outputFile" => {
                self.output_file = non_empty(value)
                    .ok_or_else(|| ConfigError::invalid_value(key, value, "非空文件名"))?
                    .to_string()
            }
            "runtimeCrate" => {
                self.runtime_crate = non_empty(value)
                    .ok_or_else(|| ConfigError::invalid_value(key, value, "非空 crate 路径"))?
                    .to_string()
            }
            "emitCount" => self.emit_count = parse_bool(key, value)?,
            "onExisting" => self.on_existing = value.parse()?,
            "order" => self.order = value.parse()?,
            _ => {
                warn!("忽略未知配置项: {} = {}", key, value);
                return Ok(());
            }
        }
        debug!("应用配置项: {} = {}", key, value);
        Ok(())
    }

    /// 构建输出根目录，未配置时为当前目录下的 `target`
    pub fn output_root(&self) -> PathBuf {
        self.output_root
            .clone()
            .unwrap_or_else(|| PathBuf::from("target"))
    }

    /// 共享存储的最终路径
    pub fn resolved_store_path(&self) -> PathBuf {
        self.store_path
            .clone()
            .unwrap_or_else(|| self.output_root().join(STORE_RELATIVE_PATH))
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

fn parse_bool(key: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::invalid_value(key, value, "true | false")),
    }
}

/// 配置来源 trait
pub trait OptionSource: Send + Sync {
    /// 读取配置键值对
    fn load(&self) -> ConfigResult<HashMap<String, String>>;

    /// 来源名称
    fn name(&self) -> &str;

    /// 优先级，数值越大越晚合并（覆盖前面的来源）
    fn priority(&self) -> i32;
}

/// TOML 配置来源
///
/// 读取 `[registry]` 表；没有该表时读取顶层键。文件不存在时视为空。
#[derive(Debug)]
pub struct TomlOptionSource {
    file_path: PathBuf,
    priority: i32,
}

impl TomlOptionSource {
    /// 创建新的 TOML 配置来源
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            file_path: path.as_ref().to_path_buf(),
            priority: 10,
        }
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    fn toml_to_string(value: &toml::Value) -> Option<String> {
        match value {
            toml::Value::String(s) => Some(s.clone()),
            toml::Value::Integer(i) => Some(i.to_string()),
            toml::Value::Float(f) => Some(f.to_string()),
            toml::Value::Boolean(b) => Some(b.to_string()),
            toml::Value::Datetime(dt) => Some(dt.to_string()),
            toml::Value::Array(_) | toml::Value::Table(_) => None,
        }
    }
}

impl OptionSource for TomlOptionSource {
    fn load(&self) -> ConfigResult<HashMap<String, String>> {
        if !self.file_path.exists() {
            debug!("TOML 配置文件不存在，跳过: {}", self.file_path.display());
            return Ok(HashMap::new());
        }

        debug!("加载 TOML 配置文件: {}", self.file_path.display());
        let content =
            std::fs::read_to_string(&self.file_path).map_err(|e| ConfigError::FileReadError {
                path: self.file_path.clone(),
                source: e,
            })?;

        let document: toml::Table = toml::from_str(&content)?;
        let table = match document.get("registry").cloned() {
            Some(toml::Value::Table(table)) => table,
            Some(_) => {
                return Err(ConfigError::TypeConversionError {
                    message: "配置节 registry 不是表类型".to_string(),
                })
            }
            None => document,
        };

        let mut values = HashMap::new();
        for (key, value) in &table {
            match Self::toml_to_string(value) {
                Some(text) => {
                    values.insert(key.clone(), text);
                }
                None => warn!("配置项 {} 不是标量值，已忽略", key),
            }
        }
        Ok(values)
    }

    fn name(&self) -> &str {
        "TomlOptionSource"
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// 环境变量配置来源
#[derive(Debug)]
pub struct EnvironmentOptionSource {
    variables: Option<HashMap<String, String>>,
    priority: i32,
}

impl EnvironmentOptionSource {
    /// 从当前进程环境读取
    pub fn new() -> Self {
        Self {
            variables: None,
            priority: 20,
        }
    }

    /// 使用给定的变量集合，而不是进程环境
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            variables: Some(
                vars.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
            priority: 20,
        }
    }
}

impl Default for EnvironmentOptionSource {
    fn default() -> Self {
        Self::new()
    }
}

impl OptionSource for EnvironmentOptionSource {
    fn load(&self) -> ConfigResult<HashMap<String, String>> {
        let variables: HashMap<String, String> = match &self.variables {
            Some(vars) => vars.clone(),
            None => std::env::vars()
                .filter(|(name, _)| name.starts_with(ENV_PREFIX))
                .collect(),
        };

        let mut values = HashMap::new();
        for (key, env_name) in OPTION_KEYS {
            if let Some(value) = variables.get(*env_name) {
                values.insert((*key).to_string(), value.clone());
            }
        }
        Ok(values)
    }

    fn name(&self) -> &str {
        "EnvironmentOptionSource"
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// 显式键值对配置来源
#[derive(Debug, Default)]
pub struct MapOptionSource {
    values: HashMap<String, String>,
}

impl MapOptionSource {
    /// 创建新的键值对来源
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// 解析 `key=value` 形式的参数
    pub fn from_pairs<I, S>(pairs: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut values = HashMap::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| ConfigError::invalid_value("option", pair, "key=value"))?;
            values.insert(key.trim().to_string(), value.trim().to_string());
        }
        Ok(Self { values })
    }
}

impl OptionSource for MapOptionSource {
    fn load(&self) -> ConfigResult<HashMap<String, String>> {
        Ok(self.values.clone())
    }

    fn name(&self) -> &str {
        "MapOptionSource"
    }

    fn priority(&self) -> i32 {
        30
    }
}

/// 分层配置加载器
#[derive(Default)]
pub struct OptionsLoader {
    sources: Vec<Box<dyn OptionSource>>,
}

impl OptionsLoader {
    /// 创建新的加载器
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加配置来源
    pub fn with_source<S: OptionSource + 'static>(mut self, source: S) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// 按优先级从低到高合并所有来源
    pub fn load(mut self) -> ConfigResult<ProcessorOptions> {
        self.sources.sort_by_key(|source| source.priority());

        let mut options = ProcessorOptions::default();
        for source in &self.sources {
            let values = source.load()?;
            debug!("合并配置来源 {}: {} 项", source.name(), values.len());
            options.merge(&values)?;
        }
        Ok(options)
    }
}

impl std::fmt::Debug for OptionsLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionsLoader")
            .field(
                "sources",
                &self.sources.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
