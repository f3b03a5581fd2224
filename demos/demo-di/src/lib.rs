//! 演示用的最小模块类型
//!
//! 只用于让演示 crate 编译通过，不包含任何依赖解析逻辑。

use std::fmt;

/// 依赖注入模块
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Module {
    name: String,
    definitions: Vec<String>,
}

impl Module {
    /// 创建空模块
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            definitions: Vec::new(),
        }
    }

    /// 声明一个单例定义
    pub fn single(mut self, definition: impl Into<String>) -> Self {
        self.definitions.push(definition.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn definitions(&self) -> &[String] {
        &self.definitions
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.definitions.join(", "))
    }
}
