//! 模块工厂宏与生成注册表的集中集成测试，测试代码位于 `tests/` 目录
