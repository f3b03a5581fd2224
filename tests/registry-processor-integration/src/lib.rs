//! 注册表处理器的集中集成测试，测试代码位于 `tests/` 目录
