//! # Registry Store
//!
//! 跨模块共享的注册项存储。每个模块在各自的构建进程中扫描后把发现的注册项写入这里，
//! 收集模块在最终生成阶段重新读取，从而拿到所有兄弟模块的发现结果。
//!
//! ## 核心接口
//!
//! - [`SharedStore`] - 共享存储 trait（幂等并集写入 + 全量读取）
//! - [`FileSharedStore`] - 基于文本文件和咨询锁的实现
//! - [`InMemorySharedStore`] - 内存实现，用于测试
//!
//! ## 已知限制
//!
//! 文件锁是咨询锁。拿不到锁时会在有限次重试后不加锁写入，
//! 这时两个同时"读-改-写"的进程仍可能丢失对方的注册项。

pub mod file;
pub mod format;
pub mod memory;

pub use file::FileSharedStore;
pub use memory::InMemorySharedStore;

use registry_common::{Entry, StoreResult};

/// 一次写入的结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOutcome {
    /// 新增的注册项数量
    pub added: usize,
    /// 已经存在的注册项数量
    pub already_present: usize,
}

impl WriteOutcome {
    /// 是否改变了存储内容
    pub fn changed(&self) -> bool {
        self.added > 0
    }
}

/// 共享存储 trait
///
/// 写入是幂等并集而不是追加日志：重复写入同一注册项不会改变存储内容。
pub trait SharedStore: Send + Sync {
    /// 写入一批注册项
    fn write_all(&self, entries: &[Entry]) -> StoreResult<WriteOutcome>;

    /// 读取全部注册项，按首次写入顺序；存储不存在时返回空列表
    fn read(&self) -> StoreResult<Vec<Entry>>;

    /// 删除存储中的全部注册项
    fn clear(&self) -> StoreResult<()>;

    /// 存储位置描述，用于日志
    fn location(&self) -> String;

    /// 写入单个注册项
    fn write(&self, entry: &Entry) -> StoreResult<WriteOutcome> {
        self.write_all(std::slice::from_ref(entry))
    }
}

impl<S: SharedStore + ?Sized> SharedStore for std::sync::Arc<S> {
    fn write_all(&self, entries: &[Entry]) -> StoreResult<WriteOutcome> {
        (**self).write_all(entries)
    }

    fn read(&self) -> StoreResult<Vec<Entry>> {
        (**self).read()
    }

    fn clear(&self) -> StoreResult<()> {
        (**self).clear()
    }

    fn location(&self) -> String {
        (**self).location()
    }
}
