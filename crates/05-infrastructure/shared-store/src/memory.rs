//! 内存中的共享存储实现

use crate::format;
use crate::{SharedStore, WriteOutcome};
use indexmap::IndexSet;
use parking_lot::Mutex;
use registry_common::{Entry, StoreResult};

/// 内存中的共享存储
///
/// 与文件实现遵守相同的并集写入语义，但只在当前进程内共享。
#[derive(Debug, Default)]
pub struct InMemorySharedStore {
    entries: Mutex<IndexSet<Entry>>,
}

impl InMemorySharedStore {
    /// 创建空存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用已有注册项创建存储
    pub fn with_entries<I: IntoIterator<Item = Entry>>(entries: I) -> Self {
        Self {
            entries: Mutex::new(entries.into_iter().collect()),
        }
    }
}

impl SharedStore for InMemorySharedStore {
    fn write_all(&self, entries: &[Entry]) -> StoreResult<WriteOutcome> {
        format::validate(entries)?;

        let mut stored = self.entries.lock();
        let mut outcome = WriteOutcome::default();
        for entry in entries {
            if stored.insert(entry.clone()) {
                outcome.added += 1;
            } else {
                outcome.already_present += 1;
            }
        }
        Ok(outcome)
    }

    fn read(&self) -> StoreResult<Vec<Entry>> {
        Ok(self.entries.lock().iter().cloned().collect())
    }

    fn clear(&self) -> StoreResult<()> {
        self.entries.lock().clear();
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
