//! 基于文件的共享存储实现

use crate::format;
use crate::{SharedStore, WriteOutcome};
use fs2::FileExt;
use registry_common::{Entry, StoreError, StoreResult};
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// 默认加锁重试次数
const DEFAULT_LOCK_RETRIES: u32 = 40;

/// 默认加锁重试间隔
const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(25);

/// 临时文件序号，同一进程内的多个写入者互不覆盖
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// 基于文件的共享存储
///
/// "读-改-写"期间持有 `<store>.lock` 上的排他咨询锁，
/// 新内容先写入同目录的临时文件再重命名，读者不会看到写了一半的文件。
#[derive(Debug, Clone)]
pub struct FileSharedStore {
    path: PathBuf,
    lock_retries: u32,
    retry_delay: Duration,
}

/// 持有中的存储锁，离开作用域时释放
struct StoreLock {
    file: File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

impl FileSharedStore {
    /// 创建新的文件存储，文件在第一次写入时才会创建
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock_retries: DEFAULT_LOCK_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// 设置加锁重试策略
    pub fn with_lock_retries(mut self, retries: u32, delay: Duration) -> Self {
        self.lock_retries = retries;
        self.retry_delay = delay;
        self
    }

    /// 存储文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 锁文件路径
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        let sequence = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        name.push(format!(".{}-{}.tmp", std::process::id(), sequence));
        self.path.with_file_name(name)
    }

    fn ensure_parent_dir(&self) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StoreError::WriteFailed {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }
        Ok(())
    }

    /// 获取排他锁
    ///
    /// 返回 `None` 表示放弃加锁、直接写入（锁被长期占用或文件系统不支持锁）。
    fn acquire_lock(&self) -> StoreResult<Option<StoreLock>> {
        let lock_path = self.lock_path();
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| StoreError::LockFailed {
                path: lock_path.clone(),
                source: e,
            })?;

        let contended = fs2::lock_contended_error();
        for attempt in 0..=self.lock_retries {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    if attempt > 0 {
                        debug!("重试 {} 次后获得存储锁: {}", attempt, lock_path.display());
                    }
                    return Ok(Some(StoreLock { file }));
                }
                Err(e)
                    if e.kind() == ErrorKind::WouldBlock
                        || e.raw_os_error() == contended.raw_os_error() =>
                {
                    std::thread::sleep(self.retry_delay);
                }
                Err(e) => {
                    warn!(
                        "存储锁不可用，将不加锁写入（可能与并发写入者冲突）: {} - {}",
                        lock_path.display(),
                        e
                    );
                    return Ok(None);
                }
            }
        }

        warn!(
            "等待存储锁超时，将不加锁写入（可能与并发写入者冲突）: {}",
            lock_path.display()
        );
        Ok(None)
    }

    fn read_entries(&self) -> StoreResult<format::ParsedStore> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("共享存储尚不存在: {}", self.path.display());
                return Ok(format::ParsedStore::default());
            }
            Err(e) => {
                return Err(StoreError::ReadFailed {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        // 上一次构建中断可能留下非 UTF-8 的残片，按格式错误的行处理
        let content = String::from_utf8_lossy(&bytes);
        let parsed = format::parse(&content);
        if parsed.malformed_lines > 0 {
            debug!(
                "共享存储中跳过 {} 行格式错误的内容: {}",
                parsed.malformed_lines,
                self.path.display()
            );
        }
        Ok(parsed)
    }

    fn replace_contents(&self, content: &str) -> StoreResult<()> {
        let temp_path = self.temp_path();
        fs::write(&temp_path, content).map_err(|e| StoreError::WriteFailed {
            path: temp_path.clone(),
            source: e,
        })?;
        fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            StoreError::WriteFailed {
                path: self.path.clone(),
                source: e,
            }
        })
    }
}

impl SharedStore for FileSharedStore {
    fn write_all(&self, entries: &[Entry]) -> StoreResult<WriteOutcome> {
        format::validate(entries)?;
        if entries.is_empty() {
            return Ok(WriteOutcome::default());
        }

        self.ensure_parent_dir()?;
        let _lock = self.acquire_lock()?;

        let mut current = self.read_entries()?;
        let mut outcome = WriteOutcome::default();
        for entry in entries {
            if current.entries.insert(entry.clone()) {
                outcome.added += 1;
            } else {
                outcome.already_present += 1;
            }
        }

        // 没有新增且文件本身是干净的，就不重写
        if !outcome.changed() && current.malformed_lines == 0 {
            debug!("注册项均已存在，跳过写入: {}", self.path.display());
            return Ok(outcome);
        }

        self.replace_contents(&format::render(&current.entries))?;
        info!(
            "共享存储写入完成: {}，新增 {} 项，共 {} 项",
            self.path.display(),
            outcome.added,
            current.entries.len()
        );
        Ok(outcome)
    }

    fn read(&self) -> StoreResult<Vec<Entry>> {
        Ok(self.read_entries()?.entries.into_iter().collect())
    }

    fn clear(&self) -> StoreResult<()> {
        let _lock = if self.path.exists() {
            self.acquire_lock()?
        } else {
            None
        };
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("共享存储已清空: {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::WriteFailed {
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
