//! 存储文件格式
//!
//! UTF-8 文本，每行一个 `containerPath:symbolName`，无表头

use registry_common::{Entry, StoreError, StoreResult};
use indexmap::IndexSet;

/// 解析结果
#[derive(Debug, Default)]
pub struct ParsedStore {
    /// 去重后的注册项，保持文件顺序
    pub entries: IndexSet<Entry>,
    /// 被跳过的格式错误的行数（不含空行）
    pub malformed_lines: usize,
}

/// 解析存储文件内容
pub fn parse(content: &str) -> ParsedStore {
    let mut parsed = ParsedStore::default();
    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match Entry::parse_line(line) {
            Some(entry) => {
                parsed.entries.insert(entry);
            }
            None => parsed.malformed_lines += 1,
        }
    }
    parsed
}

/// 渲染存储文件内容
pub fn render<'a, I>(entries: I) -> String
where
    I: IntoIterator<Item = &'a Entry>,
{
    let mut content = String::new();
    for entry in entries {
        content.push_str(&entry.to_line());
        content.push('\n');
    }
    content
}

/// 写入前校验注册项，防止把无法读回的行写进存储
pub fn validate(entries: &[Entry]) -> StoreResult<()> {
    match entries.iter().find(|entry| !entry.is_well_formed()) {
        Some(entry) => Err(StoreError::InvalidEntry {
            entry: entry.to_line(),
        }),
        None => Ok(()),
    }
}
