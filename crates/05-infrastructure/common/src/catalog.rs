//! 注册项目录
//!
//! 聚合后的结果：去重、保持首次出现的顺序

use crate::entry::Entry;
use indexmap::IndexSet;

/// 注册项目录
///
/// 同一个 `(container_path, symbol_name)` 只会出现一次，
/// 迭代顺序为首次插入的顺序。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: IndexSet<Entry>,
}

impl Catalog {
    /// 创建空目录
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入注册项，已存在时返回 `false` 且不改变顺序
    pub fn insert(&mut self, entry: Entry) -> bool {
        self.entries.insert(entry)
    }

    /// 是否包含指定注册项
    pub fn contains(&self, entry: &Entry) -> bool {
        self.entries.contains(entry)
    }

    /// 注册项数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按目录顺序迭代
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    /// 按完全限定名称排序
    pub fn sort_by_qualified_name(&mut self) {
        self.entries
            .sort_by(|a, b| a.qualified_name().cmp(&b.qualified_name()));
    }

    /// 转换为有序列表
    pub fn into_vec(self) -> Vec<Entry> {
        self.entries.into_iter().collect()
    }
}

impl FromIterator<Entry> for Catalog {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Extend<Entry> for Catalog {
    fn extend<I: IntoIterator<Item = Entry>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Entry;
    type IntoIter = indexmap::set::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_first_seen_order() {
        let mut catalog = Catalog::new();
        assert!(catalog.insert(Entry::new("module_b", "module_b_koin")));
        assert!(catalog.insert(Entry::new("module_a", "module_a_koin")));
        assert!(!catalog.insert(Entry::new("module_b", "module_b_koin")));

        let names: Vec<String> = catalog.iter().map(Entry::qualified_name).collect();
        assert_eq!(names, vec!["module_b::module_b_koin", "module_a::module_a_koin"]);
    }

    #[test]
    fn test_sort_by_qualified_name() {
        let mut catalog: Catalog = vec![
            Entry::new("module_c", "c"),
            Entry::new("module_a", "a"),
            Entry::new("module_b", "b"),
        ]
        .into_iter()
        .collect();

        catalog.sort_by_qualified_name();

        let containers: Vec<&str> = catalog.iter().map(|e| e.container_path.as_str()).collect();
        assert_eq!(containers, vec!["module_a", "module_b", "module_c"]);
    }
}
