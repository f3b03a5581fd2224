//! 跨模块注册项聚合

use registry_common::{Catalog, CatalogOrder, Entry};
use tracing::debug;

/// 注册项聚合器
///
/// 先按文件顺序放入共享存储中的注册项，再追加只出现在本轮扫描中的注册项。
/// 除去重外不做任何过滤。
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator {
    order: CatalogOrder,
}

impl Aggregator {
    /// 创建聚合器
    pub fn new(order: CatalogOrder) -> Self {
        Self { order }
    }

    /// 合并共享存储内容与当前模块的注册项
    pub fn aggregate<'a, S, C>(&self, stored: S, current: C) -> Catalog
    where
        S: IntoIterator<Item = Entry>,
        C: IntoIterator<Item = &'a Entry>,
    {
        let mut catalog: Catalog = stored.into_iter().collect();
        let from_store = catalog.len();

        let appended = current
            .into_iter()
            .filter(|entry| catalog.insert((*entry).clone()))
            .count();

        if self.order == CatalogOrder::Sorted {
            catalog.sort_by_qualified_name();
        }

        debug!(
            "聚合完成: 共享存储 {} 个，本轮新增 {} 个，合计 {} 个",
            from_store,
            appended,
            catalog.len()
        );
        catalog
    }
}
