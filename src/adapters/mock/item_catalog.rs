use crate::domain::value_objects::{ItemId, UserId};
use crate::ports::item_catalog::{CatalogItem, ItemCatalog as ItemCatalogTrait, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// ItemCatalogのモック実装
///
/// アイテムを登録することで状態を持ったテストをサポート。
/// 予約可否は後から切り替えられる。
pub struct ItemCatalog {
    items: Mutex<HashMap<ItemId, CatalogItem>>,
}

impl ItemCatalog {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(HashMap::new()),
        }
    }

    /// テスト用に予約可能なアイテムを登録し、そのIDを返す
    pub fn add_item(&self, owner_id: UserId, name: &str) -> ItemId {
        let item_id = ItemId::new();
        self.insert(CatalogItem {
            item_id,
            owner_id,
            name: name.to_string(),
            available: true,
        });
        item_id
    }

    /// テスト用にアイテム情報をそのまま登録
    pub fn insert(&self, item: CatalogItem) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(item.item_id, item);
    }

    /// 予約可否を切り替える
    pub fn set_available(&self, item_id: ItemId, available: bool) {
        if let Some(item) = self
            .items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&item_id)
        {
            item.available = available;
        }
    }
}

impl Default for ItemCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ItemCatalogTrait for ItemCatalog {
    /// 登録されたアイテムを返す
    async fn get(&self, item_id: ItemId) -> Result<Option<CatalogItem>> {
        Ok(self
            .items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&item_id)
            .cloned())
    }
}
