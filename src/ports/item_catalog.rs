use crate::domain::value_objects::{ItemId, UserId};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// カタログ上のアイテム情報
///
/// 予約コンテキストが必要とする最小限の事実のみ。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    pub item_id: ItemId,
    pub owner_id: UserId,
    pub name: String,
    pub available: bool,
}

/// アイテムカタログポート
///
/// 予約コンテキストとカタログコンテキストの境界を維持する。
#[async_trait]
pub trait ItemCatalog: Send + Sync {
    /// アイテムを取得する（存在しなければNone）
    async fn get(&self, item_id: ItemId) -> Result<Option<CatalogItem>>;
}
