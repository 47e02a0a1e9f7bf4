use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookingId, ItemId, UserId};

/// コマンド：アイテムを予約する
///
/// 開始・終了は未指定の場合もある（バリデーションで検出する）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBooking {
    pub item_id: ItemId,
    pub booker_id: UserId,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// コマンド：予約を承認または却下する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveBooking {
    pub booking_id: BookingId,
    pub approved: bool,
    pub acting_user_id: UserId,
}

/// クエリ：予約一覧を取得する
///
/// 予約者向け・所有者向けの両方で使う。
/// state未指定はALL、from未指定は0、size未指定は設定のデフォルト件数。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListBookings {
    pub user_id: UserId,
    pub state: Option<String>,
    pub from: Option<i64>,
    pub size: Option<i64>,
}
