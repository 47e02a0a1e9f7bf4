use crate::domain::{
    Booking, BookingFilter, BookingId, BookingState, ItemId, NewBooking, Page, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 新規予約の保存結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// 保存された（ID採番済み、ステータスはWaiting）
    Inserted(Booking),
    /// 開始日時より後に終わる承認済み予約があり保存しなかった
    Blocked(Vec<Booking>),
}

/// Waitingからの状態遷移の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// 遷移した
    Transitioned(Booking),
    /// 既にWaitingではなかった（同時実行で先に遷移された場合を含む）
    NotWaiting(BookingState),
    /// 承認しようとしたが、同じアイテムの承認済み予約と期間が重なる
    Overlapping(Vec<Booking>),
    /// 予約が存在しない
    Missing,
}

/// 予約ストアポート
///
/// 予約レコードを排他的に所有する。
/// 書き込み操作はアイテム単位でアトミックであること。
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Waiting状態の予約を保存する
    ///
    /// 同じアイテムに `end > start` の承認済み予約がある場合は保存しない。
    /// 確認と挿入は同じアイテムへの他の書き込みに対してアトミックに行う。
    async fn insert_waiting(&self, booking: NewBooking) -> Result<InsertOutcome>;

    /// IDで予約を取得する
    async fn find_by_id(&self, id: BookingId) -> Result<Option<Booking>>;

    /// アイテムの承認済み予約のうち、終了が `after` より後のものを取得する
    async fn find_approved_ending_after(
        &self,
        item_id: ItemId,
        after: DateTime<Utc>,
    ) -> Result<Vec<Booking>>;

    /// ステータスをWaitingから `to` へ遷移させる（compare-and-swap）
    ///
    /// `to` がApprovedの場合、同じアイテムの他の承認済み予約と期間が重なれば遷移しない。
    async fn transition_from_waiting(
        &self,
        id: BookingId,
        to: BookingState,
    ) -> Result<TransitionOutcome>;

    /// 予約者の予約一覧（start降順、同順はID昇順）
    async fn list_by_booker(
        &self,
        booker_id: UserId,
        filter: &BookingFilter,
        page: Page,
    ) -> Result<Vec<Booking>>;

    /// 所有アイテムの予約一覧（start降順、同順はID昇順）
    async fn list_by_owner(
        &self,
        owner_id: UserId,
        filter: &BookingFilter,
        page: Page,
    ) -> Result<Vec<Booking>>;

    /// 所有者から見たアイテムの予約一覧（start昇順）
    ///
    /// アイテムの所有者が `owner_id` でなければ空になる。
    async fn list_for_item(&self, item_id: ItemId, owner_id: UserId) -> Result<Vec<Booking>>;

    /// 予約者がアイテムについて `before` までに終了した承認済み予約を持つか
    async fn has_finished_booking(
        &self,
        booker_id: UserId,
        item_id: ItemId,
        before: DateTime<Utc>,
    ) -> Result<bool>;
}
