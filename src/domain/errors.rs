use thiserror::Error;

use super::BookingState;

/// 予約期間のバリデーションエラー
///
/// 違反ごとに異なるメッセージを返す。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntervalError {
    /// 開始日時が指定されていない
    #[error("Booking start date is required")]
    MissingStart,
    /// 終了日時が指定されていない
    #[error("Booking end date is required")]
    MissingEnd,
    /// 開始日が過去
    #[error("Booking start date is in the past")]
    StartInPast,
    /// 終了日時が開始日時以前、または終了日が過去
    #[error("Booking end date must be after the start date and not in the past")]
    InvalidEnd,
}

/// 承認・却下の状態遷移エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// Waiting以外からの遷移
    #[error("Booking status cannot be changed from {0}")]
    NotWaiting(BookingState),
    /// アイテム所有者以外による操作
    #[error("Only the item owner can change the booking status")]
    NotOwner,
}

/// 解釈できない状態フィルタ
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown state: {0}")]
pub struct UnknownState(pub String);

/// ページング指定のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaginationError {
    #[error("Page offset must not be negative, got {0}")]
    NegativeOffset(i64),
    #[error("Page size must be positive, got {0}")]
    NonPositiveLimit(i64),
}
