use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{BookingId, IntervalError, ItemId, TransitionError, UnknownState, UserId};

// ============================================================================
// 予約ステータス
// ============================================================================

/// 予約ステータス
///
/// 状態遷移：
/// - Waiting --承認--> Approved
/// - Waiting --却下--> Rejected
///
/// Canceledは管理操作でのみ到達する（このエンジンからの遷移はない）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingState {
    /// 承認待ち
    Waiting,
    /// 承認済み
    Approved,
    /// 却下
    Rejected,
    /// キャンセル
    Canceled,
}

impl BookingState {
    /// 永続化・表示用の文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingState::Waiting => "WAITING",
            BookingState::Approved => "APPROVED",
            BookingState::Rejected => "REJECTED",
            BookingState::Canceled => "CANCELED",
        }
    }

    pub fn is_waiting(&self) -> bool {
        matches!(self, BookingState::Waiting)
    }
}

impl fmt::Display for BookingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingState {
    type Err = UnknownState;

    /// 大文字の正規名のみ受け付ける
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            BookingState::Waiting,
            BookingState::Approved,
            BookingState::Rejected,
            BookingState::Canceled,
        ]
        .into_iter()
        .find(|state| state.as_str() == s)
        .ok_or_else(|| UnknownState(s.to_string()))
    }
}

// ============================================================================
// 予約エンティティ
// ============================================================================

/// 予約 - 1人のユーザーによる1つのアイテムの期間 [start, end) の予約
///
/// 所有者IDは作成時に非正規化して保持し、所有者側の一覧と認可に使う。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub item_id: ItemId,
    pub item_owner_id: UserId,
    pub booker_id: UserId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: BookingState,
}

impl Booking {
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        overlaps(self.start, self.end, start, end)
    }
}

/// 未保存の予約
///
/// IDはストアが採番する。ステータスは常にWaitingで保存される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub item_id: ItemId,
    pub item_owner_id: UserId,
    pub booker_id: UserId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl NewBooking {
    /// 採番済みIDを付与してWaiting状態の予約にする
    pub fn into_waiting(self, id: BookingId) -> Booking {
        Booking {
            id,
            item_id: self.item_id,
            item_owner_id: self.item_owner_id,
            booker_id: self.booker_id,
            start: self.start,
            end: self.end,
            status: BookingState::Waiting,
        }
    }
}

// ============================================================================
// 純粋関数
// ============================================================================

/// 半開区間 [s1, e1) と [s2, e2) が重なるか
pub fn overlaps(
    s1: DateTime<Utc>,
    e1: DateTime<Utc>,
    s2: DateTime<Utc>,
    e2: DateTime<Utc>,
) -> bool {
    s1 < e2 && s2 < e1
}

/// 純粋関数：予約期間のバリデーション
///
/// ビジネスルール：
/// - 開始・終了はどちらも必須
/// - 開始日は今日以降（日付で比較するため、今日なら時刻が過ぎていても可）
/// - 終了は開始より後、かつ終了日が過去でないこと
pub fn validate_interval(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), IntervalError> {
    let start = start.ok_or(IntervalError::MissingStart)?;
    let end = end.ok_or(IntervalError::MissingEnd)?;
    let today = now.date_naive();

    if start.date_naive() < today {
        return Err(IntervalError::StartInPast);
    }
    if end <= start || end.date_naive() < today {
        return Err(IntervalError::InvalidEnd);
    }

    Ok((start, end))
}

/// 純粋関数：承認・却下の判定
///
/// ビジネスルール：
/// - 操作できるのはアイテム所有者のみ
/// - Waiting状態からのみ遷移可能
///
/// 副作用なし。遷移先のステータスを返す。
pub fn decide(
    booking: &Booking,
    acting_user_id: UserId,
    approved: bool,
) -> Result<BookingState, TransitionError> {
    if booking.item_owner_id != acting_user_id {
        return Err(TransitionError::NotOwner);
    }
    if !booking.status.is_waiting() {
        return Err(TransitionError::NotWaiting(booking.status));
    }

    Ok(if approved {
        BookingState::Approved
    } else {
        BookingState::Rejected
    })
}
