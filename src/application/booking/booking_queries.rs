use crate::domain::{
    Booking, BookingBucket, BookingFilter, BookingState, ItemId, Page, UserId,
    commands::ListBookings,
};

use super::booking_service::{ServiceDependencies, ensure_user_exists};
use super::errors::{BookingApplicationError, Result};

/// 一覧の対象（予約者として見るか、所有者として見るか）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Subject {
    Booker,
    Owner,
}

/// アイテムの直近の予約（所有者向け）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemBookingSummary {
    /// 終了済みの予約のうち、終了が最も遅いもの
    pub last_booking: Option<Booking>,
    /// 未開始の予約のうち、開始が最も早いもの
    pub next_booking: Option<Booking>,
}

/// 予約者としての予約一覧を取得する
///
/// 処理順：
/// 1. ページ指定の検証（InvalidPagination）
/// 2. 状態フィルタのパース（UnknownState）
/// 3. ユーザーの存在確認（NotFound）
/// 4. 現在時刻で時間区分を解決してストアに問い合わせ
///
/// start降順。同じstartはID昇順。
pub async fn list_for_booker(
    deps: &ServiceDependencies,
    query: ListBookings,
) -> Result<Vec<Booking>> {
    list_bookings(deps, query, Subject::Booker).await
}

/// 所有アイテムの予約一覧を取得する
///
/// 条件と並び順は list_for_booker と同じ。対象はアイテム所有者で照合する。
pub async fn list_for_owner(
    deps: &ServiceDependencies,
    query: ListBookings,
) -> Result<Vec<Booking>> {
    list_bookings(deps, query, Subject::Owner).await
}

#[tracing::instrument(skip(deps))]
async fn list_bookings(
    deps: &ServiceDependencies,
    query: ListBookings,
    subject: Subject,
) -> Result<Vec<Booking>> {
    let page = Page::new(
        query.from.unwrap_or(0),
        query.size.unwrap_or(deps.config.default_page_size),
    )?;

    let bucket = match query.state.as_deref() {
        Some(state) => state.parse::<BookingBucket>()?,
        None => BookingBucket::All,
    };

    ensure_user_exists(&deps.user_directory, query.user_id).await?;

    let filter: BookingFilter = bucket.resolve(deps.clock.now());
    tracing::debug!(?filter, ?page, "Resolved booking list filter");

    let bookings = match subject {
        Subject::Booker => {
            deps.booking_store
                .list_by_booker(query.user_id, &filter, page)
                .await
        }
        Subject::Owner => {
            deps.booking_store
                .list_by_owner(query.user_id, &filter, page)
                .await
        }
    }
    .map_err(BookingApplicationError::store)?;

    Ok(bookings)
}

/// アイテムの直前・直後の予約を取得する
///
/// アイテム所有者にのみ内容を返す。所有者以外には空のサマリを返す。
/// 却下・キャンセルされた予約は対象外。
#[tracing::instrument(skip(deps))]
pub async fn item_booking_summary(
    deps: &ServiceDependencies,
    item_id: ItemId,
    viewer_id: UserId,
) -> Result<ItemBookingSummary> {
    let bookings = deps
        .booking_store
        .list_for_item(item_id, viewer_id)
        .await
        .map_err(BookingApplicationError::store)?;

    Ok(summarize(bookings, deps.clock.now()))
}

fn summarize(bookings: Vec<Booking>, now: chrono::DateTime<chrono::Utc>) -> ItemBookingSummary {
    let relevant = bookings
        .into_iter()
        .filter(|b| matches!(b.status, BookingState::Waiting | BookingState::Approved));

    let mut summary = ItemBookingSummary::default();
    for booking in relevant {
        if booking.end < now {
            if summary
                .last_booking
                .as_ref()
                .is_none_or(|last| booking.end > last.end)
            {
                summary.last_booking = Some(booking);
            }
        } else if booking.start > now
            && summary
                .next_booking
                .as_ref()
                .is_none_or(|next| booking.start < next.start)
        {
            summary.next_booking = Some(booking);
        }
    }
    summary
}

/// ユーザーがアイテムにレビュー（コメント）できるか
///
/// 承認済みで終了した予約があるときのみtrue。
#[tracing::instrument(skip(deps))]
pub async fn can_review_item(
    deps: &ServiceDependencies,
    user_id: UserId,
    item_id: ItemId,
) -> Result<bool> {
    deps.booking_store
        .has_finished_booking(user_id, item_id, deps.clock.now())
        .await
        .map_err(BookingApplicationError::store)
}
