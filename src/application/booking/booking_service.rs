use crate::config::BookingConfig;
use crate::domain::{self, Booking, BookingId, NewBooking, UserId, commands::*};
use crate::ports::*;
use std::sync::Arc;

use super::access::{access_denied, authorize};
use super::errors::{BookingApplicationError, Result};

/// サービスの依存関係
///
/// 関数型DDDの原則に従い、データ構造として定義。
/// 振る舞いは持たず、各操作（純粋な関数）に依存関係を渡す。
/// 予約エンジン自体はキャッシュを持たず、毎回ストアから読み直す。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub booking_store: Arc<dyn BookingStore>,
    pub item_catalog: Arc<dyn ItemCatalog>,
    pub user_directory: Arc<dyn UserDirectory>,
    pub clock: Arc<dyn Clock>,
    pub config: BookingConfig,
}

/// ストアから予約を読み込むヘルパー関数
///
/// approve_booking, get_bookingで共通利用される。
///
/// # エラー
/// - BookingStoreError: 読み込み失敗
/// - NotFound: 予約が存在しない
pub(super) async fn load_booking(
    booking_store: &Arc<dyn BookingStore>,
    booking_id: BookingId,
) -> Result<Booking> {
    booking_store
        .find_by_id(booking_id)
        .await
        .map_err(BookingApplicationError::store)?
        .ok_or_else(|| {
            BookingApplicationError::NotFound(format!("Booking {} not found", booking_id))
        })
}

/// ユーザーの存在確認ヘルパー関数
pub(super) async fn ensure_user_exists(
    user_directory: &Arc<dyn UserDirectory>,
    user_id: UserId,
) -> Result<()> {
    let exists = user_directory
        .exists(user_id)
        .await
        .map_err(BookingApplicationError::directory)?;

    if !exists {
        return Err(BookingApplicationError::NotFound(format!(
            "User {} not found",
            user_id
        )));
    }
    Ok(())
}

/// アイテムを予約する
///
/// ビジネスルール（この順で検証する）：
/// 1. アイテムが存在すること
/// 2. アイテムが予約可能であること
/// 3. 予約者がアイテム所有者でないこと
/// 4. 予約者が存在すること
/// 5. 予約期間が正しいこと
/// 6. 開始日時より後に終わる承認済み予約がないこと
///
/// # 一貫性保証
///
/// 6の確認と保存はストア側でアイテム単位にアトミックに再実行される。
/// 並行した予約の間で確認をすり抜けた場合もConflictになる。
///
/// # 戻り値
/// 成功時はWaiting状態で保存された予約
#[tracing::instrument(skip(deps), fields(item_id = %cmd.item_id, booker_id = %cmd.booker_id))]
pub async fn create_booking(deps: &ServiceDependencies, cmd: CreateBooking) -> Result<Booking> {
    // 1. アイテムの存在確認
    let item = deps
        .item_catalog
        .get(cmd.item_id)
        .await
        .map_err(BookingApplicationError::catalog)?
        .ok_or_else(|| {
            BookingApplicationError::NotFound(format!("Item {} not found", cmd.item_id))
        })?;

    // 2. 予約可能か
    if !item.available {
        return Err(BookingApplicationError::Unavailable(format!(
            "Item {} is not available for booking",
            item.item_id
        )));
    }

    // 3. 所有者による予約は不可
    if item.owner_id == cmd.booker_id {
        tracing::warn!("Owner tried to book own item");
        return Err(access_denied(format!(
            "Item {} cannot be booked by its owner",
            item.item_id
        )));
    }

    // 4. 予約者の存在確認
    ensure_user_exists(&deps.user_directory, cmd.booker_id).await?;

    // 5. 期間のバリデーション（ドメイン層の純粋関数）
    let (start, end) = domain::booking::validate_interval(cmd.start, cmd.end, deps.clock.now())?;

    // 6. 承認済み予約との競合確認
    let blocking = deps
        .booking_store
        .find_approved_ending_after(item.item_id, start)
        .await
        .map_err(BookingApplicationError::store)?;

    if !blocking.is_empty() {
        tracing::warn!(blocking = blocking.len(), "Booking overlaps approved bookings");
        return Err(unavailable_for_period(&item.name));
    }

    // 7. 保存
    let new_booking = NewBooking {
        item_id: item.item_id,
        item_owner_id: item.owner_id,
        booker_id: cmd.booker_id,
        start,
        end,
    };

    match deps
        .booking_store
        .insert_waiting(new_booking)
        .await
        .map_err(BookingApplicationError::store)?
    {
        InsertOutcome::Inserted(booking) => {
            tracing::info!(booking_id = %booking.id, "Booking created");
            Ok(booking)
        }
        InsertOutcome::Blocked(_) => {
            tracing::warn!("Booking blocked by a concurrently approved booking");
            Err(unavailable_for_period(&item.name))
        }
    }
}

fn unavailable_for_period(item_name: &str) -> BookingApplicationError {
    BookingApplicationError::Conflict(format!(
        "Item {} is already booked for the requested period",
        item_name
    ))
}

/// 予約を承認または却下する
///
/// ビジネスルール：
/// - 予約が存在すること
/// - 予約者自身は操作できない（NotFoundとして扱う）
/// - アイテム所有者のみ、Waiting状態の予約に対してのみ操作できる
/// - 承認する場合、同じアイテムの承認済み予約と期間が重ならないこと
///
/// # 一貫性保証
///
/// ステータス更新はWaitingからのcompare-and-swap。
/// 同じ予約への同時承認はちょうど1つだけが成功する。
#[tracing::instrument(skip(deps), fields(booking_id = %cmd.booking_id, approved = cmd.approved))]
pub async fn approve_booking(deps: &ServiceDependencies, cmd: ApproveBooking) -> Result<Booking> {
    // 1. 予約の読み込み
    let booking = load_booking(&deps.booking_store, cmd.booking_id).await?;

    // 2. 予約者自身による承認は不可
    if booking.booker_id == cmd.acting_user_id {
        tracing::warn!("Booker tried to change own booking status");
        return Err(access_denied(format!(
            "No booking available for update by user {}",
            cmd.acting_user_id
        )));
    }

    // 3. 状態遷移の判定（ドメイン層の純粋関数）
    let next = domain::booking::decide(&booking, cmd.acting_user_id, cmd.approved)
        .map_err(|e| BookingApplicationError::InvalidStateTransition(e.to_string()))?;

    // 4. compare-and-swapで保存
    let outcome = deps
        .booking_store
        .transition_from_waiting(booking.id, next)
        .await
        .map_err(BookingApplicationError::store)?;

    match outcome {
        TransitionOutcome::Transitioned(updated) => {
            tracing::info!(status = %updated.status, "Booking status changed");
            Ok(updated)
        }
        TransitionOutcome::NotWaiting(current) => {
            tracing::warn!(status = %current, "Booking was resolved concurrently");
            Err(BookingApplicationError::InvalidStateTransition(format!(
                "Booking status cannot be changed from {}",
                current
            )))
        }
        TransitionOutcome::Overlapping(approved) => {
            tracing::warn!(overlapping = approved.len(), "Approval overlaps approved bookings");
            Err(BookingApplicationError::Conflict(format!(
                "Booking {} overlaps an approved booking of the same item",
                booking.id
            )))
        }
        TransitionOutcome::Missing => Err(BookingApplicationError::NotFound(format!(
            "Booking {} not found",
            booking.id
        ))),
    }
}

/// 予約を取得する
///
/// 予約者とアイテム所有者のみ閲覧できる。それ以外はNotFound。
#[tracing::instrument(skip(deps))]
pub async fn get_booking(
    deps: &ServiceDependencies,
    booking_id: BookingId,
    viewer_id: UserId,
) -> Result<Booking> {
    let booking = load_booking(&deps.booking_store, booking_id).await?;

    if !authorize(viewer_id, &booking) {
        return Err(access_denied(format!(
            "No booking {} available for user {}",
            booking_id, viewer_id
        )));
    }

    Ok(booking)
}
