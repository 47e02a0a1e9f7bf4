use crate::domain::{Booking, UserId};

use super::errors::BookingApplicationError;

/// 予約を閲覧できるか（予約者またはアイテム所有者）
pub(super) fn authorize(viewer_id: UserId, booking: &Booking) -> bool {
    viewer_id == booking.booker_id || viewer_id == booking.item_owner_id
}

/// アクセス拒否のエラーを作る
///
/// 現状は存在しない場合と同じNotFoundで返す。
/// 拒否専用の種別に分ける場合はここだけを変更する。
pub(super) fn access_denied(message: impl Into<String>) -> BookingApplicationError {
    BookingApplicationError::NotFound(message.into())
}
