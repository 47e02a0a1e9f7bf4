use chrono::{DateTime, Utc};
use std::str::FromStr;

use super::{Booking, BookingState, UnknownState};

/// 予約一覧の絞り込み指定
///
/// 時間区分（All/Future/Current/Past）かステータスのどちらか。
/// 境界で一度だけパースし、以降は網羅的なmatchで扱う。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookingBucket {
    #[default]
    All,
    Future,
    Current,
    Past,
    Status(BookingState),
}

impl BookingBucket {
    /// 現在時刻を基準に具体的な絞り込み条件へ解決する
    pub fn resolve(self, now: DateTime<Utc>) -> BookingFilter {
        match self {
            BookingBucket::All => BookingFilter::Any,
            BookingBucket::Future => BookingFilter::StartsAfter(now),
            BookingBucket::Current => BookingFilter::ActiveAt(now),
            BookingBucket::Past => BookingFilter::EndedBefore(now),
            BookingBucket::Status(status) => BookingFilter::Status(status),
        }
    }
}

impl FromStr for BookingBucket {
    type Err = UnknownState;

    /// All → Future → Current → Past の順に照合し、最後にステータスとして解釈する
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const TIME_BUCKETS: [(&str, BookingBucket); 4] = [
            ("ALL", BookingBucket::All),
            ("FUTURE", BookingBucket::Future),
            ("CURRENT", BookingBucket::Current),
            ("PAST", BookingBucket::Past),
        ];

        if let Some((_, bucket)) = TIME_BUCKETS.iter().find(|(name, _)| *name == s) {
            return Ok(*bucket);
        }

        s.parse::<BookingState>().map(BookingBucket::Status)
    }
}

/// ストアに渡す絞り込み条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingFilter {
    /// 条件なし
    Any,
    /// start > t
    StartsAfter(DateTime<Utc>),
    /// start <= t < end
    ActiveAt(DateTime<Utc>),
    /// end < t
    EndedBefore(DateTime<Utc>),
    /// status == s
    Status(BookingState),
}

impl BookingFilter {
    pub fn matches(&self, booking: &Booking) -> bool {
        match *self {
            BookingFilter::Any => true,
            BookingFilter::StartsAfter(t) => booking.start > t,
            BookingFilter::ActiveAt(t) => booking.start <= t && t < booking.end,
            BookingFilter::EndedBefore(t) => booking.end < t,
            BookingFilter::Status(status) => booking.status == status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BookingId, ItemId, NewBooking, UserId};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    fn booking_between(start: DateTime<Utc>, end: DateTime<Utc>) -> Booking {
        NewBooking {
            item_id: ItemId::new(),
            item_owner_id: UserId::new(),
            booker_id: UserId::new(),
            start,
            end,
        }
        .into_waiting(BookingId::new(1))
    }

    fn buckets_matching(booking: &Booking) -> Vec<BookingBucket> {
        [
            BookingBucket::All,
            BookingBucket::Future,
            BookingBucket::Current,
            BookingBucket::Past,
        ]
        .into_iter()
        .filter(|bucket| bucket.resolve(now()).matches(booking))
        .collect()
    }

    #[test]
    fn test_parse_time_buckets() {
        assert_eq!("ALL".parse::<BookingBucket>(), Ok(BookingBucket::All));
        assert_eq!("FUTURE".parse::<BookingBucket>(), Ok(BookingBucket::Future));
        assert_eq!("CURRENT".parse::<BookingBucket>(), Ok(BookingBucket::Current));
        assert_eq!("PAST".parse::<BookingBucket>(), Ok(BookingBucket::Past));
    }

    #[test]
    fn test_parse_rejects_non_canonical_case() {
        for input in ["all", "Future", "current", "waiting", "Rejected"] {
            assert_eq!(
                input.parse::<BookingBucket>(),
                Err(UnknownState(input.to_string()))
            );
        }
    }

    #[test]
    fn test_parse_falls_back_to_status() {
        assert_eq!(
            "WAITING".parse::<BookingBucket>(),
            Ok(BookingBucket::Status(BookingState::Waiting))
        );
        assert_eq!(
            "REJECTED".parse::<BookingBucket>(),
            Ok(BookingBucket::Status(BookingState::Rejected))
        );
    }

    #[test]
    fn test_parse_unknown() {
        let err = "Bogus".parse::<BookingBucket>().unwrap_err();
        assert_eq!(err, UnknownState("Bogus".to_string()));
        assert_eq!(err.to_string(), "Unknown state: Bogus");
    }

    #[test]
    fn test_past_booking_only_in_past() {
        let b = booking_between(now() - Duration::hours(2), now() - Duration::hours(1));
        assert_eq!(
            buckets_matching(&b),
            vec![BookingBucket::All, BookingBucket::Past]
        );
    }

    #[test]
    fn test_in_progress_booking_only_in_current() {
        let b = booking_between(
            now() - Duration::minutes(30),
            now() + Duration::minutes(30),
        );
        assert_eq!(
            buckets_matching(&b),
            vec![BookingBucket::All, BookingBucket::Current]
        );
    }

    #[test]
    fn test_booking_starting_now_is_current() {
        let b = booking_between(now(), now() + Duration::hours(1));
        assert_eq!(
            buckets_matching(&b),
            vec![BookingBucket::All, BookingBucket::Current]
        );
    }

    #[test]
    fn test_future_booking_only_in_future() {
        let b = booking_between(now() + Duration::hours(1), now() + Duration::hours(2));
        assert_eq!(
            buckets_matching(&b),
            vec![BookingBucket::All, BookingBucket::Future]
        );
    }

    #[test]
    fn test_status_filter() {
        let b = booking_between(now() + Duration::hours(1), now() + Duration::hours(2));
        assert!(BookingBucket::Status(BookingState::Waiting)
            .resolve(now())
            .matches(&b));
        assert!(!BookingBucket::Status(BookingState::Approved)
            .resolve(now())
            .matches(&b));
    }
}
