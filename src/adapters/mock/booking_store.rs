use crate::domain::{
    Booking, BookingFilter, BookingId, BookingState, ItemId, NewBooking, Page, UserId,
};
use crate::ports::booking_store::{
    BookingStore as BookingStoreTrait, InsertOutcome, Result, TransitionOutcome,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct State {
    last_id: i64,
    // IDの昇順 = 挿入順
    bookings: BTreeMap<BookingId, Booking>,
}

impl State {
    fn approved_for_item(&self, item_id: ItemId) -> impl Iterator<Item = &Booking> {
        self.bookings
            .values()
            .filter(move |b| b.item_id == item_id && b.status == BookingState::Approved)
    }
}

/// インメモリBookingStore実装
///
/// 1つのMutexで全操作を直列化するため、確認と書き込みは常にアトミック。
pub struct InMemoryBookingStore {
    state: Mutex<State>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| "in-memory booking store lock poisoned".into())
    }

    /// テスト用に任意のステータスの予約を直接登録する
    ///
    /// 管理操作（Canceledへの変更など）の再現に使う。
    pub fn insert_with_status(&self, booking: NewBooking, status: BookingState) -> Result<Booking> {
        let mut state = self.lock()?;
        state.last_id += 1;
        let booking = Booking {
            status,
            ..booking.into_waiting(BookingId::new(state.last_id))
        };
        state.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    fn page<'a>(
        bookings: impl Iterator<Item = &'a Booking>,
        filter: &BookingFilter,
        page: Page,
    ) -> Vec<Booking> {
        let mut matching: Vec<Booking> = bookings
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        // 安定ソートなので同じstartはID昇順のまま残る
        matching.sort_by(|a, b| b.start.cmp(&a.start));

        let (skip, take) = page.bounds();
        matching.into_iter().skip(skip).take(take).collect()
    }
}

impl Default for InMemoryBookingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookingStoreTrait for InMemoryBookingStore {
    async fn insert_waiting(&self, booking: NewBooking) -> Result<InsertOutcome> {
        let mut state = self.lock()?;

        let blocking: Vec<Booking> = state
            .approved_for_item(booking.item_id)
            .filter(|b| b.end > booking.start)
            .cloned()
            .collect();
        if !blocking.is_empty() {
            return Ok(InsertOutcome::Blocked(blocking));
        }

        state.last_id += 1;
        let saved = booking.into_waiting(BookingId::new(state.last_id));
        state.bookings.insert(saved.id, saved.clone());
        Ok(InsertOutcome::Inserted(saved))
    }

    async fn find_by_id(&self, id: BookingId) -> Result<Option<Booking>> {
        Ok(self.lock()?.bookings.get(&id).cloned())
    }

    async fn find_approved_ending_after(
        &self,
        item_id: ItemId,
        after: DateTime<Utc>,
    ) -> Result<Vec<Booking>> {
        Ok(self
            .lock()?
            .approved_for_item(item_id)
            .filter(|b| b.end > after)
            .cloned()
            .collect())
    }

    async fn transition_from_waiting(
        &self,
        id: BookingId,
        to: BookingState,
    ) -> Result<TransitionOutcome> {
        let mut state = self.lock()?;

        let Some(current) = state.bookings.get(&id).cloned() else {
            return Ok(TransitionOutcome::Missing);
        };
        if !current.status.is_waiting() {
            return Ok(TransitionOutcome::NotWaiting(current.status));
        }

        if to == BookingState::Approved {
            let overlapping: Vec<Booking> = state
                .approved_for_item(current.item_id)
                .filter(|b| b.id != id && b.overlaps(current.start, current.end))
                .cloned()
                .collect();
            if !overlapping.is_empty() {
                return Ok(TransitionOutcome::Overlapping(overlapping));
            }
        }

        let updated = Booking {
            status: to,
            ..current
        };
        state.bookings.insert(id, updated.clone());
        Ok(TransitionOutcome::Transitioned(updated))
    }

    async fn list_by_booker(
        &self,
        booker_id: UserId,
        filter: &BookingFilter,
        page: Page,
    ) -> Result<Vec<Booking>> {
        let state = self.lock()?;
        Ok(Self::page(
            state.bookings.values().filter(|b| b.booker_id == booker_id),
            filter,
            page,
        ))
    }

    async fn list_by_owner(
        &self,
        owner_id: UserId,
        filter: &BookingFilter,
        page: Page,
    ) -> Result<Vec<Booking>> {
        let state = self.lock()?;
        Ok(Self::page(
            state
                .bookings
                .values()
                .filter(|b| b.item_owner_id == owner_id),
            filter,
            page,
        ))
    }

    async fn list_for_item(&self, item_id: ItemId, owner_id: UserId) -> Result<Vec<Booking>> {
        let state = self.lock()?;
        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| b.item_id == item_id && b.item_owner_id == owner_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| a.start.cmp(&b.start));
        Ok(bookings)
    }

    async fn has_finished_booking(
        &self,
        booker_id: UserId,
        item_id: ItemId,
        before: DateTime<Utc>,
    ) -> Result<bool> {
        Ok(self.lock()?.bookings.values().any(|b| {
            b.booker_id == booker_id
                && b.item_id == item_id
                && b.status == BookingState::Approved
                && b.end < before
        }))
    }
}
