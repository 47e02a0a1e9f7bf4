//! PostgreSQLアダプタのテスト
//!
//! DATABASE_URLのデータベースが必要なため `cargo test -- --ignored` で実行する。

mod common;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rusty_shareit_ddd::adapters::postgres::PostgresBookingStore;
use rusty_shareit_ddd::domain::value_objects::{ItemId, UserId};
use rusty_shareit_ddd::domain::{Booking, BookingFilter, BookingState, NewBooking, Page};
use rusty_shareit_ddd::ports::{BookingStore, InsertOutcome, TransitionOutcome};
use sqlx::PgPool;

/// テストの基準時刻（PostgreSQLの精度で表現できる値にしておく）
fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 6, 1, 9, 0, 0).unwrap()
}

/// テストデータをクリーンアップ
async fn cleanup_item(pool: &PgPool, item_id: ItemId) {
    sqlx::query("DELETE FROM bookings WHERE item_id = $1")
        .bind(item_id.value())
        .execute(pool)
        .await
        .expect("Failed to cleanup test bookings");
}

fn new_booking(item_id: ItemId, owner: UserId, from_h: i64, to_h: i64) -> NewBooking {
    let base = base_time();
    NewBooking {
        item_id,
        item_owner_id: owner,
        booker_id: UserId::new(),
        start: base + Duration::hours(from_h),
        end: base + Duration::hours(to_h),
    }
}

async fn insert(store: &PostgresBookingStore, booking: NewBooking) -> Booking {
    match store.insert_waiting(booking).await.expect("Failed to insert") {
        InsertOutcome::Inserted(b) => b,
        other => panic!("expected insert, got {:?}", other),
    }
}

#[tokio::test]
#[ignore]
async fn test_insert_and_find_by_id() {
    let pool = common::create_test_pool().await;
    let store = PostgresBookingStore::new(pool.clone());
    let (item, owner) = (ItemId::new(), UserId::new());

    let draft = new_booking(item, owner, 1, 2);
    let saved = insert(&store, draft.clone()).await;

    assert_eq!(saved.status, BookingState::Waiting);
    assert_eq!(saved.start, draft.start);
    assert_eq!(saved.end, draft.end);
    assert_eq!(store.find_by_id(saved.id).await.unwrap(), Some(saved));

    cleanup_item(&pool, item).await;
}

#[tokio::test]
#[ignore]
async fn test_transition_and_overlap_guard() {
    let pool = common::create_test_pool().await;
    let store = PostgresBookingStore::new(pool.clone());
    let (item, owner) = (ItemId::new(), UserId::new());

    let first = insert(&store, new_booking(item, owner, 1, 4)).await;
    let second = insert(&store, new_booking(item, owner, 2, 3)).await;

    let outcome = store
        .transition_from_waiting(first.id, BookingState::Approved)
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        TransitionOutcome::Transitioned(ref b) if b.status == BookingState::Approved
    ));

    let outcome = store
        .transition_from_waiting(second.id, BookingState::Approved)
        .await
        .unwrap();
    assert!(matches!(outcome, TransitionOutcome::Overlapping(ref o) if o[0].id == first.id));

    let outcome = store
        .transition_from_waiting(first.id, BookingState::Rejected)
        .await
        .unwrap();
    assert_eq!(outcome, TransitionOutcome::NotWaiting(BookingState::Approved));

    let outcome = store
        .insert_waiting(new_booking(item, owner, 2, 5))
        .await
        .unwrap();
    assert!(matches!(outcome, InsertOutcome::Blocked(_)));

    cleanup_item(&pool, item).await;
}

#[tokio::test]
#[ignore]
async fn test_concurrent_approvals_exactly_one_wins() {
    let pool = common::create_test_pool().await;
    let store = PostgresBookingStore::new(pool.clone());
    let (item, owner) = (ItemId::new(), UserId::new());
    let booking = insert(&store, new_booking(item, owner, 1, 2)).await;

    let (a, b) = futures::join!(
        store.transition_from_waiting(booking.id, BookingState::Approved),
        store.transition_from_waiting(booking.id, BookingState::Approved)
    );

    let outcomes = [a.unwrap(), b.unwrap()];
    let transitioned = outcomes
        .iter()
        .filter(|o| matches!(o, TransitionOutcome::Transitioned(_)))
        .count();
    assert_eq!(transitioned, 1);

    cleanup_item(&pool, item).await;
}

#[tokio::test]
#[ignore]
async fn test_list_filters_and_ordering() {
    let pool = common::create_test_pool().await;
    let store = PostgresBookingStore::new(pool.clone());
    let (item, owner) = (ItemId::new(), UserId::new());

    let early = insert(&store, new_booking(item, owner, 1, 2)).await;
    let tie_1 = insert(&store, new_booking(item, owner, 5, 6)).await;
    let tie_2 = insert(&store, new_booking(item, owner, 5, 7)).await;
    store
        .transition_from_waiting(early.id, BookingState::Approved)
        .await
        .unwrap();

    let all = store
        .list_by_owner(owner, &BookingFilter::Any, Page::new(0, 10).unwrap())
        .await
        .unwrap();
    let ids: Vec<_> = all.iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![tie_1.id, tie_2.id, early.id]);

    let waiting = store
        .list_by_owner(
            owner,
            &BookingFilter::Status(BookingState::Waiting),
            Page::new(1, 10).unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(waiting.len(), 1);
    assert_eq!(waiting[0].id, tie_2.id);

    let active = store
        .list_by_owner(
            owner,
            &BookingFilter::ActiveAt(early.start),
            Page::new(0, 10).unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, early.id);

    let for_item = store.list_for_item(item, owner).await.unwrap();
    assert_eq!(for_item.first().map(|b| b.id), Some(early.id));
    assert!(store.list_for_item(item, UserId::new()).await.unwrap().is_empty());

    assert!(
        store
            .has_finished_booking(early.booker_id, item, early.end + Duration::seconds(1))
            .await
            .unwrap()
    );

    cleanup_item(&pool, item).await;
}
