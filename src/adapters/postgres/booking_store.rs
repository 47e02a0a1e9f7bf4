use crate::domain::{
    Booking, BookingFilter, BookingId, BookingState, ItemId, NewBooking, Page, UserId,
};
use crate::ports::booking_store::{
    BookingStore as BookingStoreTrait, InsertOutcome, Result, TransitionOutcome,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};
use std::str::FromStr;

const BOOKING_COLUMNS: &str =
    "id, item_id, item_owner_id, booker_id, start_date, end_date, status";

/// 承認済み予約の期間重複を禁止する排他制約違反
const EXCLUSION_VIOLATION: &str = "23P01";

/// PostgreSQLの行データをBookingに変換する
fn map_row_to_booking(row: &PgRow) -> Result<Booking> {
    let status_str: &str = row.get("status");
    let status = BookingState::from_str(status_str).map_err(|e| {
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            e.to_string(),
        )) as Box<dyn std::error::Error + Send + Sync>
    })?;

    Ok(Booking {
        id: BookingId::new(row.get("id")),
        item_id: ItemId::from_uuid(row.get("item_id")),
        item_owner_id: UserId::from_uuid(row.get("item_owner_id")),
        booker_id: UserId::from_uuid(row.get("booker_id")),
        start: row.get("start_date"),
        end: row.get("end_date"),
        status,
    })
}

fn is_exclusion_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if db.code().as_deref() == Some(EXCLUSION_VIOLATION)
    )
}

/// トランザクション終了まで、アイテム単位の書き込みを直列化する
async fn lock_item(conn: &mut PgConnection, item_id: ItemId) -> Result<()> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind(item_id.value().to_string())
        .execute(conn)
        .await?;
    Ok(())
}

/// 一覧クエリに絞り込み条件を追加する
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &BookingFilter) {
    match *filter {
        BookingFilter::Any => {}
        BookingFilter::StartsAfter(t) => {
            builder.push(" AND start_date > ").push_bind(t);
        }
        BookingFilter::ActiveAt(t) => {
            builder
                .push(" AND start_date <= ")
                .push_bind(t)
                .push(" AND end_date > ")
                .push_bind(t);
        }
        BookingFilter::EndedBefore(t) => {
            builder.push(" AND end_date < ").push_bind(t);
        }
        BookingFilter::Status(status) => {
            builder.push(" AND status = ").push_bind(status.as_str());
        }
    }
}

/// BookingStoreのPostgreSQL実装
///
/// 書き込みはトランザクション内でアイテム単位のアドバイザリロックを取得して行う。
/// 承認済み予約同士の重複はテーブルの排他制約でも防ぐ。
pub struct BookingStore {
    pool: PgPool,
}

impl BookingStore {
    /// PostgreSQLコネクションプールから新しいBookingStoreを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn approved_overlapping(
        conn: &mut PgConnection,
        booking: &Booking,
    ) -> Result<Vec<Booking>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {BOOKING_COLUMNS}
            FROM bookings
            WHERE item_id = $1
              AND status = 'APPROVED'
              AND id <> $2
              AND start_date < $3
              AND end_date > $4
            ORDER BY start_date ASC
            "#
        ))
        .bind(booking.item_id.value())
        .bind(booking.id.value())
        .bind(booking.end)
        .bind(booking.start)
        .fetch_all(conn)
        .await?;

        rows.iter().map(map_row_to_booking).collect()
    }

    async fn list_by(
        &self,
        column: &'static str,
        user_id: UserId,
        filter: &BookingFilter,
        page: Page,
    ) -> Result<Vec<Booking>> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE {column} = "
        ));
        builder.push_bind(user_id.value());
        push_filter(&mut builder, filter);
        builder
            .push(" ORDER BY start_date DESC, id ASC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(map_row_to_booking).collect()
    }
}

#[async_trait]
impl BookingStoreTrait for BookingStore {
    /// 承認済み予約の確認と挿入を同じトランザクションで行う
    async fn insert_waiting(&self, booking: NewBooking) -> Result<InsertOutcome> {
        let mut tx = self.pool.begin().await?;
        lock_item(&mut tx, booking.item_id).await?;

        let rows = sqlx::query(&format!(
            r#"
            SELECT {BOOKING_COLUMNS}
            FROM bookings
            WHERE item_id = $1 AND status = 'APPROVED' AND end_date > $2
            ORDER BY start_date ASC
            "#
        ))
        .bind(booking.item_id.value())
        .bind(booking.start)
        .fetch_all(&mut *tx)
        .await?;

        if !rows.is_empty() {
            let blocking = rows
                .iter()
                .map(map_row_to_booking)
                .collect::<Result<Vec<_>>>()?;
            tx.rollback().await?;
            return Ok(InsertOutcome::Blocked(blocking));
        }

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO bookings (item_id, item_owner_id, booker_id, start_date, end_date, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(booking.item_id.value())
        .bind(booking.item_owner_id.value())
        .bind(booking.booker_id.value())
        .bind(booking.start)
        .bind(booking.end)
        .bind(BookingState::Waiting.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let saved = map_row_to_booking(&row)?;
        tx.commit().await?;
        Ok(InsertOutcome::Inserted(saved))
    }

    async fn find_by_id(&self, id: BookingId) -> Result<Option<Booking>> {
        let row = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_booking).transpose()
    }

    async fn find_approved_ending_after(
        &self,
        item_id: ItemId,
        after: DateTime<Utc>,
    ) -> Result<Vec<Booking>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {BOOKING_COLUMNS}
            FROM bookings
            WHERE item_id = $1 AND status = 'APPROVED' AND end_date > $2
            ORDER BY start_date ASC
            "#
        ))
        .bind(item_id.value())
        .bind(after)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_booking).collect()
    }

    /// 行ロックで現在のステータスを確定させてから遷移する
    ///
    /// 承認時はアイテムのロックも取得し、重なる承認済み予約がないことを確認する。
    async fn transition_from_waiting(
        &self,
        id: BookingId,
        to: BookingState,
    ) -> Result<TransitionOutcome> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.value())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(current) = row.as_ref().map(map_row_to_booking).transpose()? else {
            tx.rollback().await?;
            return Ok(TransitionOutcome::Missing);
        };
        if !current.status.is_waiting() {
            tx.rollback().await?;
            return Ok(TransitionOutcome::NotWaiting(current.status));
        }

        if to == BookingState::Approved {
            lock_item(&mut tx, current.item_id).await?;
            let overlapping = Self::approved_overlapping(&mut tx, &current).await?;
            if !overlapping.is_empty() {
                tx.rollback().await?;
                return Ok(TransitionOutcome::Overlapping(overlapping));
            }
        }

        let updated = sqlx::query(&format!(
            r#"
            UPDATE bookings
            SET status = $2
            WHERE id = $1 AND status = 'WAITING'
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(id.value())
        .bind(to.as_str())
        .fetch_optional(&mut *tx)
        .await;

        let row = match updated {
            Ok(row) => row,
            Err(e) if is_exclusion_violation(&e) => {
                tracing::warn!(booking_id = %id, "Exclusion constraint rejected approval");
                drop(tx);
                let mut conn = self.pool.acquire().await?;
                let overlapping = Self::approved_overlapping(&mut conn, &current).await?;
                return Ok(TransitionOutcome::Overlapping(overlapping));
            }
            Err(e) => return Err(e.into()),
        };

        match row {
            Some(row) => {
                let booking = map_row_to_booking(&row)?;
                tx.commit().await?;
                Ok(TransitionOutcome::Transitioned(booking))
            }
            // 行ロック中のため通常は到達しない
            None => {
                tx.rollback().await?;
                Ok(TransitionOutcome::NotWaiting(current.status))
            }
        }
    }

    async fn list_by_booker(
        &self,
        booker_id: UserId,
        filter: &BookingFilter,
        page: Page,
    ) -> Result<Vec<Booking>> {
        self.list_by("booker_id", booker_id, filter, page).await
    }

    async fn list_by_owner(
        &self,
        owner_id: UserId,
        filter: &BookingFilter,
        page: Page,
    ) -> Result<Vec<Booking>> {
        self.list_by("item_owner_id", owner_id, filter, page).await
    }

    async fn list_for_item(&self, item_id: ItemId, owner_id: UserId) -> Result<Vec<Booking>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {BOOKING_COLUMNS}
            FROM bookings
            WHERE item_id = $1 AND item_owner_id = $2
            ORDER BY start_date ASC, id ASC
            "#
        ))
        .bind(item_id.value())
        .bind(owner_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_booking).collect()
    }

    async fn has_finished_booking(
        &self,
        booker_id: UserId,
        item_id: ItemId,
        before: DateTime<Utc>,
    ) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM bookings
                WHERE booker_id = $1
                  AND item_id = $2
                  AND status = 'APPROVED'
                  AND end_date < $3
            )
            "#,
        )
        .bind(booker_id.value())
        .bind(item_id.value())
        .bind(before)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
