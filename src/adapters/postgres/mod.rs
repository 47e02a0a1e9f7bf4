pub mod booking_store;

// パブリックに型を再エクスポート
pub use booking_store::BookingStore as PostgresBookingStore;

use crate::config::AppConfig;
use sqlx::{PgPool, postgres::PgPoolOptions};

/// 設定からコネクションプールを作成し、マイグレーションを適用する
pub async fn connect(config: &AppConfig) -> Result<PgPool, sqlx::Error> {
    tracing::info!(
        max_connections = config.max_connections,
        "Connecting to booking database"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}
