#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use rusty_shareit_ddd::adapters::mock::{
    FixedClock, InMemoryBookingStore, ItemCatalog as MockItemCatalog,
    UserDirectory as MockUserDirectory,
};
use rusty_shareit_ddd::adapters::postgres;
use rusty_shareit_ddd::application::booking::ServiceDependencies;
use rusty_shareit_ddd::config::{AppConfig, BookingConfig};
use rusty_shareit_ddd::domain::value_objects::{ItemId, UserId};
use sqlx::PgPool;
use std::sync::{Arc, Once};

static TRACING: Once = Once::new();

/// テスト用のトレーシングを初期化（RUST_LOGで出力を制御）
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// テストの基準時刻
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
}

/// インメモリアダプタで組み立てたテスト環境
pub struct Fixture {
    pub deps: ServiceDependencies,
    pub store: Arc<InMemoryBookingStore>,
    pub catalog: Arc<MockItemCatalog>,
    pub users: Arc<MockUserDirectory>,
    pub clock: Arc<FixedClock>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(BookingConfig::default())
    }

    pub fn with_config(config: BookingConfig) -> Self {
        init_tracing();

        let store = Arc::new(InMemoryBookingStore::new());
        let catalog = Arc::new(MockItemCatalog::new());
        let users = Arc::new(MockUserDirectory::new());
        let clock = Arc::new(FixedClock::new(base_time()));

        let deps = ServiceDependencies {
            booking_store: store.clone(),
            item_catalog: catalog.clone(),
            user_directory: users.clone(),
            clock: clock.clone(),
            config,
        };

        Self {
            deps,
            store,
            catalog,
            users,
            clock,
        }
    }

    /// 所有者と予約可能なアイテムを登録する
    pub fn owner_with_item(&self, name: &str) -> (UserId, ItemId) {
        let owner = self.users.add_user();
        let item = self.catalog.add_item(owner, name);
        (owner, item)
    }

    pub fn at(&self, hours: i64) -> DateTime<Utc> {
        base_time() + Duration::hours(hours)
    }
}

/// テスト用データベースプールを作成し、マイグレーションを実行
///
/// 本番と同じく環境変数から設定を読み、adapters::postgres::connect で接続する。
pub async fn create_test_pool() -> PgPool {
    let config = AppConfig::from_env().expect("Invalid database configuration");

    postgres::connect(&config)
        .await
        .expect("Failed to connect to test database")
}
