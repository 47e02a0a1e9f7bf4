//! 環境変数からの設定読み込み

use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/shareit";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_PAGE_SIZE: i64 = 10;

/// 設定値の解釈エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid value for {key}: {value:?}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
}

/// 予約エンジンの設定
///
/// ServiceDependencies 構築時に明示的に渡す。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingConfig {
    /// size未指定時の1ページあたりの件数
    pub default_page_size: i64,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// アプリケーション設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub booking: BookingConfig,
}

impl AppConfig {
    /// プロセスの環境変数から読み込む
    ///
    /// - DATABASE_URL
    /// - DATABASE_MAX_CONNECTIONS
    /// - BOOKING_DEFAULT_PAGE_SIZE
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意の参照関数から読み込む（未設定はデフォルト値）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(value) => value
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError {
                    key: "DATABASE_MAX_CONNECTIONS",
                    value,
                })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let default_page_size = match lookup("BOOKING_DEFAULT_PAGE_SIZE") {
            Some(value) => value
                .parse::<i64>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError {
                    key: "BOOKING_DEFAULT_PAGE_SIZE",
                    value,
                })?,
            None => DEFAULT_PAGE_SIZE,
        };

        Ok(Self {
            database_url,
            max_connections,
            booking: BookingConfig { default_page_size },
        })
    }
}
