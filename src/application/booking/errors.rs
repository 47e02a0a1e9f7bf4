use thiserror::Error;

use crate::domain::{IntervalError, PaginationError, UnknownState};

/// 予約管理アプリケーション層のエラー
///
/// NotFoundは「存在しない」と「見る権限がない」の両方を表す（存在の漏洩を防ぐため）。
#[derive(Debug, Error)]
pub enum BookingApplicationError {
    /// アイテム・ユーザー・予約が存在しない、またはアクセスできない
    #[error("{0}")]
    NotFound(String),

    /// アイテムが予約不可
    #[error("{0}")]
    Unavailable(String),

    /// 予約期間が不正
    #[error("{0}")]
    InvalidRequest(String),

    /// 承認済み予約と重なる
    #[error("{0}")]
    Conflict(String),

    /// 不正な状態遷移（Waiting以外の承認、所有者以外の承認）
    #[error("{0}")]
    InvalidStateTransition(String),

    /// 解釈できない状態フィルタ
    #[error("Unknown state: {0}")]
    UnknownState(String),

    /// 不正なページ指定
    #[error("{0}")]
    InvalidPagination(String),

    /// BookingStoreのエラー
    #[error("Booking store error")]
    BookingStoreError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// ItemCatalogのエラー
    #[error("Item catalog error")]
    ItemCatalogError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// UserDirectoryのエラー
    #[error("User directory error")]
    UserDirectoryError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<IntervalError> for BookingApplicationError {
    fn from(err: IntervalError) -> Self {
        BookingApplicationError::InvalidRequest(err.to_string())
    }
}

impl From<PaginationError> for BookingApplicationError {
    fn from(err: PaginationError) -> Self {
        BookingApplicationError::InvalidPagination(err.to_string())
    }
}

impl From<UnknownState> for BookingApplicationError {
    fn from(err: UnknownState) -> Self {
        BookingApplicationError::UnknownState(err.0)
    }
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

impl BookingApplicationError {
    /// インフラ層のエラーは詳細をログに記録してからラップする
    pub(super) fn store(err: BoxError) -> Self {
        tracing::error!(error = %err, "Booking store error");
        BookingApplicationError::BookingStoreError(err)
    }

    pub(super) fn catalog(err: BoxError) -> Self {
        tracing::error!(error = %err, "Item catalog error");
        BookingApplicationError::ItemCatalogError(err)
    }

    pub(super) fn directory(err: BoxError) -> Self {
        tracing::error!(error = %err, "User directory error");
        BookingApplicationError::UserDirectoryError(err)
    }
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, BookingApplicationError>;
