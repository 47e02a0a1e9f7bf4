//! ShareIt予約エンジン
//!
//! アイテム貸し借りサービスの予約（Booking）の作成・承認・参照を扱う。
//! ドメイン層は純粋関数、アプリケーション層はポート経由で外部に依存する。

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
