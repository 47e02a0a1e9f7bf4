use chrono::{DateTime, Utc};

/// 時刻ポート
///
/// 時間区分の解決や期間のバリデーションで「現在」を決める。
/// テストでは固定時刻を注入する。
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// システム時計
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
