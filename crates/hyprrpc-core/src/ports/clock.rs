//! Clock port - 時刻の抽象化
//!
//! # テスト容易性
//! - trait により時刻を差し替え可能
//! - テストでは `ManualClock` を使用

/// Clock は time ledger と App の登録日に使う時刻を提供
pub trait Clock: Send + Sync {
    /// 単調増加するミリ秒（起点は実装依存）
    fn monotonic_ms(&self) -> u64;

    /// Days since the Unix epoch (UTC).
    fn epoch_day(&self) -> i64;
}
