//! SnapshotSource port - 観測中のアプリ一覧の取得
//!
//! 外部 CLI（`hyprctl -j clients`）のデコードはこの trait の実装側の責務です。
//!
//! # 実装
//! - **HyprctlSource**: 本番用（`impls::hyprctl`）
//! - **MemorySource**: テスト用（`impls::memory`）

use async_trait::async_trait;

use crate::domain::Snapshot;
use crate::error::PresenceError;

/// SnapshotSource は 1 回の呼び出しで完全な snapshot を返す
///
/// # 設計原則
/// - 失敗しうる（`Io` / `Decode` / `Source`）
/// - 呼び出し時間は有界であることを前提にする（実装側で timeout を持つ）
/// - 返り値は前回の snapshot を完全に置き換える（差分ではない）
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn read_snapshot(&self) -> Result<Snapshot, PresenceError>;
}
