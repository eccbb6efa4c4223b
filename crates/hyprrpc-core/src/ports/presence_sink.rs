//! PresenceSink port - presence 表示への狭いインターフェース
//!
//! payload の組み立てと送信は実装側（CLI など）の責務です。
//! プロセス全体の static ではなく、entry point が所有して注入します。

use std::time::Duration;

use crate::domain::App;

pub trait PresenceSink: Send + Sync {
    /// 現在選択中のアプリを設定（`None` で presence を無効化）
    fn select(&self, app: Option<&App>, uptime: Option<Duration>);

    /// 選択中のアプリの状態を再送
    fn push_update(&self);
}
