//! Events - ライフサイクルイベント
//!
//! `EventKind` は購読のキー、`LifecycleEvent` は実際に配送される値です。
//! 各 variant は自分の payload を持ちます。

use std::fmt;

use super::address::Address;
use super::app::App;

/// EventKind は handler を登録するときのキー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    /// 新しいアプリが cache に登録された
    ApplicationIn,
    /// sweep で 1 つ以上のアプリが purge された
    ApplicationOut,
    /// アプリが初めて liveness check に失敗した
    Endangered,
    /// 定期 refresh が終わった
    Update,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::ApplicationIn,
        EventKind::ApplicationOut,
        EventKind::Endangered,
        EventKind::Update,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ApplicationIn => "APPLICATION_IN",
            EventKind::ApplicationOut => "APPLICATION_OUT",
            EventKind::Endangered => "ENDANGERED",
            EventKind::Update => "UPDATE",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// LifecycleEvent は EventBus で配送されるイベント
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    ApplicationIn { app: App },

    /// One event per sweep, carrying every app purged in it.
    ApplicationOut { purged: Vec<App> },

    Endangered { app: App, remaining: i32 },

    Update {
        refreshed: usize,
        /// Addresses that were missing from the refresh snapshot.
        stale: Vec<Address>,
    },
}

impl LifecycleEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            LifecycleEvent::ApplicationIn { .. } => EventKind::ApplicationIn,
            LifecycleEvent::ApplicationOut { .. } => EventKind::ApplicationOut,
            LifecycleEvent::Endangered { .. } => EventKind::Endangered,
            LifecycleEvent::Update { .. } => EventKind::Update,
        }
    }
}
