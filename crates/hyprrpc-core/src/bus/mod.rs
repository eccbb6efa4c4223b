//! EventBus - 型付き publish/subscribe
//!
//! # 学習ポイント
//! - HashMap<EventKind, Vec<...>> での型消去された trait object の管理
//! - JoinSet による structured concurrency（N 個 spawn して N 個 join する）
//! - handler ごとの失敗の隔離（Err も panic も JoinSet 側で受け止める）

pub mod handler;

pub use self::handler::{EventHandler, FnHandler};

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::domain::{EventKind, LifecycleEvent, SubscriptionId};

struct Subscription {
    id: SubscriptionId,
    handler: Arc<dyn EventHandler>,
}

/// Result of one `fire()` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FireReport {
    /// Handlers that returned `Ok`.
    pub handled: usize,
    /// Handlers that returned `Err` or panicked.
    pub failed: usize,
}

impl FireReport {
    pub fn total(&self) -> usize {
        self.handled + self.failed
    }
}

/// EventBus は EventKind ごとに handler を登録順で保持する
///
/// # 使用例
/// ```ignore
/// let bus = EventBus::new();
/// bus.connect_fn(EventKind::Update, |event| println!("{:?}", event));
/// let report = bus.fire(LifecycleEvent::Update { refreshed: 0, stale: vec![] }).await;
/// ```
///
/// `fire()` が返った時点で、対象の handler はすべて完了しています。
/// handler 同士の実行順序は保証しません。
#[derive(Default)]
pub struct EventBus {
    handlers: RwLock<HashMap<EventKind, Vec<Subscription>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    // handler の登録/削除だけが write lock を取る。panic した writer がいても
    // map 自体は壊れないので poison は無視して中身を使う
    fn read(&self) -> RwLockReadGuard<'_, HashMap<EventKind, Vec<Subscription>>> {
        self.handlers.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<EventKind, Vec<Subscription>>> {
        self.handlers.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn connect<H: EventHandler + 'static>(&self, kind: EventKind, handler: H) -> SubscriptionId {
        self.connect_arc(kind, Arc::new(handler))
    }

    pub fn connect_arc(&self, kind: EventKind, handler: Arc<dyn EventHandler>) -> SubscriptionId {
        let id = SubscriptionId::generate();
        self.write()
            .entry(kind)
            .or_default()
            .push(Subscription { id, handler });
        debug!(event = %kind, subscription = %id, "handler connected");
        id
    }

    pub fn connect_fn<F>(&self, kind: EventKind, f: F) -> SubscriptionId
    where
        F: Fn(&LifecycleEvent) + Send + Sync + 'static,
    {
        self.connect(kind, FnHandler::new(f))
    }

    /// Removes a handler. Returns `false` if the id is unknown.
    pub fn disconnect(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.write();
        for subscriptions in handlers.values_mut() {
            if let Some(index) = subscriptions.iter().position(|s| s.id == id) {
                subscriptions.remove(index);
                return true;
            }
        }
        false
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.read().get(&kind).map_or(0, Vec::len)
    }

    /// 対象 kind の handler を並行に実行し、全員の完了を待つ
    ///
    /// # フロー
    /// 1. read lock の中で handler の Arc だけを複製（await を跨いで lock を持たない）
    /// 2. handler ごとに JoinSet へ spawn
    /// 3. 全件 join して結果を集計（Err / panic はログに出して数えるだけ）
    pub async fn fire(&self, event: LifecycleEvent) -> FireReport {
        let kind = event.kind();
        let handlers: Vec<Arc<dyn EventHandler>> = self
            .read()
            .get(&kind)
            .map(|subs| subs.iter().map(|s| Arc::clone(&s.handler)).collect())
            .unwrap_or_default();

        let mut report = FireReport::default();
        if handlers.is_empty() {
            return report;
        }

        let event = Arc::new(event);
        let mut tasks = JoinSet::new();
        for handler in handlers {
            let event = Arc::clone(&event);
            tasks.spawn(async move { handler.handle(&event).await });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => report.handled += 1,
                Ok(Err(err)) => {
                    report.failed += 1;
                    warn!(event = %kind, error = %err, "event handler failed");
                }
                Err(join_err) if join_err.is_panic() => {
                    report.failed += 1;
                    warn!(event = %kind, "event handler panicked");
                }
                Err(join_err) => {
                    report.failed += 1;
                    warn!(event = %kind, error = %join_err, "event handler was cancelled");
                }
            }
        }

        debug!(event = %kind, handled = report.handled, failed = report.failed, "event fired");
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PresenceError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn update_event() -> LifecycleEvent {
        LifecycleEvent::Update {
            refreshed: 0,
            stale: Vec::new(),
        }
    }

    struct SlowCounter {
        delay: Duration,
        done: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl EventHandler for SlowCounter {
        async fn handle(&self, _event: &LifecycleEvent) -> Result<(), PresenceError> {
            tokio::time::sleep(self.delay).await;
            self.done.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl EventHandler for Failing {
        async fn handle(&self, _event: &LifecycleEvent) -> Result<(), PresenceError> {
            Err(PresenceError::Source("handler refused".into()))
        }
    }

    struct Panicking;

    #[async_trait]
    impl EventHandler for Panicking {
        async fn handle(&self, _event: &LifecycleEvent) -> Result<(), PresenceError> {
            panic!("handler blew up");
        }
    }

    #[tokio::test]
    async fn fire_waits_for_every_handler() {
        let bus = EventBus::new();
        let done = Arc::new(AtomicUsize::new(0));
        for millis in [30, 5, 15] {
            bus.connect(
                EventKind::Update,
                SlowCounter {
                    delay: Duration::from_millis(millis),
                    done: Arc::clone(&done),
                },
            );
        }

        let report = bus.fire(update_event()).await;

        assert_eq!(done.load(Ordering::SeqCst), 3);
        assert_eq!(report, FireReport { handled: 3, failed: 0 });
    }

    #[tokio::test]
    async fn only_matching_kind_runs() {
        let bus = EventBus::new();
        let calls = Arc::new(AtomicUsize::new(0));
        bus.connect_fn(EventKind::ApplicationIn, {
            let calls = Arc::clone(&calls);
            move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
            }
        });

        let report = bus.fire(update_event()).await;

        assert_eq!(report.total(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failures_are_isolated_per_handler() {
        let bus = EventBus::new();
        let done = Arc::new(AtomicUsize::new(0));
        bus.connect(EventKind::Update, Failing);
        bus.connect(EventKind::Update, Panicking);
        bus.connect(
            EventKind::Update,
            SlowCounter {
                delay: Duration::from_millis(10),
                done: Arc::clone(&done),
            },
        );

        let report = bus.fire(update_event()).await;

        assert_eq!(report, FireReport { handled: 1, failed: 2 });
        assert_eq!(done.load(Ordering::SeqCst), 1);

        // the bus keeps working after a panic
        let again = bus.fire(update_event()).await;
        assert_eq!(again.handled, 1);
    }

    #[tokio::test]
    async fn disconnect_removes_handler() {
        let bus = EventBus::new();
        let id = bus.connect_fn(EventKind::Endangered, |_| {});
        bus.connect_fn(EventKind::Endangered, |_| {});
        assert_eq!(bus.handler_count(EventKind::Endangered), 2);

        assert!(bus.disconnect(id));
        assert!(!bus.disconnect(id));
        assert_eq!(bus.handler_count(EventKind::Endangered), 1);
    }

    #[tokio::test]
    async fn handler_receives_payload() {
        let bus = EventBus::new();
        let seen = Arc::new(AtomicUsize::new(0));
        bus.connect_fn(EventKind::Update, {
            let seen = Arc::clone(&seen);
            move |event| {
                if let LifecycleEvent::Update { refreshed, .. } = event {
                    seen.store(*refreshed, Ordering::SeqCst);
                }
            }
        });

        bus.fire(LifecycleEvent::Update {
            refreshed: 7,
            stale: Vec::new(),
        })
        .await;

        assert_eq!(seen.load(Ordering::SeqCst), 7);
    }
}
