//! Manager - アプリケーションのライフサイクル管理
//!
//! cache / endangered registry / time ledger をひとつの async Mutex で守り、
//! scan・sweep・refresh の各操作と EventBus への通知を提供します。
//!
//! # ロックの方針
//! - SnapshotSource / ProcessProbe の呼び出し中はロックを持たない
//! - ProcessProbe は同期 I/O なので spawn_blocking で呼ぶ
//! - イベントの発火はロックを解放してから行う（handler から読み取り API を呼べる）

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use super::{reconcile_loop, updater_loop};
use crate::bus::{EventBus, EventHandler};
use crate::cache::ApplicationCache;
use crate::config::{LivenessCheck, ManagerConfig};
use crate::domain::{Address, App, EventKind, LifecycleEvent, SubscriptionId};
use crate::endangered::{EndangeredRegistry, MissMark};
use crate::error::PresenceError;
use crate::ledger::TimeLedger;
use crate::ports::{Clock, ProcessProbe, SnapshotSource};

#[derive(Debug, Default)]
struct RegistryState {
    cache: ApplicationCache,
    endangered: EndangeredRegistry,
    ledger: TimeLedger,
    bootstrapped: bool,
}

impl RegistryState {
    fn insert(&mut self, app: App, clock: &dyn Clock) -> bool {
        let address = app.address().clone();
        if !self.cache.push_application(app) {
            return false;
        }
        self.endangered.forget(&address);
        self.ledger.record_now(&address, clock);
        true
    }
}

/// Result of one eviction sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub checked: usize,
    /// Apps that entered the endangered registry in this sweep.
    pub endangered: usize,
    pub purged: usize,
}

/// Result of one attribute refresh pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    pub refreshed: usize,
    /// Cached apps whose address was missing from the fresh snapshot.
    pub stale: Vec<Address>,
}

/// Returned by `initialize()` once the loops stop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopReport {
    pub cycles: u64,
}

/// Manager は登録済みアプリの正本と、それを更新する 2 本のループを持つ
///
/// # 使用例
/// ```ignore
/// let manager = ManagerBuilder::new(source, probe).build()?;
/// manager.connect_fn(EventKind::ApplicationIn, |event| println!("{:?}", event));
///
/// let runner = tokio::spawn({
///     let manager = Arc::clone(&manager);
///     async move { manager.initialize().await }
/// });
/// // ...
/// manager.cleanup();
/// runner.await??;
/// ```
pub struct Manager {
    source: Arc<dyn SnapshotSource>,
    probe: Arc<dyn ProcessProbe>,
    clock: Arc<dyn Clock>,
    config: ManagerConfig,
    state: Mutex<RegistryState>,
    bus: EventBus,
    shutdown_tx: watch::Sender<bool>,
    running: AtomicBool,
}

impl Manager {
    pub(crate) fn new(
        source: Arc<dyn SnapshotSource>,
        probe: Arc<dyn ProcessProbe>,
        clock: Arc<dyn Clock>,
        config: ManagerConfig,
        bus: EventBus,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            source,
            probe,
            clock,
            config,
            state: Mutex::new(RegistryState::default()),
            bus,
            shutdown_tx,
            running: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    // ========================================
    // Event subscription
    // ========================================

    pub fn connect_event<H: EventHandler + 'static>(&self, kind: EventKind, handler: H) -> SubscriptionId {
        self.bus.connect(kind, handler)
    }

    pub fn connect_fn<F>(&self, kind: EventKind, f: F) -> SubscriptionId
    where
        F: Fn(&LifecycleEvent) + Send + Sync + 'static,
    {
        self.bus.connect_fn(kind, f)
    }

    pub fn disconnect_event(&self, id: SubscriptionId) -> bool {
        self.bus.disconnect(id)
    }

    // ========================================
    // Scan / register
    // ========================================

    /// snapshot を読み、binary path の無いエントリを捨て、cache と checkout する
    ///
    /// 返り値の中で既に cache にある address は cache 側のインスタンスになります。
    /// cache 自体は変更しません。
    pub async fn scan(&self) -> Result<Vec<App>, PresenceError> {
        let snapshot = self.source.read_snapshot().await?;
        let epoch_day = self.clock.epoch_day();

        let probe = Arc::clone(&self.probe);
        let candidates: Vec<App> = tokio::task::spawn_blocking(move || {
            snapshot
                .into_records()
                .into_iter()
                .map(|record| {
                    let binary = probe.binary_path(record.process_id).unwrap_or_default();
                    App::observe(record, binary, epoch_day)
                })
                .filter(|app| {
                    if !app.has_binary() {
                        debug!(address = %app.address(), pid = app.process_id(), "skipping client without binary");
                    }
                    app.has_binary()
                })
                .collect::<Vec<App>>()
        })
        .await?;

        let state = self.state.lock().await;
        Ok(state.cache.checkout(candidates))
    }

    /// 初回 scan: 見つかったアプリを無条件に登録する（イベントは発火しない）
    ///
    /// Returns the number of apps that were newly cached.
    pub async fn bootstrap(&self) -> Result<usize, PresenceError> {
        let apps = self.scan().await?;

        let mut state = self.state.lock().await;
        let mut added = 0;
        for app in apps {
            if state.insert(app, self.clock.as_ref()) {
                added += 1;
            }
        }
        state.bootstrapped = true;
        info!(apps = added, "bootstrap scan complete");
        Ok(added)
    }

    pub async fn is_bootstrapped(&self) -> bool {
        self.state.lock().await.bootstrapped
    }

    /// 未登録なら cache に追加し APPLICATION_IN を発火して `true`
    pub async fn register_app(&self, app: App) -> bool {
        let inserted = {
            let mut state = self.state.lock().await;
            state.insert(app.clone(), self.clock.as_ref())
        };

        if inserted {
            info!(address = %app.address(), pid = app.process_id(), name = app.name(), "app registered");
            self.bus.fire(LifecycleEvent::ApplicationIn { app }).await;
        }
        inserted
    }

    /// scan して、結果をすべて `register_app()` に通す
    pub async fn scan_and_register(&self) -> Result<usize, PresenceError> {
        let apps = self.scan().await?;
        let mut added = 0;
        for app in apps {
            if self.register_app(app).await {
                added += 1;
            }
        }
        Ok(added)
    }

    // ========================================
    // Eviction sweep
    // ========================================

    /// cache の全アプリに liveness check をかけ、猶予の尽きたものを purge する
    ///
    /// # フロー
    /// 1. ロック内で対象の (address, pid) を取り出す
    /// 2. ロック外で liveness を判定（process モードは spawn_blocking で probe、
    ///    snapshot モードは fresh snapshot。読めなければ sweep しない）
    /// 3. ロック内で registry / cache を更新（判定中に cache から消えたものは飛ばす）
    /// 4. ロック解放後に ENDANGERED を発火、purge があれば APPLICATION_OUT を 1 回
    pub async fn sweep(&self) -> Result<SweepReport, PresenceError> {
        let targets: Vec<(Address, i32)> = {
            let state = self.state.lock().await;
            state
                .cache
                .iter()
                .map(|app| (app.address().clone(), app.process_id()))
                .collect()
        };

        let liveness: Vec<(Address, bool)> = match self.config.liveness {
            LivenessCheck::Process => {
                let probe = Arc::clone(&self.probe);
                tokio::task::spawn_blocking(move || {
                    targets
                        .into_iter()
                        .map(|(address, pid)| {
                            let alive = probe.is_alive(pid);
                            (address, alive)
                        })
                        .collect::<Vec<_>>()
                })
                .await?
            }
            LivenessCheck::Snapshot => {
                let snapshot = self.source.read_snapshot().await?;
                targets
                    .into_iter()
                    .map(|(address, _)| {
                        let alive = snapshot.contains(&address);
                        (address, alive)
                    })
                    .collect()
            }
        };

        let mut report = SweepReport::default();
        let mut endangered_events = Vec::new();
        let mut purged = Vec::new();
        {
            let mut state = self.state.lock().await;
            let RegistryState { cache, endangered, .. } = &mut *state;

            for (address, alive) in liveness {
                let Some(app) = cache.get(&address).cloned() else {
                    continue;
                };
                report.checked += 1;

                if alive {
                    if endangered.mark_alive(&address, self.config.grace_policy) {
                        debug!(address = %address, "app recovered; grace counter cleared");
                    }
                    continue;
                }

                match endangered.mark_missing(&address, self.config.max_rpc_timeout) {
                    MissMark::Armed { remaining } => {
                        report.endangered += 1;
                        info!(address = %address, pid = app.process_id(), remaining, "app endangered");
                        endangered_events.push(LifecycleEvent::Endangered { app, remaining });
                    }
                    MissMark::Decremented { remaining } => {
                        debug!(address = %address, remaining, "app still missing");
                    }
                    MissMark::Expired { newly_endangered } => {
                        if newly_endangered {
                            report.endangered += 1;
                            endangered_events.push(LifecycleEvent::Endangered {
                                app: app.clone(),
                                remaining: self.config.max_rpc_timeout,
                            });
                        }
                        cache.purge_application(&address);
                        info!(address = %address, pid = app.process_id(), name = app.name(), "app evicted");
                        purged.push(app);
                    }
                }
            }
        }

        report.purged = purged.len();
        for event in endangered_events {
            self.bus.fire(event).await;
        }
        if !purged.is_empty() {
            self.bus.fire(LifecycleEvent::ApplicationOut { purged }).await;
        }
        Ok(report)
    }

    // ========================================
    // Refresh
    // ========================================

    /// fresh snapshot で cache の全アプリの属性を更新し、UPDATE を発火する
    ///
    /// snapshot に address が無いアプリは `stale` に入るだけで cache には残ります。
    /// 消えたかどうかの判断は sweep の担当です。
    pub async fn update(&self) -> Result<UpdateReport, PresenceError> {
        let snapshot = self.source.read_snapshot().await?;

        let mut report = UpdateReport::default();
        {
            let mut state = self.state.lock().await;
            for app in state.cache.iter_mut() {
                match app.update_from(&snapshot) {
                    Ok(()) => report.refreshed += 1,
                    Err(err) => {
                        warn!(error = %err, "refresh failed; leaving app to the eviction sweep");
                        report.stale.push(app.address().clone());
                    }
                }
            }
        }

        self.bus
            .fire(LifecycleEvent::Update {
                refreshed: report.refreshed,
                stale: report.stale.clone(),
            })
            .await;
        Ok(report)
    }

    // ========================================
    // Read-only queries
    // ========================================

    /// 外部向けのビュー（title 空 / 無効 pid を除外した登録順のコピー）
    pub async fn registered_apps(&self) -> Vec<App> {
        self.state.lock().await.cache.cached_applications()
    }

    pub async fn is_endangered(&self, address: &Address) -> bool {
        self.state.lock().await.endangered.is_endangered(address)
    }

    pub async fn grace_remaining(&self, address: &Address) -> Option<i32> {
        self.state.lock().await.endangered.remaining(address)
    }

    /// Monotonic milliseconds at which `address` was first registered.
    pub async fn first_seen(&self, address: &Address) -> Result<u64, PresenceError> {
        self.state.lock().await.ledger.get_time(address)
    }

    pub async fn uptime(&self, address: &Address) -> Result<Duration, PresenceError> {
        let now_ms = self.clock.monotonic_ms();
        self.state.lock().await.ledger.get_time_since(address, now_ms)
    }

    // ========================================
    // Lifecycle
    // ========================================

    /// reconcile ループをこの task で、updater ループを別 task で走らせる
    ///
    /// `cleanup()` が呼ばれるまで返りません。二重起動は `AlreadyRunning`。
    pub async fn initialize(self: &Arc<Self>) -> Result<LoopReport, PresenceError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(PresenceError::AlreadyRunning);
        }

        let updater = tokio::spawn(updater_loop::run(
            Arc::clone(self),
            self.shutdown_tx.subscribe(),
        ));
        let report = reconcile_loop::run(Arc::clone(self), self.shutdown_tx.subscribe()).await;

        if let Err(err) = updater.await {
            warn!(error = %err, "updater loop ended abnormally");
        }
        self.running.store(false, Ordering::SeqCst);
        info!(cycles = report.cycles, "manager loops stopped");
        Ok(report)
    }

    /// 両ループに停止を要求する（実行中のサイクルは最後まで走る）
    pub fn cleanup(&self) {
        self.shutdown_tx.send_replace(true);
    }

    pub fn is_shutdown_requested(&self) -> bool {
        *self.shutdown_tx.borrow()
    }
}
