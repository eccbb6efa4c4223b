//! hyprrpc - Hyprland のウィンドウを追跡して presence を更新するデーモン
//!
//! # フロー
//! 1. logging と config の初期化
//! 2. hyprctl / sysinfo / system clock で Manager を組み立てる
//! 3. bootstrap scan の後、select_class に合うアプリを選択
//!    （失敗したらループ側の bootstrap が出す UPDATE で選択する）
//! 4. Ctrl-C まで reconcile / updater ループを回す

mod presence;

use std::env;
use std::process::ExitCode;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use hyprrpc_core::domain::App;
use hyprrpc_core::impls::{HyprctlSource, SysinfoProbe, SystemClock};
use hyprrpc_core::ports::PresenceSink;
use hyprrpc_core::{
    EventHandler, EventKind, LifecycleEvent, Manager, ManagerBuilder, ManagerConfig, PresenceError,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::presence::LogPresence;

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let config = match ManagerConfig::load(None) {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %err, "Failed to load config; using defaults");
            ManagerConfig::default()
        }
    };
    info!(
        scan_period_ms = config.scan_period_ms,
        max_rpc_timeout = config.max_rpc_timeout,
        grace_policy = ?config.grace_policy,
        liveness = ?config.liveness,
        "hyprrpc config loaded"
    );

    let sink = Arc::new(LogPresence::new());
    let select_class = config.select_class.clone();
    let manager = match ManagerBuilder::new(
        Arc::new(HyprctlSource::new(config.source_timeout())),
        Arc::new(SysinfoProbe),
    )
    .clock(Arc::new(SystemClock::new()))
    .config(config)
    .build()
    {
        Ok(manager) => manager,
        Err(err) => {
            error!(error = %err, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    connect_handlers(&manager, &sink, select_class.clone());

    match manager.bootstrap().await {
        Ok(count) => {
            info!(apps = count, "Initial applications registered");
            select_initial(&manager, sink.as_ref(), select_class.as_deref()).await;
        }
        // the reconcile loop retries the bootstrap scan
        Err(err) => warn!(error = %err, "Initial scan failed"),
    }

    let runner = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.initialize().await }
    });

    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "Failed to listen for Ctrl-C");
    }
    info!("Shutting down");
    manager.cleanup();
    sink.select(None, None);

    match runner.await {
        Ok(Ok(report)) => {
            info!(cycles = report.cycles, "hyprrpc stopped");
            ExitCode::SUCCESS
        }
        Ok(Err(err)) => {
            error!(error = %err, "Manager failed");
            ExitCode::FAILURE
        }
        Err(err) => {
            error!(error = %err, "Manager task panicked");
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let debug_enabled = env::var("HYPRRPC_DEBUG_LOG")
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    let filter = if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn connect_handlers(manager: &Arc<Manager>, sink: &Arc<LogPresence>, select_class: Option<String>) {
    let weak = Arc::downgrade(manager);
    manager.connect_event(
        EventKind::ApplicationIn,
        ArrivalHandler {
            manager: weak.clone(),
            sink: Arc::clone(sink),
            select_class: select_class.clone(),
        },
    );
    manager.connect_event(
        EventKind::ApplicationOut,
        DepartureHandler {
            manager: weak.clone(),
            sink: Arc::clone(sink),
        },
    );
    manager.connect_event(
        EventKind::Update,
        RefreshHandler {
            manager: weak,
            sink: Arc::clone(sink),
            select_class,
        },
    );
    manager.connect_fn(EventKind::Endangered, |event| {
        if let LifecycleEvent::Endangered { app, remaining } = event {
            warn!(address = %app.address(), name = app.name(), remaining, "Application missing");
        }
    });
}

fn matches_class(app: &App, class: Option<&str>) -> bool {
    class.is_some_and(|class| app.class() == class)
}

async fn select_initial(manager: &Manager, sink: &LogPresence, class: Option<&str>) {
    let apps = manager.registered_apps().await;
    log_apps(&apps);
    if let Some(app) = apps.iter().find(|app| matches_class(app, class)) {
        let uptime = manager.uptime(app.address()).await.ok();
        sink.select(Some(app), uptime);
    }
}

fn log_apps(apps: &[App]) {
    for app in apps {
        info!(
            address = %app.address(),
            pid = app.process_id(),
            class = app.class(),
            title = app.title(),
            "registered"
        );
    }
}

/// APPLICATION_IN: 一覧を出し、選択が空なら select_class に合うアプリを選ぶ
struct ArrivalHandler {
    manager: Weak<Manager>,
    sink: Arc<LogPresence>,
    select_class: Option<String>,
}

#[async_trait]
impl EventHandler for ArrivalHandler {
    async fn handle(&self, event: &LifecycleEvent) -> Result<(), PresenceError> {
        let LifecycleEvent::ApplicationIn { app } = event else {
            return Ok(());
        };
        let Some(manager) = self.manager.upgrade() else {
            return Ok(());
        };

        log_apps(&manager.registered_apps().await);
        if self.sink.selected().is_none() && matches_class(app, self.select_class.as_deref()) {
            let uptime = manager.uptime(app.address()).await.ok();
            self.sink.select(Some(app), uptime);
        }
        Ok(())
    }
}

/// APPLICATION_OUT: 選択中のアプリが消えたら presence を外す
struct DepartureHandler {
    manager: Weak<Manager>,
    sink: Arc<LogPresence>,
}

#[async_trait]
impl EventHandler for DepartureHandler {
    async fn handle(&self, event: &LifecycleEvent) -> Result<(), PresenceError> {
        let LifecycleEvent::ApplicationOut { purged } = event else {
            return Ok(());
        };
        for app in purged {
            info!(address = %app.address(), name = app.name(), "Application closed");
        }

        let selected = self.sink.selected();
        if purged.iter().any(|app| Some(app.address()) == selected.as_ref()) {
            self.sink.select(None, None);
        }
        if let Some(manager) = self.manager.upgrade() {
            log_apps(&manager.registered_apps().await);
        }
        Ok(())
    }
}

/// UPDATE: 選択中のアプリの最新属性を sink に反映して再送。選択が空なら選び直す
struct RefreshHandler {
    manager: Weak<Manager>,
    sink: Arc<LogPresence>,
    select_class: Option<String>,
}

#[async_trait]
impl EventHandler for RefreshHandler {
    async fn handle(&self, _event: &LifecycleEvent) -> Result<(), PresenceError> {
        let Some(manager) = self.manager.upgrade() else {
            return Ok(());
        };

        match self.sink.selected() {
            None => select_initial(&manager, &self.sink, self.select_class.as_deref()).await,
            Some(selected) => {
                let apps = manager.registered_apps().await;
                if let Some(app) = apps.iter().find(|app| app.address() == &selected) {
                    let uptime = manager.uptime(app.address()).await.ok();
                    self.sink.refresh(app, uptime);
                }
            }
        }
        self.sink.push_update();
        Ok(())
    }
}
