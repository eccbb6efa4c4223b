//! ReconcileLoop - 登録と eviction の周期ループ
//!
//! # フロー
//! 1. 初回: bootstrap scan（見つかったアプリを無条件登録、sweep はしない）
//! 2. 以降: sweep → scan_and_register
//! 3. scan_period を inc_splice 個に分けて sleep（分割ごとに shutdown を確認）
//!
//! bootstrap が失敗したら次のサイクルでやり直します。
//! ループ内で bootstrap できたときは UPDATE を 1 回発火します。
//! 途中の失敗はログに出すだけでループは止めません。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, warn};

use super::{LoopReport, Manager};
use crate::domain::LifecycleEvent;

pub(crate) async fn run(manager: Arc<Manager>, mut shutdown_rx: watch::Receiver<bool>) -> LoopReport {
    let config = manager.config().clone();
    let mut report = LoopReport::default();
    let mut first_pass = true;

    loop {
        // shutdown が来ていたら抜ける
        if *shutdown_rx.borrow() {
            break;
        }

        if !manager.is_bootstrapped().await {
            match manager.bootstrap().await {
                // bootstrap は APPLICATION_IN を出さないので、完了を UPDATE で通知する
                Ok(added) => {
                    manager
                        .bus()
                        .fire(LifecycleEvent::Update {
                            refreshed: added,
                            stale: Vec::new(),
                        })
                        .await;
                }
                Err(err) => warn!(error = %err, "bootstrap scan failed; retrying next cycle"),
            }
        } else if !first_pass {
            cycle(&manager).await;
        }
        first_pass = false;
        report.cycles += 1;

        if sleep_in_slices(&mut shutdown_rx, config.scan_slice(), config.inc_splice).await {
            break;
        }
    }

    report
}

async fn cycle(manager: &Manager) {
    match manager.sweep().await {
        Ok(sweep) => debug!(
            checked = sweep.checked,
            endangered = sweep.endangered,
            purged = sweep.purged,
            "eviction sweep done"
        ),
        Err(err) => warn!(error = %err, "eviction sweep skipped"),
    }

    match manager.scan_and_register().await {
        Ok(0) => {}
        Ok(added) => debug!(added, "scan registered new apps"),
        Err(err) => warn!(error = %err, "scan failed; retrying next cycle"),
    }
}

/// `slice` を `slices` 回 sleep する。途中で shutdown が来たら `true`
pub(crate) async fn sleep_in_slices(
    shutdown_rx: &mut watch::Receiver<bool>,
    slice: Duration,
    slices: u32,
) -> bool {
    for _ in 0..slices {
        if *shutdown_rx.borrow() {
            return true;
        }
        tokio::select! {
            changed = shutdown_rx.changed() => {
                // sender が消えたら止める
                if changed.is_err() || *shutdown_rx.borrow() {
                    return true;
                }
            }
            _ = tokio::time::sleep(slice) => {}
        }
    }
    *shutdown_rx.borrow()
}
