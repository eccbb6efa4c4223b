//! UpdaterLoop - 属性 refresh の周期ループ
//!
//! updater_interval ごとに `Manager::update()` を呼びます。
//! 先に sleep するので、起動直後の refresh はありません。

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use super::Manager;
use super::reconcile_loop::sleep_in_slices;

pub(crate) async fn run(manager: Arc<Manager>, mut shutdown_rx: watch::Receiver<bool>) {
    let config = manager.config().clone();

    loop {
        if sleep_in_slices(&mut shutdown_rx, config.updater_slice(), config.inc_splice).await {
            break;
        }

        match manager.update().await {
            Ok(update) => debug!(
                refreshed = update.refreshed,
                stale = update.stale.len(),
                "app attributes refreshed"
            ),
            Err(err) => warn!(error = %err, "attribute refresh failed"),
        }
    }
}
