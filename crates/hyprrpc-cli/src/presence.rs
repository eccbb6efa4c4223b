//! LogPresence - tracing に書き出すだけの PresenceSink
//!
//! Discord への送信は別 crate の担当で、ここでは選択状態の管理とログだけを行います。

use std::sync::Mutex;
use std::time::Duration;

use hyprrpc_core::domain::{Address, App};
use hyprrpc_core::ports::PresenceSink;
use tracing::info;

#[derive(Debug, Clone)]
struct Selection {
    address: Address,
    name: String,
    title: String,
    uptime: Option<Duration>,
}

#[derive(Debug, Default)]
pub struct LogPresence {
    selected: Mutex<Option<Selection>>,
}

impl LogPresence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<Address> {
        self.lock().as_ref().map(|s| s.address.clone())
    }

    #[cfg(test)]
    pub fn selected_title(&self) -> Option<String> {
        self.lock().as_ref().map(|s| s.title.clone())
    }

    /// Copies the latest title and uptime if `app` is the current selection.
    pub fn refresh(&self, app: &App, uptime: Option<Duration>) {
        if let Some(selection) = self.lock().as_mut().filter(|s| &s.address == app.address()) {
            selection.title = app.title().to_string();
            selection.uptime = uptime;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Selection>> {
        self.selected.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl PresenceSink for LogPresence {
    fn select(&self, app: Option<&App>, uptime: Option<Duration>) {
        let mut selected = self.lock();
        match app {
            Some(app) => {
                info!(address = %app.address(), name = app.name(), ?uptime, "presence selected");
                *selected = Some(Selection {
                    address: app.address().clone(),
                    name: app.name().to_string(),
                    title: app.title().to_string(),
                    uptime,
                });
            }
            None => {
                if selected.take().is_some() {
                    info!("presence cleared");
                }
            }
        }
    }

    fn push_update(&self) {
        if let Some(selection) = self.lock().as_ref() {
            info!(
                address = %selection.address,
                name = %selection.name,
                title = %selection.title,
                uptime = ?selection.uptime,
                "presence update"
            );
        }
    }
}
