//! In-memory collaborators for tests and demos.
//!
//! # 含まれる実装
//! - **MemorySource**: 差し替え可能な snapshot を返す SnapshotSource
//! - **ScriptedProbe**: pid ごとの生死と binary path を手で設定できる ProcessProbe

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{ClientRecord, Snapshot};
use crate::error::PresenceError;
use crate::ports::{ProcessProbe, SnapshotSource};

#[derive(Debug, Default)]
struct MemorySourceState {
    snapshot: Snapshot,
    failure: Option<String>,
    reads: usize,
}

/// MemorySource は `set()` された snapshot をそのまま返す
#[derive(Debug, Default)]
pub struct MemorySource {
    state: Mutex<MemorySourceState>,
}

impl MemorySource {
    pub fn new(clients: Vec<ClientRecord>) -> Self {
        Self {
            state: Mutex::new(MemorySourceState {
                snapshot: Snapshot::new(clients),
                ..Default::default()
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemorySourceState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replaces the snapshot returned by subsequent reads.
    pub fn set(&self, clients: Vec<ClientRecord>) {
        self.lock().snapshot = Snapshot::new(clients);
    }

    /// Makes every read fail with `PresenceError::Source` until `recover()`.
    pub fn fail_with(&self, message: impl Into<String>) {
        self.lock().failure = Some(message.into());
    }

    pub fn recover(&self) {
        self.lock().failure = None;
    }

    /// Number of `read_snapshot()` calls so far, failed ones included.
    pub fn reads(&self) -> usize {
        self.lock().reads
    }
}

#[async_trait]
impl SnapshotSource for MemorySource {
    async fn read_snapshot(&self) -> Result<Snapshot, PresenceError> {
        let mut state = self.lock();
        state.reads += 1;
        if let Some(message) = &state.failure {
            return Err(PresenceError::Source(message.clone()));
        }
        Ok(state.snapshot.clone())
    }
}

#[derive(Debug, Default)]
struct ProbeState {
    alive: HashSet<i32>,
    binaries: HashMap<i32, String>,
}

/// ScriptedProbe は `spawn()` された pid だけを生きているとみなす
#[derive(Debug, Default)]
pub struct ScriptedProbe {
    state: Mutex<ProbeState>,
}

impl ScriptedProbe {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ProbeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Marks `pid` alive with the given executable (empty = not a real application).
    pub fn spawn(&self, pid: i32, binary_path: impl Into<String>) {
        let mut state = self.lock();
        state.alive.insert(pid);
        state.binaries.insert(pid, binary_path.into());
    }

    pub fn kill(&self, pid: i32) {
        self.lock().alive.remove(&pid);
    }

    pub fn revive(&self, pid: i32) {
        self.lock().alive.insert(pid);
    }
}

impl ProcessProbe for ScriptedProbe {
    fn is_alive(&self, process_id: i32) -> bool {
        self.lock().alive.contains(&process_id)
    }

    fn binary_path(&self, process_id: i32) -> Option<String> {
        self.lock().binaries.get(&process_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Address;

    #[tokio::test]
    async fn memory_source_returns_latest_snapshot() {
        let source = MemorySource::new(vec![ClientRecord::new("0x1", 1, "a")]);
        assert_eq!(source.read_snapshot().await.unwrap().len(), 1);

        source.set(vec![ClientRecord::new("0x2", 2, "b"), ClientRecord::new("0x3", 3, "c")]);
        let snapshot = source.read_snapshot().await.unwrap();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.contains(&Address::from("0x3")));
        assert_eq!(source.reads(), 2);
    }

    #[tokio::test]
    async fn memory_source_can_fail_and_recover() {
        let source = MemorySource::new(Vec::new());
        source.fail_with("hyprctl not running");
        assert!(matches!(source.read_snapshot().await, Err(PresenceError::Source(_))));

        source.recover();
        assert!(source.read_snapshot().await.is_ok());
    }

    #[test]
    fn scripted_probe_tracks_life_and_binaries() {
        let probe = ScriptedProbe::new();
        probe.spawn(10, "/bin/x");
        assert!(probe.is_alive(10));
        assert_eq!(probe.binary_path(10).as_deref(), Some("/bin/x"));

        probe.kill(10);
        assert!(!probe.is_alive(10));
        // binary path stays resolvable after death
        assert_eq!(probe.binary_path(10).as_deref(), Some("/bin/x"));

        assert!(!probe.is_alive(11));
        assert_eq!(probe.binary_path(11), None);
    }
}
