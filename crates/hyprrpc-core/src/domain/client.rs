//! Client records: the raw attributes one snapshot reports per window.
//!
//! Field names follow `hyprctl -j clients`. Unknown fields are ignored and
//! missing ones fall back to defaults, so newer compositor versions that add
//! or drop keys still decode.

use serde::{Deserialize, Serialize};

use super::address::Address;

/// Process id reported for entries the compositor has not populated yet.
pub const INVALID_PROCESS_ID: i32 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    #[serde(default)]
    pub id: i64,
    #[serde(default = "Workspace::unnamed")]
    pub name: String,
}

impl Workspace {
    fn unnamed() -> String {
        "Unnamed Workspace".to_string()
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self {
            id: 0,
            name: Self::unnamed(),
        }
    }
}

/// One observed window, as reported by the snapshot source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRecord {
    pub address: Address,

    #[serde(rename = "pid", default = "ClientRecord::invalid_pid")]
    pub process_id: i32,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub class: String,

    #[serde(rename = "initialTitle", default)]
    pub initial_title: String,

    #[serde(rename = "initialClass", default)]
    pub initial_class: String,

    #[serde(rename = "mapped", default)]
    pub is_mapped: bool,

    #[serde(default)]
    pub hidden: bool,

    #[serde(rename = "floating", default)]
    pub is_floating: bool,

    #[serde(rename = "pinned", default)]
    pub is_pinned: bool,

    #[serde(rename = "xwayland", default)]
    pub uses_xwayland: bool,

    #[serde(default)]
    pub monitor: i64,

    #[serde(default)]
    pub workspace: Workspace,

    #[serde(rename = "focusHistoryID", default)]
    pub focus_history_id: i64,
}

impl ClientRecord {
    fn invalid_pid() -> i32 {
        INVALID_PROCESS_ID
    }

    /// Minimal record, mostly useful for tests and in-memory sources.
    pub fn new(address: impl Into<Address>, process_id: i32, title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            address: address.into(),
            process_id,
            initial_title: title.clone(),
            title,
            class: String::new(),
            initial_class: String::new(),
            is_mapped: true,
            hidden: false,
            is_floating: false,
            is_pinned: false,
            uses_xwayland: false,
            monitor: 0,
            workspace: Workspace::default(),
            focus_history_id: 0,
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        let class = class.into();
        self.initial_class = class.clone();
        self.class = class;
        self
    }
}

/// A full point-in-time list of observed clients.
///
/// Entries are unordered and fully replace the previous snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    clients: Vec<ClientRecord>,
}

impl Snapshot {
    pub fn new(clients: Vec<ClientRecord>) -> Self {
        Self { clients }
    }

    pub fn find(&self, address: &Address) -> Option<&ClientRecord> {
        self.clients.iter().find(|c| &c.address == address)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.find(address).is_some()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn into_records(self) -> Vec<ClientRecord> {
        self.clients
    }
}

impl From<Vec<ClientRecord>> for Snapshot {
    fn from(clients: Vec<ClientRecord>) -> Self {
        Self::new(clients)
    }
}
