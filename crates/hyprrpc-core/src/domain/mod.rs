//! Domain model (addresses, client records, apps, lifecycle events).
//!
//! ここに置く型は I/O を持ちません。snapshot の取得や liveness の判定は
//! `ports` 側の責務です。

pub mod address;
pub mod app;
pub mod client;
pub mod events;
pub mod ids;

pub use self::address::Address;
pub use self::app::App;
pub use self::client::{ClientRecord, INVALID_PROCESS_ID, Snapshot, Workspace};
pub use self::events::{EventKind, LifecycleEvent};
pub use self::ids::SubscriptionId;
