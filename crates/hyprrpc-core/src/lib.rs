//! hyprrpc-core
//!
//! Core building blocks for the HyprRPC presence daemon.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（Address, ClientRecord, Snapshot, App, events, ids）
//! - **ports**: 抽象化レイヤー（SnapshotSource, ProcessProbe, Clock, PresenceSink）
//! - **cache / ledger / endangered**: registry を構成する 3 つの状態
//! - **bus**: 型付き publish/subscribe（EventBus, EventHandler）
//! - **app**: アプリケーションロジック（ManagerBuilder, Manager, 周期ループ）
//! - **impls**: 実装（hyprctl, sysinfo, clock, テスト用 in-memory）
//! - **config / error**: 設定とエラー型

pub mod app;
pub mod bus;
pub mod cache;
pub mod config;
pub mod domain;
pub mod endangered;
pub mod error;
pub mod impls;
pub mod ledger;
pub mod ports;

pub use app::{BuildError, Manager, ManagerBuilder, SweepReport, UpdateReport};
pub use bus::{EventBus, EventHandler, FireReport};
pub use config::{ConfigError, LivenessCheck, ManagerConfig};
pub use domain::{Address, App, ClientRecord, EventKind, LifecycleEvent, Snapshot, SubscriptionId};
pub use endangered::GracePolicy;
pub use error::PresenceError;
