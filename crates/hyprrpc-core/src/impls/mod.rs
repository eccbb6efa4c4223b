//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **HyprctlSource**: `hyprctl -j clients` を読む SnapshotSource（本番用）
//! - **SysinfoProbe**: sysinfo による ProcessProbe（本番用）
//! - **SystemClock / ManualClock**: Clock（本番用 / テスト用）
//! - **MemorySource / ScriptedProbe**: テスト・デモ用

pub mod clock;
pub mod hyprctl;
pub mod memory;
pub mod sysinfo_probe;

pub use self::clock::{ManualClock, SystemClock};
pub use self::hyprctl::HyprctlSource;
pub use self::memory::{MemorySource, ScriptedProbe};
pub use self::sysinfo_probe::SysinfoProbe;
