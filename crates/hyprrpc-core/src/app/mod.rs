//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてライフサイクル管理を実装します。
//!
//! # 主要コンポーネント
//! - **ManagerBuilder**: Manager の構築とワイヤリング
//! - **Manager**: registry の正本と scan / sweep / refresh
//! - **ReconcileLoop**: 登録と eviction の周期実行
//! - **UpdaterLoop**: 属性 refresh の周期実行

pub mod builder;
pub mod manager;
mod reconcile_loop;
mod updater_loop;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, ManagerBuilder};
pub use self::manager::{LoopReport, Manager, SweepReport, UpdateReport};
