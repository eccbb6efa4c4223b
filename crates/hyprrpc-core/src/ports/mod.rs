//! Ports - 抽象化レイヤー
//!
//! 外部 collaborator（compositor の CLI、プロセステーブル、時計、presence 表示）
//! へのインターフェースを trait として定義し、実装の詳細を隠蔽します。

pub mod clock;
pub mod presence_sink;
pub mod process_probe;
pub mod snapshot_source;

pub use self::clock::Clock;
pub use self::presence_sink::PresenceSink;
pub use self::process_probe::ProcessProbe;
pub use self::snapshot_source::SnapshotSource;
