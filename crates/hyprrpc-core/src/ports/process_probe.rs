//! ProcessProbe port - プロセステーブルへの問い合わせ
//!
//! # 実装
//! - **SysinfoProbe**: 本番用（`impls::sysinfo_probe`）
//! - **ScriptedProbe**: テスト用（`impls::memory`）

/// ProcessProbe は liveness oracle と binary path の解決を提供
///
/// どちらも同期 API です。1 pid だけを問い合わせるので有界時間で返る前提です。
pub trait ProcessProbe: Send + Sync {
    /// pid に対応する生きたプロセスがあるか
    fn is_alive(&self, process_id: i32) -> bool;

    /// pid の実行ファイルパス
    ///
    /// 解決できない場合は `None`。空文字列も「本物のアプリではない」として扱われます。
    fn binary_path(&self, process_id: i32) -> Option<String>;
}
