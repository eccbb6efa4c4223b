//! HyprctlSource - `hyprctl -j clients` を読む SnapshotSource
//!
//! # 学習ポイント
//! - tokio::process での子プロセス実行
//! - tokio::time::timeout で呼び出し時間を有界にする

use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::domain::Snapshot;
use crate::error::PresenceError;
use crate::ports::SnapshotSource;

pub struct HyprctlSource {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl HyprctlSource {
    pub fn new(timeout: Duration) -> Self {
        Self {
            program: "hyprctl".to_string(),
            args: vec!["-j".to_string(), "clients".to_string()],
            timeout,
        }
    }

    /// Runs another command instead of hyprctl; it must print the same JSON.
    pub fn with_command(program: impl Into<String>, args: &[&str], timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            timeout,
        }
    }
}

/// Decodes `hyprctl -j clients` output.
pub fn parse_clients(stdout: &[u8]) -> Result<Snapshot, PresenceError> {
    Ok(serde_json::from_slice(stdout)?)
}

#[async_trait]
impl SnapshotSource for HyprctlSource {
    async fn read_snapshot(&self) -> Result<Snapshot, PresenceError> {
        let run = Command::new(&self.program)
            .args(&self.args)
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| {
                PresenceError::Source(format!("{} timed out after {:?}", self.program, self.timeout))
            })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PresenceError::Source(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let snapshot = parse_clients(&output.stdout)?;
        debug!(clients = snapshot.len(), "snapshot read");
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_garbage() {
        let err = parse_clients(b"hyprctl: couldn't connect").unwrap_err();
        assert!(matches!(err, PresenceError::Decode(_)));
    }

    #[tokio::test]
    async fn reads_json_from_command_stdout() {
        let source = HyprctlSource::with_command(
            "sh",
            &["-c", r#"printf '[{"address":"0x1","pid":10,"title":"t"}]'"#],
            Duration::from_secs(5),
        );
        let snapshot = source.read_snapshot().await.unwrap();
        assert_eq!(snapshot.len(), 1);
    }

    #[tokio::test]
    async fn non_zero_exit_is_source_error() {
        let source = HyprctlSource::with_command("sh", &["-c", "exit 3"], Duration::from_secs(5));
        let err = source.read_snapshot().await.unwrap_err();
        assert!(matches!(err, PresenceError::Source(_)));
    }

    #[tokio::test]
    async fn missing_program_is_io_error() {
        let source = HyprctlSource::with_command(
            "definitely-not-a-real-hyprctl",
            &[],
            Duration::from_secs(5),
        );
        let err = source.read_snapshot().await.unwrap_err();
        assert!(matches!(err, PresenceError::Io(_)));
    }

    #[tokio::test]
    async fn slow_command_times_out() {
        let source = HyprctlSource::with_command("sleep", &["5"], Duration::from_millis(50));
        let err = source.read_snapshot().await.unwrap_err();
        assert!(matches!(err, PresenceError::Source(ref msg) if msg.contains("timed out")));
    }
}
