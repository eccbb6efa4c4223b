//! ManagerBuilder - Manager の構築とワイヤリング
//!
//! # 学習ポイント
//! - source / probe / clock と ManagerConfig を 1 つの Manager にまとめる
//! - 不正な周期や猶予回数は build() で BuildError にし、ループまで持ち込まない
//! - expect_handlers() で「この EventKind には handler が要る」を build 時に確認

use std::sync::Arc;

use crate::bus::{EventBus, EventHandler};
use crate::config::ManagerConfig;
use crate::domain::EventKind;
use crate::impls::SystemClock;
use crate::ports::{Clock, ProcessProbe, SnapshotSource};

use super::Manager;

/// ManagerBuilder は collaborator と設定を束ねて Manager を作る
///
/// # 使用例
/// ```ignore
/// let manager = ManagerBuilder::new(Arc::new(source), Arc::new(probe))
///     .config(config)
///     .connect(EventKind::Update, RenderOnUpdate)
///     .expect_handlers(&[EventKind::Update])
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - 周期や分割数が 0 の設定はループが回らないので build() で弾く
/// - expect_handlers() で指定した kind に handler が無ければ BuildError
pub struct ManagerBuilder {
    source: Arc<dyn SnapshotSource>,
    probe: Arc<dyn ProcessProbe>,
    clock: Option<Arc<dyn Clock>>,
    config: ManagerConfig,
    handlers: Vec<(EventKind, Arc<dyn EventHandler>)>,
    expected_handlers: Vec<EventKind>,
}

/// BuildError は Manager 構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("inc_splice must be at least 1")]
    ZeroSplice,

    #[error("scan_period_ms must be greater than zero")]
    ZeroScanPeriod,

    #[error("updater_interval_secs must be greater than zero")]
    ZeroUpdaterInterval,

    #[error("max_rpc_timeout must not be negative (got {0})")]
    NegativeTimeout(i32),

    #[error("No handler connected for events: {0:?}")]
    MissingHandlers(Vec<EventKind>),
}

impl ManagerBuilder {
    pub fn new(source: Arc<dyn SnapshotSource>, probe: Arc<dyn ProcessProbe>) -> Self {
        Self {
            source,
            probe,
            clock: None,
            config: ManagerConfig::default(),
            handlers: Vec::new(),
            expected_handlers: Vec::new(),
        }
    }

    /// Overrides the clock (defaults to `SystemClock`).
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn config(mut self, config: ManagerConfig) -> Self {
        self.config = config;
        self
    }

    /// Handler を登録（build 後に `Manager::connect_event` でも追加できる）
    pub fn connect<H: EventHandler + 'static>(mut self, kind: EventKind, handler: H) -> Self {
        self.handlers.push((kind, Arc::new(handler)));
        self
    }

    /// build() 時に handler の存在を要求する kind を設定
    pub fn expect_handlers(mut self, kinds: &[EventKind]) -> Self {
        self.expected_handlers = kinds.to_vec();
        self
    }

    /// 設定を検証して Manager を生成
    ///
    /// # 検証
    /// - inc_splice / scan_period_ms / updater_interval_secs が 0 でない
    /// - max_rpc_timeout が負でない
    /// - expect_handlers() の kind すべてに handler がある
    pub fn build(self) -> Result<Arc<Manager>, BuildError> {
        let config = &self.config;
        if config.inc_splice == 0 {
            return Err(BuildError::ZeroSplice);
        }
        if config.scan_period_ms == 0 {
            return Err(BuildError::ZeroScanPeriod);
        }
        if config.updater_interval_secs == 0 {
            return Err(BuildError::ZeroUpdaterInterval);
        }
        if config.max_rpc_timeout < 0 {
            return Err(BuildError::NegativeTimeout(config.max_rpc_timeout));
        }

        let missing: Vec<EventKind> = self
            .expected_handlers
            .iter()
            .filter(|kind| !self.handlers.iter().any(|(k, _)| k == *kind))
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(BuildError::MissingHandlers(missing));
        }

        let bus = EventBus::new();
        for (kind, handler) in self.handlers {
            bus.connect_arc(kind, handler);
        }

        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock::new()),
        };
        Ok(Arc::new(Manager::new(
            self.source,
            self.probe,
            clock,
            self.config,
            bus,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::{MemorySource, ScriptedProbe};
    use rstest::rstest;

    fn builder() -> ManagerBuilder {
        ManagerBuilder::new(Arc::new(MemorySource::default()), Arc::new(ScriptedProbe::new()))
    }

    #[test]
    fn test_build_success() {
        let manager = builder()
            .connect(EventKind::Update, crate::bus::FnHandler::new(|_| {}))
            .build();
        assert!(manager.is_ok());
        assert_eq!(manager.unwrap().bus().handler_count(EventKind::Update), 1);
    }

    #[rstest]
    #[case(ManagerConfig { inc_splice: 0, ..ManagerConfig::default() })]
    #[case(ManagerConfig { scan_period_ms: 0, ..ManagerConfig::default() })]
    #[case(ManagerConfig { updater_interval_secs: 0, ..ManagerConfig::default() })]
    #[case(ManagerConfig { max_rpc_timeout: -1, ..ManagerConfig::default() })]
    fn test_build_rejects_unusable_config(#[case] config: ManagerConfig) {
        assert!(builder().config(config).build().is_err());
    }

    #[test]
    fn test_build_missing_handlers() {
        let manager = builder()
            .connect(EventKind::Update, crate::bus::FnHandler::new(|_| {}))
            .expect_handlers(&[EventKind::Update, EventKind::ApplicationOut])
            .build();
        assert!(matches!(
            manager,
            Err(BuildError::MissingHandlers(missing)) if missing == vec![EventKind::ApplicationOut]
        ));
    }

    #[test]
    fn test_build_no_expect_handlers() {
        assert!(builder().build().is_ok());
    }
}
