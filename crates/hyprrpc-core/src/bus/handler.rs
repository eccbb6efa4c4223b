//! EventHandler trait - イベントを受け取る handler の定義
//!
//! # 学習ポイント
//! - Object-safe な async trait（`Arc<dyn EventHandler>` として保持）
//! - クロージャを trait object に包む wrapper（FnHandler）

use async_trait::async_trait;

use crate::domain::LifecycleEvent;
use crate::error::PresenceError;

/// EventHandler は LifecycleEvent を 1 つ処理する
///
/// # 使用例
/// ```ignore
/// struct Redraw;
///
/// #[async_trait]
/// impl EventHandler for Redraw {
///     async fn handle(&self, event: &LifecycleEvent) -> Result<(), PresenceError> {
///         println!("{:?}", event.kind());
///         Ok(())
///     }
/// }
/// ```
///
/// エラーや panic は EventBus が handler ごとに隔離します。
/// 他の handler や発火元のループには伝播しません。
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &LifecycleEvent) -> Result<(), PresenceError>;
}

/// FnHandler は同期クロージャを EventHandler にする
pub struct FnHandler<F> {
    f: F,
}

impl<F> FnHandler<F>
where
    F: Fn(&LifecycleEvent) + Send + Sync + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> EventHandler for FnHandler<F>
where
    F: Fn(&LifecycleEvent) + Send + Sync + 'static,
{
    async fn handle(&self, event: &LifecycleEvent) -> Result<(), PresenceError> {
        (self.f)(event);
        Ok(())
    }
}
