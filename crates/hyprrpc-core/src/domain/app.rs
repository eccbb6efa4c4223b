//! App - 追跡中のアプリケーション 1 つ
//!
//! # 学習ポイント
//! - identity（address）と可変な属性（title など）の分離
//! - 構築時に一度だけ決まる値（binary path, 登録日）は setter を持たない

use serde::{Deserialize, Serialize};

use super::address::Address;
use super::client::{ClientRecord, INVALID_PROCESS_ID, Snapshot};
use crate::error::PresenceError;

/// App は snapshot の 1 エントリをラップしたもの
///
/// 等価性は `address` のみで判定します（`PartialEq` は address だけを比較）。
/// 属性は `update_from()` で snapshot から差し替えられますが、
/// address / binary path / 登録日は変わりません。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct App {
    raw: ClientRecord,
    binary_path: String,
    registered_at_epoch_day: i64,
}

impl App {
    /// snapshot エントリと解決済み binary path から App を作成
    pub fn observe(raw: ClientRecord, binary_path: impl Into<String>, epoch_day: i64) -> Self {
        Self {
            raw,
            binary_path: binary_path.into(),
            registered_at_epoch_day: epoch_day,
        }
    }

    pub fn address(&self) -> &Address {
        &self.raw.address
    }

    pub fn process_id(&self) -> i32 {
        self.raw.process_id
    }

    pub fn title(&self) -> &str {
        &self.raw.title
    }

    /// Human readable name (the window's initial title).
    pub fn name(&self) -> &str {
        &self.raw.initial_title
    }

    pub fn class(&self) -> &str {
        &self.raw.initial_class
    }

    pub fn binary_path(&self) -> &str {
        &self.binary_path
    }

    pub fn registered_at_epoch_day(&self) -> i64 {
        self.registered_at_epoch_day
    }

    pub fn raw(&self) -> &ClientRecord {
        &self.raw
    }

    /// binary path が空なら「本物のアプリ」ではない
    pub fn has_binary(&self) -> bool {
        !self.binary_path.is_empty()
    }

    /// Whether the entry is populated enough to show to consumers.
    pub fn is_presentable(&self) -> bool {
        !self.raw.title.is_empty() && self.raw.process_id != INVALID_PROCESS_ID
    }

    /// fresh snapshot から自分の address の属性を取り込む
    ///
    /// address が snapshot に無ければ `PresenceError::NotFound`。
    /// 通常の消失処理は eviction sweep の担当なので、ここでは失敗として返すだけです。
    pub fn update_from(&mut self, snapshot: &Snapshot) -> Result<(), PresenceError> {
        let fresh = snapshot
            .find(self.address())
            .ok_or_else(|| PresenceError::NotFound {
                address: self.address().clone(),
                process_id: self.process_id(),
            })?;
        self.raw = fresh.clone();
        Ok(())
    }
}

impl PartialEq for App {
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}

impl Eq for App {}
