//! Subscription identifiers.
//!
//! # ULID ベースの ID
//! `EventBus::connect` が返すハンドルです。ULID は生成順でソートできるので、
//! 同じ event kind に登録された handler の登録順をそのまま表現できます。

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// SubscriptionId は EventBus に登録された handler 1 つを識別する
///
/// `disconnect()` に渡すと handler を取り外せます。
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(Ulid);

impl SubscriptionId {
    /// 新しい ID を生成
    pub fn generate() -> Self {
        Self(Ulid::new())
    }

    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl From<Ulid> for SubscriptionId {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}
