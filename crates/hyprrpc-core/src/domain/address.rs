//! Address - アプリケーションの識別子
//!
//! compositor が各ウィンドウに割り当てる不透明な文字列（例: `"0x55d1c2a0"`）を
//! そのまま identity として使います。
//!
//! # 設計原則
//! - 比較は常に値で行う（参照の同一性には依存しない）
//! - 中身の形式は解釈しない（hex かどうかも気にしない）

use serde::{Deserialize, Serialize};
use std::fmt;

/// Address は 1 つの生きているアプリケーションインスタンスを識別する
///
/// cache / endangered registry / time ledger のキーはすべてこの型です。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Address {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addresses_compare_by_value() {
        let a = Address::from("0x1");
        let b = Address::new(String::from("0x1"));
        assert_eq!(a, b);
        assert_ne!(a, Address::from("0x2"));
    }

    #[test]
    fn address_is_transparent_in_json() {
        let address: Address = serde_json::from_str("\"0x55d1c2a0\"").unwrap();
        assert_eq!(address.as_str(), "0x55d1c2a0");
        assert_eq!(serde_json::to_string(&address).unwrap(), "\"0x55d1c2a0\"");
    }
}
