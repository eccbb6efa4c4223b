//! TimeLedger - 初回観測時刻の記録
//!
//! append-only: 一度記録した key は上書きしません。

use std::collections::HashMap;
use std::time::Duration;

use crate::domain::Address;
use crate::error::PresenceError;
use crate::ports::Clock;

#[derive(Debug, Default)]
pub struct TimeLedger {
    records: HashMap<Address, u64>,
}

impl TimeLedger {
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
        }
    }

    /// Records `now_ms` for `address` unless a time is already recorded.
    ///
    /// Returns `true` when a new record was written.
    pub fn record(&mut self, address: &Address, now_ms: u64) -> bool {
        if self.records.contains_key(address) {
            return false;
        }
        self.records.insert(address.clone(), now_ms);
        true
    }

    pub fn record_now(&mut self, address: &Address, clock: &dyn Clock) -> bool {
        self.record(address, clock.monotonic_ms())
    }

    pub fn get_time(&self, address: &Address) -> Result<u64, PresenceError> {
        self.records
            .get(address)
            .copied()
            .ok_or_else(|| PresenceError::NotRecorded(address.clone()))
    }

    /// `now - recorded`, saturating at zero.
    pub fn get_time_since(&self, address: &Address, now_ms: u64) -> Result<Duration, PresenceError> {
        let recorded = self.get_time(address)?;
        Ok(Duration::from_millis(now_ms.saturating_sub(recorded)))
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.records.contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
