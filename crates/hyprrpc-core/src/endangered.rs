//! EndangeredRegistry - 消失疑いのアプリと猶予カウンタ
//!
//! # フロー（1 回の sweep で liveness check に失敗したとき）
//! 1. 未登録なら counter = max で登録（ENDANGERED を発火する契機）
//! 2. 登録済みなら counter を 1 減らす
//! 3. counter が負になったら registry から外し、cache から purge する
//!
//! max = 3 なら 3, 2, 1, 0, -1 と進み、5 回連続で失敗した sweep で purge されます。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::Address;

/// liveness check に成功したアプリの counter をどう扱うか
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GracePolicy {
    /// 成功しても counter はそのまま（一度の取りこぼしがカウントダウンに残る）
    #[default]
    Countdown,
    /// 成功したら registry から外す（次の失敗で max から数え直す）
    ResetOnRecovery,
}

/// Result of recording one missed liveness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissMark {
    /// First miss: the app just entered the registry.
    Armed { remaining: i32 },
    /// Already endangered; the counter was decremented.
    Decremented { remaining: i32 },
    /// Counter went negative; the app left the registry and must be purged.
    Expired { newly_endangered: bool },
}

#[derive(Debug, Default)]
pub struct EndangeredRegistry {
    counters: HashMap<Address, i32>,
}

impl EndangeredRegistry {
    pub fn new() -> Self {
        Self {
            counters: HashMap::new(),
        }
    }

    pub fn mark_missing(&mut self, address: &Address, max_timeout: i32) -> MissMark {
        let (remaining, armed) = match self.counters.get_mut(address) {
            Some(counter) => {
                *counter -= 1;
                (*counter, false)
            }
            None => {
                self.counters.insert(address.clone(), max_timeout);
                (max_timeout, true)
            }
        };

        if remaining < 0 {
            self.counters.remove(address);
            return MissMark::Expired {
                newly_endangered: armed,
            };
        }

        if armed {
            MissMark::Armed { remaining }
        } else {
            MissMark::Decremented { remaining }
        }
    }

    /// Records a passed liveness check. Returns `true` if the app left the registry.
    pub fn mark_alive(&mut self, address: &Address, policy: GracePolicy) -> bool {
        match policy {
            GracePolicy::Countdown => false,
            GracePolicy::ResetOnRecovery => self.counters.remove(address).is_some(),
        }
    }

    /// Drops any counter for `address` (used when an app leaves the cache).
    pub fn forget(&mut self, address: &Address) -> bool {
        self.counters.remove(address).is_some()
    }

    pub fn is_endangered(&self, address: &Address) -> bool {
        self.counters.contains_key(address)
    }

    pub fn remaining(&self, address: &Address) -> Option<i32> {
        self.counters.get(address).copied()
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn counter_walks_down_and_expires_on_fifth_miss() {
        let mut registry = EndangeredRegistry::new();
        let addr = Address::from("0x1");

        assert_eq!(registry.mark_missing(&addr, 3), MissMark::Armed { remaining: 3 });
        assert_eq!(registry.mark_missing(&addr, 3), MissMark::Decremented { remaining: 2 });
        assert_eq!(registry.mark_missing(&addr, 3), MissMark::Decremented { remaining: 1 });
        assert_eq!(registry.mark_missing(&addr, 3), MissMark::Decremented { remaining: 0 });
        assert!(registry.is_endangered(&addr));

        assert_eq!(
            registry.mark_missing(&addr, 3),
            MissMark::Expired {
                newly_endangered: false
            }
        );
        assert!(!registry.is_endangered(&addr));
    }

    #[rstest]
    #[case(0, 2)]
    #[case(1, 3)]
    #[case(3, 5)]
    #[case(5, 7)]
    fn expires_after_max_plus_two_misses(#[case] max_timeout: i32, #[case] expected_misses: usize) {
        let mut registry = EndangeredRegistry::new();
        let addr = Address::from("0x1");

        let mut misses = 0;
        loop {
            misses += 1;
            if matches!(registry.mark_missing(&addr, max_timeout), MissMark::Expired { .. }) {
                break;
            }
        }
        assert_eq!(misses, expected_misses);
    }

    #[test]
    fn negative_max_expires_immediately() {
        let mut registry = EndangeredRegistry::new();
        let addr = Address::from("0x1");
        assert_eq!(
            registry.mark_missing(&addr, -1),
            MissMark::Expired {
                newly_endangered: true
            }
        );
        assert!(registry.is_empty());
    }

    #[rstest]
    #[case(GracePolicy::Countdown, Some(2))]
    #[case(GracePolicy::ResetOnRecovery, None)]
    fn passing_check_depends_on_policy(#[case] policy: GracePolicy, #[case] expected: Option<i32>) {
        let mut registry = EndangeredRegistry::new();
        let addr = Address::from("0x1");
        registry.mark_missing(&addr, 3);
        registry.mark_missing(&addr, 3);

        registry.mark_alive(&addr, policy);

        assert_eq!(registry.remaining(&addr), expected);
    }

    #[test]
    fn miss_hit_miss_is_distinguishable_between_policies() {
        let addr = Address::from("0x1");

        let mut countdown = EndangeredRegistry::new();
        countdown.mark_missing(&addr, 3);
        countdown.mark_alive(&addr, GracePolicy::Countdown);
        let after = countdown.mark_missing(&addr, 3);
        assert_eq!(after, MissMark::Decremented { remaining: 2 });

        let mut reset = EndangeredRegistry::new();
        reset.mark_missing(&addr, 3);
        reset.mark_alive(&addr, GracePolicy::ResetOnRecovery);
        let after = reset.mark_missing(&addr, 3);
        assert_eq!(after, MissMark::Armed { remaining: 3 });
    }
}
