//! Freshness window applied to every envelope before any cryptographic check.

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::envelope::Timestamp;

pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(300);
pub const DEFAULT_MAX_CLOCK_SKEW: Duration = Duration::from_secs(30);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Inactive,
}

/// How far a signature timestamp may lag behind or run ahead of the verifier's clock.
///
/// Both bounds are inclusive and counted in whole seconds. In configuration files they are given
/// as `max_age_secs` and `max_clock_skew_secs`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreshnessPolicy {
    #[serde(rename = "max_age_secs", with = "seconds")]
    pub max_age: Duration,
    #[serde(rename = "max_clock_skew_secs", with = "seconds")]
    pub max_clock_skew: Duration,
}

impl FreshnessPolicy {
    pub fn new(max_age: Duration, max_clock_skew: Duration) -> Self {
        Self {
            max_age,
            max_clock_skew,
        }
    }

    pub fn check(&self, timestamp: Timestamp, now: Timestamp) -> Freshness {
        check(timestamp, now, self.max_age, self.max_clock_skew)
    }
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_AGE, DEFAULT_MAX_CLOCK_SKEW)
    }
}

/// `Fresh` iff `now - max_age <= timestamp <= now + max_clock_skew`.
pub fn check(
    timestamp: Timestamp,
    now: Timestamp,
    max_age: Duration,
    max_clock_skew: Duration,
) -> Freshness {
    let earliest = now.saturating_sub(max_age);
    let latest = now.saturating_add(max_clock_skew);
    match earliest <= timestamp && timestamp <= latest {
        true => Freshness::Fresh,
        false => Freshness::Inactive,
    }
}

mod seconds {
    use core::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
