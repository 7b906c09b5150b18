//! Bus configuration.
//!
//! Defaults reproduce the conservative behavior: the registry lock is held
//! for the whole of a publish, and subscriber panics reach the publisher.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use eventbus_core::{BusError, BusResult};

/// Environment variable selecting the [`LockPolicy`].
pub const LOCK_POLICY_ENV: &str = "EVENTBUS_LOCK_POLICY";

/// Environment variable selecting the [`PanicPolicy`].
pub const PANIC_POLICY_ENV: &str = "EVENTBUS_PANIC_POLICY";

/// How long `publish` holds the registry lock.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LockPolicy {
    /// Hold the lock through fan-out and join.
    ///
    /// The subscriber set cannot change while a publish is in flight, but a
    /// slow subscriber stalls every other bus operation, and a subscriber
    /// that calls back into the same bus deadlocks.
    #[default]
    HoldAcrossJoin,

    /// Hold the lock only while copying the subscriber set.
    ///
    /// Subscribers registered during a publish do not receive it; subscribers
    /// removed during a publish still do.
    SnapshotThenRelease,
}

impl FromStr for LockPolicy {
    type Err = BusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hold" | "hold-across-join" => Ok(Self::HoldAcrossJoin),
            "snapshot" | "snapshot-then-release" => Ok(Self::SnapshotThenRelease),
            _ => Err(BusError::invalid_lock_policy(s)),
        }
    }
}

/// What happens when a subscriber panics.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PanicPolicy {
    /// Let the panic through: once every invocation has been joined, the
    /// panic is resumed on the publishing thread with its original payload.
    #[default]
    Propagate,

    /// Catch the panic at the invocation boundary and log it. Other
    /// subscribers and the publisher are unaffected.
    Isolate,
}

impl FromStr for PanicPolicy {
    type Err = BusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "propagate" => Ok(Self::Propagate),
            "isolate" => Ok(Self::Isolate),
            _ => Err(BusError::invalid_panic_policy(s)),
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BusConfig {
    pub lock_policy: LockPolicy,
    pub panic_policy: PanicPolicy,
}

impl BusConfig {
    pub fn with_lock_policy(mut self, lock_policy: LockPolicy) -> Self {
        self.lock_policy = lock_policy;
        self
    }

    pub fn with_panic_policy(mut self, panic_policy: PanicPolicy) -> Self {
        self.panic_policy = panic_policy;
        self
    }

    /// Read the configuration from `EVENTBUS_LOCK_POLICY` / `EVENTBUS_PANIC_POLICY`.
    ///
    /// Unset or blank variables fall back to the defaults.
    pub fn from_env() -> BusResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> BusResult<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup(LOCK_POLICY_ENV).filter(|v| !v.trim().is_empty()) {
            config.lock_policy = raw.parse()?;
        }
        if let Some(raw) = lookup(PANIC_POLICY_ENV).filter(|v| !v.trim().is_empty()) {
            config.panic_policy = raw.parse()?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_hold_lock_and_propagate() {
        let config = BusConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, BusConfig::default());
        assert_eq!(config.lock_policy, LockPolicy::HoldAcrossJoin);
        assert_eq!(config.panic_policy, PanicPolicy::Propagate);
    }

    #[test]
    fn reads_both_policies() {
        let config = BusConfig::from_lookup(lookup_from(&[
            (LOCK_POLICY_ENV, "Snapshot"),
            (PANIC_POLICY_ENV, " isolate "),
        ]))
        .unwrap();

        assert_eq!(config.lock_policy, LockPolicy::SnapshotThenRelease);
        assert_eq!(config.panic_policy, PanicPolicy::Isolate);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = BusConfig::from_lookup(lookup_from(&[(LOCK_POLICY_ENV, "  ")])).unwrap();
        assert_eq!(config.lock_policy, LockPolicy::HoldAcrossJoin);
    }

    #[test]
    fn unknown_values_are_rejected() {
        let err = BusConfig::from_lookup(lookup_from(&[(LOCK_POLICY_ENV, "never")])).unwrap_err();
        assert_eq!(err, BusError::InvalidLockPolicy("never".to_string()));

        let err = "swallow".parse::<PanicPolicy>().unwrap_err();
        assert!(matches!(err, BusError::InvalidPanicPolicy(_)));
    }

    #[test]
    fn long_policy_names_parse() {
        assert_eq!(
            "hold-across-join".parse::<LockPolicy>().unwrap(),
            LockPolicy::HoldAcrossJoin
        );
        assert_eq!(
            "snapshot-then-release".parse::<LockPolicy>().unwrap(),
            LockPolicy::SnapshotThenRelease
        );
    }

    #[test]
    fn deserializes_partial_config() {
        let config: BusConfig = serde_json::from_str(r#"{ "panic-policy": "isolate" }"#).unwrap();
        assert_eq!(config.lock_policy, LockPolicy::HoldAcrossJoin);
        assert_eq!(config.panic_policy, PanicPolicy::Isolate);
    }
}
