//! Runtime configuration
//!
//! Defaults, optionally overridden by a JSON document or by environment
//! variables:
//!
//! | Variable                  | Field              |
//! |---------------------------|--------------------|
//! | `BANKER_JOURNAL_CAPACITY` | `journal_capacity` |
//! | `BANKER_CHECK_INVARIANTS` | `check_invariants` |

use serde::{Deserialize, Serialize};

use crate::error::BankerResult;
use crate::journal::DEFAULT_JOURNAL_CAPACITY;

/// Environment variable for [`BankerConfig::journal_capacity`]
pub const ENV_JOURNAL_CAPACITY: &str = "BANKER_JOURNAL_CAPACITY";
/// Environment variable for [`BankerConfig::check_invariants`]
pub const ENV_CHECK_INVARIANTS: &str = "BANKER_CHECK_INVARIANTS";

/// Allocator runtime settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BankerConfig {
    /// Journal events kept in memory
    pub journal_capacity: usize,
    /// Re-check state invariants and conservation before every commit
    pub check_invariants: bool,
}

impl Default for BankerConfig {
    fn default() -> Self {
        Self {
            journal_capacity: DEFAULT_JOURNAL_CAPACITY,
            check_invariants: cfg!(debug_assertions),
        }
    }
}

impl BankerConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Parse a JSON config; missing fields keep their defaults.
    pub fn from_json(text: &str) -> BankerResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Apply overrides from `lookup`. Unparseable values are logged and
    /// ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = lookup(ENV_JOURNAL_CAPACITY) {
            match raw.trim().parse::<usize>() {
                Ok(capacity) if capacity > 0 => self.journal_capacity = capacity,
                _ => log::warn!("ignoring {}={:?}: expected a positive integer", ENV_JOURNAL_CAPACITY, raw),
            }
        }

        if let Some(raw) = lookup(ENV_CHECK_INVARIANTS) {
            match parse_flag(&raw) {
                Some(flag) => self.check_invariants = flag,
                None => log::warn!("ignoring {}={:?}: expected true/false", ENV_CHECK_INVARIANTS, raw),
            }
        }

        self
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = BankerConfig::default();
        assert_eq!(config.journal_capacity, DEFAULT_JOURNAL_CAPACITY);
        assert_eq!(config.check_invariants, cfg!(debug_assertions));
    }

    #[test]
    fn test_overrides_apply() {
        let config = BankerConfig::default().with_overrides(lookup(&[
            (ENV_JOURNAL_CAPACITY, "64"),
            (ENV_CHECK_INVARIANTS, "off"),
        ]));
        assert_eq!(config.journal_capacity, 64);
        assert!(!config.check_invariants);
    }

    #[test]
    fn test_invalid_overrides_are_ignored() {
        let config = BankerConfig::default().with_overrides(lookup(&[
            (ENV_JOURNAL_CAPACITY, "0"),
            (ENV_CHECK_INVARIANTS, "maybe"),
        ]));
        assert_eq!(config, BankerConfig::default());
    }

    #[test]
    fn test_from_json_partial() {
        let config = BankerConfig::from_json(r#"{"journal_capacity": 5}"#).unwrap();
        assert_eq!(config.journal_capacity, 5);
        assert_eq!(config.check_invariants, cfg!(debug_assertions));

        assert!(BankerConfig::from_json("[]").is_err());
    }
}
