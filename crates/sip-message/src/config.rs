//! Configuration for the message core
//!
//! [`CoreConfig`] is an immutable snapshot established once at startup and
//! shared as `Arc<CoreConfig>` by the [`MessageFactory`](crate::message::MessageFactory),
//! every message it creates and the
//! [`TransactionKeyBuilder`](crate::transaction::TransactionKeyBuilder).
//! There is no runtime reconfiguration: a new snapshot only affects
//! messages created from it.
//!
//! ## Quick Start
//!
//! ```rust
//! use rvoip_sip_message::config::CoreConfig;
//! use rvoip_sip_message::transaction::KeyAlgorithm;
//!
//! let config = CoreConfig::default()
//!     .with_compact_headers()
//!     .with_key_policy(KeyAlgorithm::Classic)
//!     .with_default_max_forwards(Some(32));
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.hot_priority_level, 13);
//! ```
//!
//! ## Loading from JSON
//!
//! ```rust
//! use rvoip_sip_message::config::CoreConfig;
//!
//! let config = CoreConfig::from_json(r#"{ "hot_priority_level": 20, "compact_headers": true }"#).unwrap();
//! assert_eq!(config.hot_priority_level, 20);
//! assert_eq!(config.default_max_forwards, Some(70));
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::transaction::{KeyAlgorithm, KeyContext};
use crate::types::HOT_SLOT_CAPACITY;

/// Max-Forwards inserted into requests that lack one (RFC 3261 §8.1.1.6)
pub const DEFAULT_MAX_FORWARDS: u32 = 70;

/// Default number of header identities stored in hot slots
pub const DEFAULT_HOT_PRIORITY_LEVEL: usize = 13;

/// Message core configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Header identities whose priority is below this level get a
    /// direct-indexed hot slot; the rest go to the overflow list.
    ///
    /// Ranges from 0 (everything in overflow) to
    /// [`HOT_SLOT_CAPACITY`](crate::types::HOT_SLOT_CAPACITY).
    pub hot_priority_level: usize,

    /// Preferred transaction key algorithm
    pub key_policy: KeyAlgorithm,

    /// Max-Forwards value inserted into requests at finalization when the
    /// header is missing. `None` disables insertion.
    pub default_max_forwards: Option<u32>,

    /// Serialize headers under their single-letter compact names
    pub compact_headers: bool,

    /// Matching flags given to new transaction keys
    pub key_context: KeyContext,

    /// Extension header folded into classic keys when matching incoming
    /// messages (see [`KeyContext::INCOMING`])
    pub uniquifier_header: Option<String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            hot_priority_level: DEFAULT_HOT_PRIORITY_LEVEL,
            key_policy: KeyAlgorithm::BranchCookie,
            default_max_forwards: Some(DEFAULT_MAX_FORWARDS),
            compact_headers: false,
            key_context: KeyContext::default(),
            uniquifier_header: None,
        }
    }
}

impl CoreConfig {
    /// Set how many header identities get hot slots
    pub fn with_hot_priority_level(mut self, level: usize) -> Self {
        self.hot_priority_level = level;
        self
    }

    /// Set the preferred transaction key algorithm
    pub fn with_key_policy(mut self, policy: KeyAlgorithm) -> Self {
        self.key_policy = policy;
        self
    }

    /// Set (or disable with `None`) the default Max-Forwards
    pub fn with_default_max_forwards(mut self, max_forwards: Option<u32>) -> Self {
        self.default_max_forwards = max_forwards;
        self
    }

    /// Serialize with compact header names
    pub fn with_compact_headers(mut self) -> Self {
        self.compact_headers = true;
        self
    }

    /// Set the matching flags of new transaction keys
    pub fn with_key_context(mut self, context: KeyContext) -> Self {
        self.key_context = context;
        self
    }

    /// Fold `header` into classic keys of incoming messages
    pub fn with_uniquifier_header(mut self, header: impl Into<String>) -> Self {
        self.uniquifier_header = Some(header.into());
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.hot_priority_level > HOT_SLOT_CAPACITY {
            return Err(Error::InvalidConfig(format!(
                "hot_priority_level {} exceeds the {} available slots",
                self.hot_priority_level, HOT_SLOT_CAPACITY
            )));
        }

        if self.default_max_forwards == Some(0) {
            return Err(Error::InvalidConfig(
                "default_max_forwards must be greater than 0".to_string(),
            ));
        }

        if let Some(header) = &self.uniquifier_header {
            let valid = !header.is_empty()
                && header
                    .bytes()
                    .all(crate::parser::values::is_token_char);
            if !valid {
                return Err(Error::InvalidConfig(format!(
                    "uniquifier_header {:?} is not a header name",
                    header
                )));
            }
        }

        debug!(
            hot_priority_level = self.hot_priority_level,
            key_policy = ?self.key_policy,
            compact = self.compact_headers,
            "message core configuration validated"
        );
        Ok(())
    }

    /// Load and validate a snapshot from JSON. Missing fields take their
    /// defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: CoreConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the snapshot as JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CoreConfig::default();
        assert_eq!(config.hot_priority_level, 13);
        assert_eq!(config.key_policy, KeyAlgorithm::BranchCookie);
        assert_eq!(config.default_max_forwards, Some(70));
        assert!(!config.compact_headers);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_errors() {
        let config = CoreConfig::default().with_hot_priority_level(HOT_SLOT_CAPACITY + 1);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let config = CoreConfig::default().with_default_max_forwards(Some(0));
        assert!(config.validate().is_err());

        let config = CoreConfig::default().with_uniquifier_header("Bad Header:");
        assert!(config.validate().is_err());

        let config = CoreConfig::default().with_hot_priority_level(0).with_default_max_forwards(None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_round_trip() {
        let config = CoreConfig::default()
            .with_key_policy(KeyAlgorithm::Classic)
            .with_key_context(KeyContext::USE_VIA | KeyContext::INCOMING)
            .with_uniquifier_header("X-Uniq");
        let json = config.to_json().unwrap();
        assert_eq!(CoreConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_json_errors() {
        assert!(matches!(CoreConfig::from_json("{ not json"), Err(Error::InvalidConfig(_))));
        assert!(CoreConfig::from_json(r#"{ "hot_priority_level": 99 }"#).is_err());
    }
}
