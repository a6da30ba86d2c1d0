//! # Transaction keys
//!
//! A [`TransactionKey`] identifies the SIP transaction a message belongs to.
//! Two algorithms exist:
//!
//! - **Branch cookie** (RFC 3261): the top Via branch, which must start with
//!   `z9hG4bK`, plus the CSeq method.
//! - **Classic** (RFC 2543): a fingerprint of To, From, Call-ID, CSeq and,
//!   depending on the [`KeyContext`], Via, Request-URI and a configured
//!   uniquifier header.
//!
//! [`TransactionKeyBuilder`] derives keys from messages and caches the result
//! on the message. Asking for a branch cookie key on a message without a
//! cookie quietly yields a classic key.
//!
//! ```rust
//! use rvoip_sip_message::prelude::*;
//!
//! let raw = "INVITE sip:bob@biloxi.com SIP/2.0\r\n\
//!            Via: SIP/2.0/UDP pc33.atlanta.com;branch=z9hG4bK776asdhds\r\n\
//!            To: Bob <sip:bob@biloxi.com>\r\n\
//!            From: Alice <sip:alice@atlanta.com>;tag=1928301774\r\n\
//!            Call-ID: a84b4c76e66710@pc33.atlanta.com\r\n\
//!            CSeq: 314159 INVITE\r\n\
//!            \r\n";
//! let mut message = parse_message(raw, Default::default()).unwrap();
//! let key = message.transaction_key().unwrap();
//! assert_eq!(key.algorithm(), KeyAlgorithm::BranchCookie);
//! assert_eq!(key.to_string(), "z9hG4bK776asdhds");
//! ```

mod builder;
mod classic;
mod key;

pub use builder::TransactionKeyBuilder;
pub use key::{ClassicField, ClassicFingerprint, KeyAlgorithm, KeyContext, TransactionKey};
