//! Zero-copy SIP message core for rvoip
//!
//! This crate holds the message layer of the stack: byte views over received
//! buffers, requests and responses with tiered header storage, single-pass
//! serialization with a finalize cache, and transaction key derivation.
//!
//! ```rust
//! use rvoip_sip_message::prelude::*;
//!
//! let raw = "SIP/2.0 180 Ringing\r\n\
//!            Via: SIP/2.0/UDP pc33.atlanta.com;branch=z9hG4bK776asdhds\r\n\
//!            To: Bob <sip:bob@biloxi.com>;tag=a6c85cf\r\n\
//!            From: Alice <sip:alice@atlanta.com>;tag=1928301774\r\n\
//!            Call-ID: a84b4c76e66710@pc33.atlanta.com\r\n\
//!            CSeq: 314159 INVITE\r\n\
//!            Content-Length: 0\r\n\
//!            \r\n";
//! let message = parse_message(raw, Default::default()).unwrap();
//! assert!(!message.is_request());
//! assert_eq!(message.core().cseq_number(), 314159);
//! ```

// Declare modules
pub mod config;
pub mod error;
pub mod message;
pub mod parser;
pub mod transaction;
pub mod types;

// Re-export key public items
pub use config::CoreConfig;
pub use error::{Error, Result};
pub use message::{Message, MessageCore, MessageFactory, Request, Response, SipMessage};
pub use parser::parse_message;
pub use transaction::{KeyAlgorithm, KeyContext, TransactionKey, TransactionKeyBuilder};
pub use types::{ByteView, Header, HeaderId, HeaderName, HeaderValue};

/// Re-export of common types and functions
pub mod prelude {
    pub use crate::config::CoreConfig;
    pub use crate::error::{Error, Result};
    pub use crate::message::{Message, MessageCore, MessageFactory, Request, Response, SipMessage};
    pub use crate::parser::{parse_message, MessageListener};
    pub use crate::transaction::{KeyAlgorithm, KeyContext, TransactionKey, TransactionKeyBuilder};
    pub use crate::types::{ByteView, CSeq, Header, HeaderId, HeaderName, HeaderValue, NameAddr, Via};
}
