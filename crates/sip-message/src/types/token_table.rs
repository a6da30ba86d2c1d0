//! Shared token singletons.
//!
//! Method names, transports, header names and the common parameter names are
//! seen in almost every message. The table maps their literal bytes to one
//! shared [`ByteView`] each so repeated tokens cost no allocation and can be
//! compared by identity. It is built once and is read-only afterwards, so
//! lookups need no synchronization.

use std::sync::OnceLock;

use super::byte_view::ByteView;
use super::header_id::HeaderId;

/// Category a registered token belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenCategory {
    /// Request method (`INVITE`, `ACK`, ...)
    Method,
    /// Transport literal in Via or URI parameters
    Transport,
    /// Full or compact header name
    HeaderName,
    /// Common header/URI parameter name
    Parameter,
    /// Protocol literals (`SIP/2.0`, the branch magic cookie, ...)
    Protocol,
}

/// RFC 3261 magic cookie that prefixes compliant Via branches.
pub const MAGIC_COOKIE: &[u8] = b"z9hG4bK";

/// Length of [`MAGIC_COOKIE`].
pub const MAGIC_COOKIE_COUNT: usize = 7;

pub const METHODS: &[&[u8]] = &[
    b"INVITE", b"ACK", b"BYE", b"CANCEL", b"OPTIONS", b"REGISTER", b"PRACK",
    b"SUBSCRIBE", b"NOTIFY", b"PUBLISH", b"INFO", b"REFER", b"MESSAGE", b"UPDATE",
];

pub const TRANSPORTS: &[&[u8]] = &[
    b"udp", b"tcp", b"tls", b"sctp", b"ws", b"wss",
    b"UDP", b"TCP", b"TLS", b"SCTP", b"WS", b"WSS",
    b"SIP/2.0/UDP", b"SIP/2.0/TCP", b"SIP/2.0/TLS", b"SIP/2.0/SCTP",
    b"SIP/2.0/WS", b"SIP/2.0/WSS",
];

pub const PARAMETERS: &[&[u8]] = &[
    b"tag", b"branch", b"transport", b"maddr", b"ttl", b"received", b"rport",
    b"lr", b"user", b"method", b"expires", b"q", b"comp", b"sigcomp", b"phone",
    b"ip", b"sip", b"sips", b"tel",
];

pub const PROTOCOL: &[&[u8]] = &[b"SIP/2.0", b"SIP", b"2.0", MAGIC_COOKIE];

/// Length-bucketed singleton table.
struct TokenTable {
    buckets: Vec<Vec<(ByteView, TokenCategory)>>,
}

impl TokenTable {
    fn build() -> Self {
        let mut table = TokenTable { buckets: Vec::new() };
        for m in METHODS {
            table.register(m, TokenCategory::Method);
        }
        for t in TRANSPORTS {
            table.register(t, TokenCategory::Transport);
        }
        for id in HeaderId::ALL {
            table.register(id.as_str().as_bytes(), TokenCategory::HeaderName);
            if let Some(compact) = id.compact_form() {
                table.register(compact.as_bytes(), TokenCategory::HeaderName);
            }
        }
        for p in PARAMETERS {
            table.register(p, TokenCategory::Parameter);
        }
        for p in PROTOCOL {
            table.register(p, TokenCategory::Protocol);
        }
        table
    }

    fn register(&mut self, token: &'static [u8], category: TokenCategory) {
        if self.find(token).is_some() {
            return;
        }
        let len = token.len();
        if self.buckets.len() <= len {
            self.buckets.resize_with(len + 1, Vec::new);
        }
        self.buckets[len].push((ByteView::from_static(token), category));
    }

    fn find(&self, bytes: &[u8]) -> Option<&(ByteView, TokenCategory)> {
        self.buckets
            .get(bytes.len())?
            .iter()
            .find(|(token, _)| token.as_bytes() == bytes)
    }
}

static TOKENS: OnceLock<TokenTable> = OnceLock::new();

fn table() -> &'static TokenTable {
    TOKENS.get_or_init(TokenTable::build)
}

/// Builds the table eagerly. Calling it before message processing starts keeps
/// the one-time construction off the first packet's path; lookups initialize
/// it lazily otherwise.
pub fn init() {
    let _ = table();
}

/// Returns the singleton registered for `bytes`, matching length then content.
pub fn lookup(bytes: &[u8]) -> Option<ByteView> {
    table().find(bytes).map(|(token, _)| token.clone())
}

/// Category of a registered token.
pub fn category_of(bytes: &[u8]) -> Option<TokenCategory> {
    table().find(bytes).map(|(_, category)| *category)
}

/// Number of registered tokens.
pub fn len() -> usize {
    table().buckets.iter().map(Vec::len).sum()
}
