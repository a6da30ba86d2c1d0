//! # SIP Via header value
//!
//! One Via entry ([RFC 3261 §20.42](https://datatracker.ietf.org/doc/html/rfc3261#section-20.42)):
//!
//! ```text
//! Via: SIP/2.0/UDP pc33.atlanta.com:5060;branch=z9hG4bK776asdhds
//! ```
//!
//! The `branch` parameter identifies the transaction. When it starts with the
//! magic cookie `z9hG4bK` the sender promises it is unique, and the branch
//! alone can serve as a transaction key.
//!
//! ## Examples
//!
//! ```rust
//! use rvoip_sip_message::types::{ByteView, Via};
//!
//! let via = Via::parse(&ByteView::from_static(
//!     b"SIP/2.0/UDP pc33.atlanta.com;branch=z9hG4bK776asdhds",
//! )).unwrap();
//! assert_eq!(via.transport(), &"UDP");
//! assert!(via.has_magic_cookie());
//! ```

use std::fmt;

use bytes::{BufMut, BytesMut};

use super::byte_view::ByteView;
use super::param::{Param, Params};
use super::token_table::MAGIC_COOKIE;
use crate::error::{Error, Result};
use crate::parser::values;

/// One entry of a Via header
#[derive(Debug, Clone)]
pub struct Via {
    protocol: ByteView,
    transport: ByteView,
    host: ByteView,
    port: Option<u16>,
    params: Params,
}

impl Via {
    /// Creates a `SIP/2.0/<transport>` entry with a branch parameter.
    pub fn new(
        transport: impl Into<ByteView>,
        host: impl Into<ByteView>,
        port: Option<u16>,
        branch: impl Into<ByteView>,
    ) -> Self {
        let mut params = Params::new();
        params.set(Param::branch(branch));
        Via {
            protocol: ByteView::from_static(b"SIP/2.0").interned(),
            transport: transport.into().interned(),
            host: host.into(),
            port,
            params,
        }
    }

    /// Parses one via-parm, keeping every component as a view into `value`.
    pub fn parse(value: &ByteView) -> Result<Via> {
        let (_, raw) = values::complete(value.as_bytes(), values::via_parm)?;
        Ok(Via {
            protocol: value.slice_ref(raw.protocol).interned(),
            transport: value.slice_ref(raw.transport).interned(),
            host: value.slice_ref(raw.host),
            port: raw.port,
            params: Params::from_raw(value, &raw.params),
        })
    }

    /// Protocol name and version, normally `SIP/2.0`
    pub fn protocol(&self) -> &ByteView {
        &self.protocol
    }

    pub fn transport(&self) -> &ByteView {
        &self.transport
    }

    /// sent-by host
    pub fn host(&self) -> &ByteView {
        &self.host
    }

    /// sent-by port, if present
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    /// The branch parameter value
    pub fn branch(&self) -> Option<&ByteView> {
        self.params.value_of(b"branch")
    }

    /// Returns `true` if the branch begins with `z9hG4bK`.
    pub fn has_magic_cookie(&self) -> bool {
        self.branch().map_or(false, |b| b.starts_with(MAGIC_COOKIE))
    }

    pub fn received(&self) -> Option<&ByteView> {
        self.params.value_of(b"received")
    }

    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        buf.put_slice(self.protocol.as_bytes());
        buf.put_u8(b'/');
        buf.put_slice(self.transport.as_bytes());
        buf.put_u8(b' ');
        buf.put_slice(self.host.as_bytes());
        if let Some(port) = self.port {
            buf.put_slice(format!(":{}", port).as_bytes());
        }
        self.params.encode(buf);
    }
}

/// Protocol, transport and host compare ignoring case; the port and every
/// parameter must match.
impl PartialEq for Via {
    fn eq(&self, other: &Self) -> bool {
        let protocol_eq = values::normalize_token(self.protocol.as_bytes())
            == values::normalize_token(other.protocol.as_bytes());
        protocol_eq
            && self.transport.equals_ignore_case(&other.transport)
            && self.host.equals_ignore_case(&other.host)
            && self.port == other.port
            && self.params == other.params
    }
}

impl Eq for Via {}

impl fmt::Display for Via {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = BytesMut::new();
        self.encode(&mut buf);
        f.write_str(&String::from_utf8_lossy(&buf))
    }
}

impl std::str::FromStr for Via {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Via::parse(&ByteView::from(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_views_into_source() {
        let source = ByteView::from_static(b"SIP/2.0/UDP pc33.atlanta.com:5060;branch=z9hG4bK776asdhds");
        let via = Via::parse(&source).unwrap();
        assert_eq!(via.host(), &"pc33.atlanta.com");
        assert_eq!(via.port(), Some(5060));
        assert_eq!(via.branch().unwrap(), &"z9hG4bK776asdhds");
        assert_eq!(via.branch().unwrap().buffer().as_ptr(), source.buffer().as_ptr());
        assert!(via.has_magic_cookie());
    }

    #[test]
    fn test_transport_is_interned() {
        let via: Via = "SIP/2.0/TCP client.biloxi.com;branch=776asdhds".parse().unwrap();
        assert!(via.transport().is_interned());
        assert!(!via.has_magic_cookie());
    }

    #[test]
    fn test_missing_branch() {
        let via: Via = "SIP/2.0/UDP 192.0.2.4".parse().unwrap();
        assert!(via.branch().is_none());
        assert!(!via.has_magic_cookie());
    }

    #[test]
    fn test_reject_garbage() {
        assert!("not a via".parse::<Via>().is_err());
        assert!("SIP/2.0/UDP host;branch=1 trailing".parse::<Via>().is_err());
    }

    #[test]
    fn test_display_and_equality() {
        let a = Via::new("UDP", "pc33.atlanta.com", Some(5060), "z9hG4bK1");
        assert_eq!(a.to_string(), "SIP/2.0/UDP pc33.atlanta.com:5060;branch=z9hG4bK1");
        let b: Via = "sip/2.0/udp PC33.atlanta.com:5060 ; branch=z9hG4bK1".parse().unwrap();
        assert_eq!(a, b);
    }
}
