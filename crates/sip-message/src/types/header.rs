//! # Headers
//!
//! A [`Header`] pairs a [`HeaderName`] with a [`HeaderValue`]. Values arrive
//! from the parser as raw spans over the inbound buffer and are given
//! structure only when someone asks for it ([`Header::parse`]).
//!
//! Equality is semantic: names ignore case, and values are compared in their
//! parsed form when both sides parse, or with linear whitespace collapsed
//! otherwise.
//!
//! ## Examples
//!
//! ```rust
//! use rvoip_sip_message::types::{Header, HeaderId, HeaderValue};
//!
//! let raw = Header::new("v", "SIP/2.0/UDP pc33.atlanta.com;branch=z9hG4bK776asdhds");
//! assert_eq!(raw.id(), Some(HeaderId::Via));
//! assert!(!raw.is_parsed());
//!
//! let parsed = raw.parse().unwrap();
//! match parsed.value() {
//!     HeaderValue::Via(via) => assert_eq!(via.branch().unwrap(), &"z9hG4bK776asdhds"),
//!     other => panic!("unexpected value {:?}", other),
//! }
//! assert_eq!(raw, parsed);
//! ```

use std::borrow::Cow;
use std::fmt;

use bytes::{BufMut, BytesMut};

use super::byte_view::ByteView;
use super::cseq::CSeq;
use super::header_id::{HeaderId, HeaderName};
use super::name_addr::NameAddr;
use super::via::Via;
use crate::error::Result;
use crate::parser::values;
use crate::parser::whitespace::normalize_lws;

/// Value of a header, raw or structured
#[derive(Debug, Clone)]
pub enum HeaderValue {
    /// Unparsed span, exactly as received or set
    Raw(ByteView),
    /// One Via entry
    Via(Via),
    /// An address (To, From, Contact, Route, ...)
    NameAddr(NameAddr),
    /// CSeq number and method
    CSeq(CSeq),
    /// A numeric value (Max-Forwards, Expires, Content-Length, ...)
    Number(u64),
}

impl HeaderValue {
    pub fn is_raw(&self) -> bool {
        matches!(self, HeaderValue::Raw(_))
    }

    /// Wire form of the value.
    pub fn to_bytes(&self) -> Cow<'_, [u8]> {
        match self {
            HeaderValue::Raw(raw) => Cow::Borrowed(raw.as_bytes()),
            _ => {
                let mut buf = BytesMut::new();
                self.encode(&mut buf);
                Cow::Owned(buf.to_vec())
            }
        }
    }

    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        match self {
            HeaderValue::Raw(raw) => buf.put_slice(raw.as_bytes()),
            HeaderValue::Via(via) => via.encode(buf),
            HeaderValue::NameAddr(addr) => addr.encode(buf),
            HeaderValue::CSeq(cseq) => cseq.encode(buf),
            HeaderValue::Number(n) => buf.put_slice(n.to_string().as_bytes()),
        }
    }

    fn equivalent(&self, other: &HeaderValue) -> bool {
        match (self, other) {
            (HeaderValue::Raw(a), HeaderValue::Raw(b)) => {
                a == b || normalize_lws(a.as_bytes()) == normalize_lws(b.as_bytes())
            }
            (HeaderValue::Via(a), HeaderValue::Via(b)) => a == b,
            (HeaderValue::NameAddr(a), HeaderValue::NameAddr(b)) => a == b,
            (HeaderValue::CSeq(a), HeaderValue::CSeq(b)) => a == b,
            (HeaderValue::Number(a), HeaderValue::Number(b)) => a == b,
            _ => false,
        }
    }
}

/// How a known header's raw value is given structure
fn value_grammar(id: HeaderId) -> Grammar {
    match id {
        HeaderId::Via => Grammar::Via,
        HeaderId::To
        | HeaderId::From
        | HeaderId::Contact
        | HeaderId::Route
        | HeaderId::RecordRoute
        | HeaderId::RemotePartyId
        | HeaderId::Diversion
        | HeaderId::PAssertedIdentity
        | HeaderId::PAssociatedUri
        | HeaderId::PCalledPartyId
        | HeaderId::ServiceRoute
        | HeaderId::Path
        | HeaderId::ReplyTo
        | HeaderId::ReferTo
        | HeaderId::ReferredBy => Grammar::NameAddr,
        HeaderId::CSeq => Grammar::CSeq,
        HeaderId::MaxForwards
        | HeaderId::Expires
        | HeaderId::MinExpires
        | HeaderId::ContentLength
        | HeaderId::RSeq => Grammar::Number,
        _ => Grammar::Opaque,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grammar {
    Via,
    NameAddr,
    CSeq,
    Number,
    Opaque,
}

/// A header name and its value
#[derive(Debug, Clone)]
pub struct Header {
    name: HeaderName,
    value: HeaderValue,
}

impl Header {
    /// Creates a header with a raw value.
    pub fn new(name: impl Into<HeaderName>, value: impl Into<ByteView>) -> Self {
        Header {
            name: name.into(),
            value: HeaderValue::Raw(value.into()),
        }
    }

    /// Creates a header with an already structured value.
    pub fn with_value(name: impl Into<HeaderName>, value: HeaderValue) -> Self {
        Header {
            name: name.into(),
            value,
        }
    }

    pub fn via(via: Via) -> Self {
        Header::with_value(HeaderId::Via, HeaderValue::Via(via))
    }

    pub fn name_addr(id: HeaderId, addr: NameAddr) -> Self {
        Header::with_value(id, HeaderValue::NameAddr(addr))
    }

    pub fn name(&self) -> &HeaderName {
        &self.name
    }

    /// Known identity, `None` for extension headers.
    pub fn id(&self) -> Option<HeaderId> {
        self.name.id()
    }

    pub fn value(&self) -> &HeaderValue {
        &self.value
    }

    pub fn into_value(self) -> HeaderValue {
        self.value
    }

    /// Returns `false` while the value is still a raw span. Headers without a
    /// grammar of their own count as parsed.
    pub fn is_parsed(&self) -> bool {
        match (&self.value, self.id()) {
            (HeaderValue::Raw(_), Some(id)) => value_grammar(id) == Grammar::Opaque,
            _ => true,
        }
    }

    /// Returns the structured form of this header, parsing a raw value when its
    /// identity has a grammar. Grammar errors are reported, never dropped.
    pub fn parse(&self) -> Result<Header> {
        Ok(Header {
            name: self.name.clone(),
            value: self.parsed_value()?.into_owned(),
        })
    }

    /// Parses the value in place.
    pub fn parse_in_place(&mut self) -> Result<()> {
        if let Cow::Owned(value) = self.parsed_value()? {
            self.value = value;
        }
        Ok(())
    }

    /// Structured value, borrowed when nothing had to be parsed.
    pub fn parsed_value(&self) -> Result<Cow<'_, HeaderValue>> {
        let raw = match &self.value {
            HeaderValue::Raw(raw) => raw,
            _ => return Ok(Cow::Borrowed(&self.value)),
        };
        let grammar = self.id().map_or(Grammar::Opaque, value_grammar);
        let value = match grammar {
            Grammar::Opaque => return Ok(Cow::Borrowed(&self.value)),
            Grammar::Via => HeaderValue::Via(Via::parse(raw)?),
            Grammar::NameAddr if self.id() == Some(HeaderId::Contact) && raw.trim() == "*" => {
                return Ok(Cow::Borrowed(&self.value));
            }
            Grammar::NameAddr => HeaderValue::NameAddr(NameAddr::parse(raw)?),
            Grammar::CSeq => HeaderValue::CSeq(CSeq::parse(raw)?),
            Grammar::Number => {
                let (_, n) = values::number_value(raw.as_bytes())?;
                HeaderValue::Number(n)
            }
        };
        Ok(Cow::Owned(value))
    }

    /// The Via value, parsing it if needed
    pub fn as_via(&self) -> Option<Cow<'_, Via>> {
        match self.parsed_value().ok()? {
            Cow::Borrowed(HeaderValue::Via(via)) => Some(Cow::Borrowed(via)),
            Cow::Owned(HeaderValue::Via(via)) => Some(Cow::Owned(via)),
            _ => None,
        }
    }

    /// The address value, parsing it if needed
    pub fn as_name_addr(&self) -> Option<Cow<'_, NameAddr>> {
        match self.parsed_value().ok()? {
            Cow::Borrowed(HeaderValue::NameAddr(addr)) => Some(Cow::Borrowed(addr)),
            Cow::Owned(HeaderValue::NameAddr(addr)) => Some(Cow::Owned(addr)),
            _ => None,
        }
    }

    /// Writes `Name: value\r\n`.
    pub(crate) fn encode_line(&self, buf: &mut BytesMut, compact: bool) {
        buf.put_slice(self.name.wire_name(compact));
        buf.put_slice(b": ");
        self.value.encode(buf);
        buf.put_slice(b"\r\n");
    }
}

impl PartialEq for Header {
    fn eq(&self, other: &Self) -> bool {
        if self.name != other.name {
            return false;
        }
        match (self.parsed_value(), other.parsed_value()) {
            (Ok(a), Ok(b)) => a.equivalent(&b),
            _ => normalize_lws(&self.value.to_bytes()) == normalize_lws(&other.value.to_bytes()),
        }
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}",
            self.name,
            String::from_utf8_lossy(&self.value.to_bytes())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lazy_parse() {
        let h = Header::new(HeaderId::To, "Bob <sip:bob@biloxi.com>;tag=a6c85cf");
        assert!(!h.is_parsed());
        let parsed = h.parse().unwrap();
        assert!(parsed.is_parsed());
        assert_eq!(parsed.as_name_addr().unwrap().tag().unwrap(), &"a6c85cf");
        // The raw header still answers structured queries.
        assert_eq!(h.as_name_addr().unwrap().tag().unwrap(), &"a6c85cf");
    }

    #[test]
    fn test_grammar_errors_are_reported() {
        let h = Header::new(HeaderId::Via, "garbage");
        assert!(h.parse().is_err());
        let h = Header::new(HeaderId::MaxForwards, "seventy");
        assert!(h.parse().is_err());
        // Extension headers have no grammar.
        let h = Header::new("X-Anything", "!!! ,,, <<<");
        assert!(h.parse().is_ok());
    }

    #[test]
    fn test_contact_star() {
        let h = Header::new(HeaderId::Contact, "*");
        assert!(h.parse().is_ok());
    }

    #[test]
    fn test_equality_is_semantic() {
        let a = Header::new("Max-Forwards", "70");
        let b = Header::new("max-forwards", " 70 ");
        assert_eq!(a, b);

        let a = Header::new("Subject", "lunch   plans");
        let b = Header::new("s", "lunch\r\n plans");
        assert_eq!(a, b);

        let a = Header::new("X-Trace", "one");
        let b = Header::new("x-trace", "two");
        assert_ne!(a, b);
    }

    #[test]
    fn test_display() {
        let h = Header::with_value(HeaderId::CSeq, HeaderValue::CSeq(CSeq::new(1, "BYE")));
        assert_eq!(h.to_string(), "CSeq: 1 BYE");
        let mut line = BytesMut::new();
        Header::new(HeaderId::CallId, "abc").encode_line(&mut line, true);
        assert_eq!(&line[..], b"i: abc\r\n");
    }
}
