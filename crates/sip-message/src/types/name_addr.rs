//! # Address values
//!
//! [`NameAddr`] is the value of To, From, Contact, Route, Record-Route and the
//! other address-carrying headers: an optional display name, a URI and header
//! parameters such as `tag`.
//!
//! The core does not interpret URI grammar beyond what transaction matching
//! needs; [`SipUriParts`] exposes scheme, user, host and port as views for the
//! URI collaborator.

use std::fmt;

use bytes::{BufMut, BytesMut};

use super::byte_view::ByteView;
use super::param::{Param, Params};
use crate::error::{Error, Result};
use crate::parser::values;

/// Scheme, user, host and port of a SIP URI, as views into the URI bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SipUriParts {
    pub scheme: ByteView,
    pub user: Option<ByteView>,
    pub host: ByteView,
    pub port: Option<u16>,
}

impl SipUriParts {
    /// Splits `uri`; returns `None` for URIs without a host part (`tel:`,
    /// `urn:` ...).
    pub fn parse(uri: &ByteView) -> Option<SipUriParts> {
        split_uri(uri).map(|(parts, _)| parts)
    }
}

/// `[display-name] <uri>;params` or `uri;params`
///
/// # Examples
///
/// ```rust
/// use rvoip_sip_message::types::{ByteView, NameAddr};
///
/// let to = NameAddr::parse(&ByteView::from_static(
///     b"Bob <sip:bob@biloxi.com>;tag=a6c85cf",
/// )).unwrap();
/// assert_eq!(to.tag().unwrap(), &"a6c85cf");
/// assert_eq!(to.uri_parts().unwrap().host, "biloxi.com");
/// ```
#[derive(Debug, Clone)]
pub struct NameAddr {
    display_name: Option<ByteView>,
    uri: ByteView,
    bracketed: bool,
    params: Params,
}

impl NameAddr {
    /// Creates a bracketed address without display name or parameters.
    pub fn new(uri: impl Into<ByteView>) -> Self {
        NameAddr {
            display_name: None,
            uri: uri.into(),
            bracketed: true,
            params: Params::new(),
        }
    }

    pub fn with_display_name(mut self, name: impl Into<ByteView>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<ByteView>) -> Self {
        self.params.set(Param::tag(tag));
        self
    }

    pub fn parse(value: &ByteView) -> Result<NameAddr> {
        let (_, raw) = values::complete(value.as_bytes(), values::name_addr)?;
        if raw.uri.is_empty() {
            return Err(Error::Parse("empty URI in address".to_string()));
        }
        Ok(NameAddr {
            display_name: raw.display_name.map(|d| value.slice_ref(d)),
            uri: value.slice_ref(raw.uri),
            bracketed: raw.bracketed,
            params: Params::from_raw(value, &raw.params),
        })
    }

    pub fn display_name(&self) -> Option<&ByteView> {
        self.display_name.as_ref()
    }

    pub fn uri(&self) -> &ByteView {
        &self.uri
    }

    /// Splits the URI into the parts transaction matching uses.
    pub fn uri_parts(&self) -> Option<SipUriParts> {
        SipUriParts::parse(&self.uri)
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    pub fn tag(&self) -> Option<&ByteView> {
        self.params.value_of(b"tag")
    }

    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        if let Some(name) = &self.display_name {
            buf.put_slice(name.as_bytes());
            buf.put_u8(b' ');
        }
        if self.bracketed || self.display_name.is_some() {
            buf.put_u8(b'<');
            buf.put_slice(self.uri.as_bytes());
            buf.put_u8(b'>');
        } else {
            buf.put_slice(self.uri.as_bytes());
        }
        self.params.encode(buf);
    }
}

/// Display names are presentation only and do not take part in equality.
/// Scheme and host compare ignoring case, the user part exactly.
impl PartialEq for NameAddr {
    fn eq(&self, other: &Self) -> bool {
        let uri_eq = match (split_uri(&self.uri), split_uri(&other.uri)) {
            (Some((a, a_rest)), Some((b, b_rest))) => {
                a.scheme.equals_ignore_case(&b.scheme)
                    && a.user == b.user
                    && a.host.equals_ignore_case(&b.host)
                    && a.port == b.port
                    && a_rest.equals_ignore_case(&b_rest)
            }
            _ => self.uri == other.uri,
        };
        uri_eq && self.params == other.params
    }
}

/// URI parts plus whatever follows `host[:port]`.
fn split_uri(uri: &ByteView) -> Option<(SipUriParts, ByteView)> {
    let (rest, raw) = values::sip_uri(uri.as_bytes()).ok()?;
    let parts = SipUriParts {
        scheme: uri.slice_ref(raw.scheme),
        user: raw.user.map(|u| uri.slice_ref(u)),
        host: uri.slice_ref(raw.host),
        port: raw.port,
    };
    Some((parts, uri.slice_ref(rest)))
}

impl Eq for NameAddr {}

impl fmt::Display for NameAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = BytesMut::new();
        self.encode(&mut buf);
        f.write_str(&String::from_utf8_lossy(&buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bracketed() {
        let na = NameAddr::parse(&ByteView::from_static(
            b"\"Alice\" <sip:alice@atlanta.com:5061>;tag=1928301774",
        ))
        .unwrap();
        assert_eq!(na.display_name().unwrap(), &"\"Alice\"");
        assert_eq!(na.uri(), &"sip:alice@atlanta.com:5061");
        assert_eq!(na.tag().unwrap(), &"1928301774");
        let parts = na.uri_parts().unwrap();
        assert_eq!(parts.user.unwrap(), "alice");
        assert_eq!(parts.port, Some(5061));
    }

    #[test]
    fn test_parse_addr_spec() {
        let na = NameAddr::parse(&ByteView::from_static(b"sip:bob@biloxi.com;tag=xyz")).unwrap();
        assert_eq!(na.uri(), &"sip:bob@biloxi.com");
        assert_eq!(na.tag().unwrap(), &"xyz");
        assert_eq!(na.to_string(), "sip:bob@biloxi.com;tag=xyz");
    }

    #[test]
    fn test_tel_uri_has_no_parts() {
        let na = NameAddr::parse(&ByteView::from_static(b"<tel:+1-201-555-0123>")).unwrap();
        assert!(na.uri_parts().is_none());
    }

    #[test]
    fn test_equality_ignores_display_name_and_host_case() {
        let a = NameAddr::parse(&ByteView::from_static(b"Bob <sip:bob@Biloxi.com>;tag=1")).unwrap();
        let b = NameAddr::parse(&ByteView::from_static(b"<sip:bob@biloxi.com> ;tag=1")).unwrap();
        let c = NameAddr::parse(&ByteView::from_static(b"<sip:bob@biloxi.com>;tag=2")).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_builder_display() {
        let na = NameAddr::new("sip:alice@atlanta.com")
            .with_display_name("Alice")
            .with_tag("88sja8x");
        assert_eq!(na.to_string(), "Alice <sip:alice@atlanta.com>;tag=88sja8x");
    }
}
