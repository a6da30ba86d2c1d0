use std::fmt;
use std::sync::Arc;

use bytes::{BufMut, BytesMut};

use super::{MessageCore, SipMessage};
use crate::config::CoreConfig;
use crate::types::{ByteView, SipUriParts};

/// Protocol version written when none was parsed
pub(crate) const SIP_2_0: &[u8] = b"SIP/2.0";

/// A SIP request
///
/// # Examples
///
/// ```rust
/// use rvoip_sip_message::prelude::*;
///
/// let factory = MessageFactory::default();
/// let mut request = factory.request("REGISTER", "sip:registrar.biloxi.com");
/// request.core_mut().set_cseq(1826, "REGISTER");
///
/// let wire = request.finalize();
/// assert!(wire.starts_with(b"REGISTER sip:registrar.biloxi.com SIP/2.0\r\n"));
/// assert!(request.method().is_interned());
/// ```
#[derive(Clone)]
pub struct Request {
    method: ByteView,
    uri: ByteView,
    version: ByteView,
    core: MessageCore,
}

impl Request {
    pub fn new(config: Arc<CoreConfig>, method: impl Into<ByteView>, uri: impl Into<ByteView>) -> Self {
        Request {
            method: method.into().interned(),
            uri: uri.into(),
            version: ByteView::from_static(SIP_2_0).interned(),
            core: MessageCore::new(config),
        }
    }

    /// Request method; known methods are interned singletons
    pub fn method(&self) -> &ByteView {
        &self.method
    }

    pub fn set_method(&mut self, method: impl Into<ByteView>) {
        self.core.invalidate();
        self.method = method.into().interned();
    }

    /// Request-URI bytes
    pub fn uri(&self) -> &ByteView {
        &self.uri
    }

    pub fn set_uri(&mut self, uri: impl Into<ByteView>) {
        self.core.invalidate();
        self.uri = uri.into();
    }

    /// User, host and port of a SIP Request-URI
    pub fn uri_parts(&self) -> Option<SipUriParts> {
        SipUriParts::parse(&self.uri)
    }

    pub fn version(&self) -> &ByteView {
        &self.version
    }

    pub(crate) fn set_version(&mut self, version: ByteView) {
        self.core.invalidate();
        self.version = version.interned();
    }

    /// Returns `true` when the method is `name`, ignoring ASCII case.
    pub fn is_method(&self, name: &[u8]) -> bool {
        self.method.eq_ignore_case_bytes(name)
    }
}

impl SipMessage for Request {
    fn core(&self) -> &MessageCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut MessageCore {
        &mut self.core
    }

    fn write_start_line(&self, buf: &mut BytesMut) {
        buf.put_slice(self.method.as_bytes());
        buf.put_u8(b' ');
        buf.put_slice(self.uri.as_bytes());
        buf.put_u8(b' ');
        buf.put_slice(self.version.as_bytes());
        buf.put_slice(b"\r\n");
    }

    fn is_request(&self) -> bool {
        true
    }
}

/// Start line and core must match; the method compares exactly, the
/// version ignoring case.
impl PartialEq for Request {
    fn eq(&self, other: &Self) -> bool {
        self.method == other.method
            && self.uri == other.uri
            && self.version.equals_ignore_case(&other.version)
            && self.core == other.core
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("version", &self.version)
            .field("core", &self.core)
            .finish()
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.serialize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Header, HeaderId};

    fn request() -> Request {
        let mut r = Request::new(Arc::new(CoreConfig::default()), "INVITE", "sip:bob@biloxi.com");
        r.core_mut().set_call_id("a84b4c76e66710@pc33.atlanta.com");
        r.core_mut().set_cseq(314159, "INVITE");
        r
    }

    #[test]
    fn test_finalize_inserts_max_forwards() {
        let mut r = request();
        assert!(r.core().top_header(HeaderId::MaxForwards).is_none());
        let before = r.serialize();
        let wire = r.finalize();
        assert_eq!(before, wire);
        let text = String::from_utf8(wire.to_vec()).unwrap();
        assert!(text.contains("Max-Forwards: 70\r\n"));
        assert!(r.core().top_header(HeaderId::MaxForwards).is_some());
    }

    #[test]
    fn test_max_forwards_disabled() {
        let config = CoreConfig::default().with_default_max_forwards(None);
        let mut r = Request::new(Arc::new(config), "OPTIONS", "sip:carol@chicago.com");
        let text = String::from_utf8(r.finalize().to_vec()).unwrap();
        assert!(!text.contains("Max-Forwards"));
    }

    #[test]
    fn test_header_order() {
        let mut r = request();
        r.core_mut().add("X-Custom", "1").unwrap();
        r.core_mut().add(HeaderId::UserAgent, "softphone").unwrap();
        r.core_mut().add(HeaderId::To, "<sip:bob@biloxi.com>").unwrap();
        r.core_mut().add(HeaderId::Via, "SIP/2.0/UDP pc33.atlanta.com;branch=z9hG4bK776asdhds").unwrap();
        let text = String::from_utf8(r.finalize().to_vec()).unwrap();
        let expected = "INVITE sip:bob@biloxi.com SIP/2.0\r\n\
            Via: SIP/2.0/UDP pc33.atlanta.com;branch=z9hG4bK776asdhds\r\n\
            Max-Forwards: 70\r\n\
            To: <sip:bob@biloxi.com>\r\n\
            Call-ID: a84b4c76e66710@pc33.atlanta.com\r\n\
            CSeq: 314159 INVITE\r\n\
            Content-Length: 0\r\n\
            X-Custom: 1\r\n\
            User-Agent: softphone\r\n\
            \r\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_compact_form() {
        let config = CoreConfig::default().with_compact_headers();
        let mut r = Request::new(Arc::new(config), "INVITE", "sip:bob@biloxi.com");
        r.core_mut().set_call_id("abc");
        r.core_mut().add_header(Header::new(HeaderId::Contact, "<sip:alice@pc33.atlanta.com>"), false).unwrap();
        let text = String::from_utf8(r.finalize().to_vec()).unwrap();
        assert!(text.contains("\r\nm: <sip:alice@pc33.atlanta.com>\r\n"));
        assert!(text.contains("\r\ni: abc\r\n"));
        assert!(text.contains("\r\nl: 0\r\n"));
        assert!(text.contains("\r\nMax-Forwards: 70\r\n"));
    }

    #[test]
    fn test_start_line_mutation_invalidates() {
        let mut r = request();
        let first = r.finalize();
        r.set_uri("sip:bob@192.0.2.4");
        assert!(!r.is_finalized());
        assert_ne!(r.finalize(), first);
        assert!(r.verify_cache().is_ok());
    }

    #[test]
    fn test_equality_ignores_cache_and_whitespace() {
        let mut a = request();
        let mut b = request();
        a.core_mut().add(HeaderId::Subject, "lunch  plans").unwrap();
        b.core_mut().add(HeaderId::Subject, "lunch plans").unwrap();
        a.finalize();
        b.finalize();
        b.core_mut().add(HeaderId::Subject, "lunch plans").unwrap();
        assert!(a.is_finalized() && !b.is_finalized());
        assert_eq!(a, b);
        b.core_mut().set_body("v=0");
        assert_ne!(a, b);
    }
}
