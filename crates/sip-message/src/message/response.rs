use std::fmt;
use std::sync::Arc;

use bytes::{BufMut, BytesMut};

use super::request::SIP_2_0;
use super::{MessageCore, Request, SipMessage};
use crate::config::CoreConfig;
use crate::types::{ByteView, HeaderId, HeaderName};

/// A SIP response
#[derive(Clone)]
pub struct Response {
    version: ByteView,
    status: u16,
    reason: ByteView,
    core: MessageCore,
}

impl Response {
    /// Creates a response with the default reason phrase for `status`.
    pub fn new(config: Arc<CoreConfig>, status: u16) -> Self {
        Response {
            version: ByteView::from_static(SIP_2_0).interned(),
            status,
            reason: ByteView::from_static(reason_phrase(status).as_bytes()),
            core: MessageCore::new(config),
        }
    }

    /// Builds a response to `request` as RFC 3261 §8.2.6 requires: every Via
    /// in order, From, To, Call-ID and CSeq are copied over.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rvoip_sip_message::prelude::*;
    ///
    /// let factory = MessageFactory::default();
    /// let mut invite = factory.request("INVITE", "sip:bob@biloxi.com");
    /// invite.core_mut().add(HeaderId::Via, "SIP/2.0/UDP pc33.atlanta.com;branch=z9hG4bK776asdhds").unwrap();
    /// invite.core_mut().set_cseq(314159, "INVITE");
    ///
    /// let ringing = Response::for_request(&invite, 180);
    /// assert_eq!(ringing.reason(), &"Ringing");
    /// assert_eq!(ringing.core().cseq_number(), 314159);
    /// assert_eq!(ringing.core().top_via_branch().unwrap(), "z9hG4bK776asdhds");
    /// ```
    pub fn for_request(request: &Request, status: u16) -> Self {
        let source = request.core();
        let mut response = Response::new(Arc::clone(source.config()), status);
        let core = &mut response.core;

        for id in [HeaderId::Via, HeaderId::From, HeaderId::To] {
            if let Some(slot) = source.headers().slot(&HeaderName::Known(id)) {
                for header in slot.iter() {
                    core.headers.add(header.clone(), false);
                }
            }
        }
        core.call_id = source.call_id().cloned();
        core.cseq_number = source.cseq_number();
        core.cseq_method = source.cseq_method().cloned();
        response
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: u16) {
        self.core.invalidate();
        self.status = status;
    }

    pub fn reason(&self) -> &ByteView {
        &self.reason
    }

    pub fn set_reason(&mut self, reason: impl Into<ByteView>) {
        self.core.invalidate();
        self.reason = reason.into();
    }

    pub fn version(&self) -> &ByteView {
        &self.version
    }

    pub(crate) fn set_version(&mut self, version: ByteView) {
        self.core.invalidate();
        self.version = version.interned();
    }

    /// 1xx
    pub fn is_provisional(&self) -> bool {
        (100..200).contains(&self.status)
    }

    /// 2xx to 6xx
    pub fn is_final(&self) -> bool {
        self.status >= 200
    }
}

impl SipMessage for Response {
    fn core(&self) -> &MessageCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut MessageCore {
        &mut self.core
    }

    fn write_start_line(&self, buf: &mut BytesMut) {
        buf.put_slice(self.version.as_bytes());
        buf.put_u8(b' ');
        buf.put_slice(self.status.to_string().as_bytes());
        buf.put_u8(b' ');
        buf.put_slice(self.reason.as_bytes());
        buf.put_slice(b"\r\n");
    }

    fn is_request(&self) -> bool {
        false
    }
}

/// The reason phrase is informational and does not take part.
impl PartialEq for Response {
    fn eq(&self, other: &Self) -> bool {
        self.status == other.status
            && self.version.equals_ignore_case(&other.version)
            && self.core == other.core
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("reason", &self.reason)
            .field("core", &self.core)
            .finish()
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.serialize()))
    }
}

/// Default reason phrase (RFC 3261 §21)
pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        100 => "Trying",
        180 => "Ringing",
        181 => "Call Is Being Forwarded",
        182 => "Queued",
        183 => "Session Progress",
        200 => "OK",
        202 => "Accepted",
        300 => "Multiple Choices",
        301 => "Moved Permanently",
        302 => "Moved Temporarily",
        305 => "Use Proxy",
        380 => "Alternative Service",
        400 => "Bad Request",
        401 => "Unauthorized",
        402 => "Payment Required",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        407 => "Proxy Authentication Required",
        408 => "Request Timeout",
        410 => "Gone",
        413 => "Request Entity Too Large",
        414 => "Request-URI Too Long",
        415 => "Unsupported Media Type",
        416 => "Unsupported URI Scheme",
        420 => "Bad Extension",
        421 => "Extension Required",
        423 => "Interval Too Brief",
        480 => "Temporarily Unavailable",
        481 => "Call/Transaction Does Not Exist",
        482 => "Loop Detected",
        483 => "Too Many Hops",
        484 => "Address Incomplete",
        485 => "Ambiguous",
        486 => "Busy Here",
        487 => "Request Terminated",
        488 => "Not Acceptable Here",
        491 => "Request Pending",
        493 => "Undecipherable",
        500 => "Server Internal Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Server Time-out",
        505 => "Version Not Supported",
        513 => "Message Too Large",
        600 => "Busy Everywhere",
        603 => "Decline",
        604 => "Does Not Exist Anywhere",
        606 => "Not Acceptable",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invite() -> Request {
        let mut r = Request::new(Arc::new(CoreConfig::default()), "INVITE", "sip:bob@biloxi.com");
        let core = r.core_mut();
        core.add(HeaderId::Via, "SIP/2.0/UDP server10.biloxi.com;branch=z9hG4bK4b43c2ff8.1").unwrap();
        core.add(HeaderId::Via, "SIP/2.0/UDP pc33.atlanta.com;branch=z9hG4bK776asdhds").unwrap();
        core.add(HeaderId::From, "Alice <sip:alice@atlanta.com>;tag=1928301774").unwrap();
        core.add(HeaderId::To, "Bob <sip:bob@biloxi.com>").unwrap();
        core.add(HeaderId::Contact, "<sip:alice@pc33.atlanta.com>").unwrap();
        core.set_call_id("a84b4c76e66710@pc33.atlanta.com");
        core.set_cseq(314159, "INVITE");
        r
    }

    #[test]
    fn test_for_request_copies_matching_headers() {
        let request = invite();
        let response = Response::for_request(&request, 200);
        let core = response.core();
        assert_eq!(core.get_headers(HeaderId::Via).unwrap().len(), 2);
        assert_eq!(core.top_via_branch().unwrap(), "z9hG4bK4b43c2ff8.1");
        assert_eq!(core.from_tag().unwrap(), "1928301774");
        assert!(core.top_header(HeaderId::Contact).is_none());
        assert_eq!(core.call_id(), request.core().call_id());
        assert_eq!(core.cseq_method().unwrap(), &"INVITE");
    }

    #[test]
    fn test_responses_get_no_max_forwards() {
        let mut response = Response::for_request(&invite(), 180);
        let text = String::from_utf8(response.finalize().to_vec()).unwrap();
        assert!(text.starts_with("SIP/2.0 180 Ringing\r\nVia: "));
        assert!(!text.contains("Max-Forwards"));
        assert!(text.ends_with("Content-Length: 0\r\n\r\n"));
    }

    #[test]
    fn test_status_mutation_invalidates() {
        let mut response = Response::new(Arc::new(CoreConfig::default()), 100);
        response.finalize();
        response.set_status(183);
        response.set_reason("Session Progress");
        assert!(!response.is_finalized());
        assert!(response.finalize().starts_with(b"SIP/2.0 183 Session Progress\r\n"));
        assert!(response.is_provisional());
        assert!(!response.is_final());
    }
}
