//! # SIP messages
//!
//! [`Request`] and [`Response`] are thin wrappers around a shared
//! [`MessageCore`]: the two-tier header store, the in-built CSeq, Call-ID and
//! Content-Length scalars, the body, and the finalize cache. Behavior common
//! to both lives in the [`SipMessage`] trait.
//!
//! ## Finalization
//!
//! A message is either *building* or *finalized*. [`SipMessage::finalize`]
//! serializes the message once and caches the bytes; further calls, and
//! [`SipMessage::write`], hand out the cached buffer. Every mutating method
//! drops the cache, taking the message back to building.
//!
//! ```rust
//! use rvoip_sip_message::prelude::*;
//!
//! let factory = MessageFactory::default();
//! let mut invite = factory.request("INVITE", "sip:bob@biloxi.com");
//! invite.core_mut().set_call_id("a84b4c76e66710@pc33.atlanta.com");
//! invite.core_mut().set_cseq(314159, "INVITE");
//!
//! let first = invite.finalize();
//! assert!(invite.is_finalized());
//! assert_eq!(invite.finalize(), first);
//!
//! invite.core_mut().add("Subject", "lunch").unwrap();
//! assert!(!invite.is_finalized());
//! assert_ne!(invite.finalize(), first);
//! ```

mod factory;
mod request;
mod response;
mod store;
mod writer;

pub use factory::MessageFactory;
pub use request::Request;
pub use response::Response;
pub use store::{HeaderSlot, HeaderStore};

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::io;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use tracing::trace;

use crate::config::CoreConfig;
use crate::error::{Error, Result};
use crate::parser::values;
use crate::transaction::{TransactionKey, TransactionKeyBuilder};
use crate::types::{
    ByteView, CSeq, Header, HeaderId, HeaderKind, HeaderName, HeaderValue,
};

/// Transport binding data attached by the transport layer. Opaque to the core.
pub type BindingInfo = Arc<dyn Any + Send + Sync>;

/// State shared by requests and responses
pub struct MessageCore {
    config: Arc<CoreConfig>,
    headers: HeaderStore,
    cseq_number: u64,
    cseq_method: Option<ByteView>,
    call_id: Option<ByteView>,
    content_length: Option<i32>,
    body: ByteView,
    binding_info: Option<BindingInfo>,
    finalized: Option<Bytes>,
    transaction_key: Option<TransactionKey>,
}

impl MessageCore {
    pub fn new(config: Arc<CoreConfig>) -> Self {
        let headers = HeaderStore::new(config.hot_priority_level);
        MessageCore {
            config,
            headers,
            cseq_number: 0,
            cseq_method: None,
            call_id: None,
            content_length: None,
            body: ByteView::empty(),
            binding_info: None,
            finalized: None,
            transaction_key: None,
        }
    }

    /// The configuration snapshot this message was created with
    pub fn config(&self) -> &Arc<CoreConfig> {
        &self.config
    }

    /// Read access to the header store. In-built headers are not in it.
    pub fn headers(&self) -> &HeaderStore {
        &self.headers
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized.is_some()
    }

    /// The cached wire form, when finalized
    pub fn finalized_bytes(&self) -> Option<&Bytes> {
        self.finalized.as_ref()
    }

    /// Drops the finalized bytes. Every mutator calls this.
    pub fn invalidate(&mut self) {
        if self.finalized.take().is_some() {
            trace!("finalized buffer invalidated");
        }
    }

    pub(crate) fn set_finalized(&mut self, bytes: Bytes) {
        self.finalized = Some(bytes);
    }

    // ---- header access ------------------------------------------------

    /// Adds a header. In-built identities update their scalar field; singular
    /// identities replace their previous value; list identities append, or
    /// prepend when `prepend` is set.
    ///
    /// Fails only when an in-built value (CSeq, Content-Length) does not parse.
    pub fn add_header(&mut self, header: Header, prepend: bool) -> Result<()> {
        self.invalidate();
        match header.id() {
            Some(id) if id.is_in_built() => self.set_in_built(id, header.into_value()),
            _ => {
                self.headers.add(header, prepend);
                Ok(())
            }
        }
    }

    /// Appends a header with a raw value.
    pub fn add(&mut self, name: impl Into<HeaderName>, value: impl Into<ByteView>) -> Result<()> {
        self.add_header(Header::new(name, value), false)
    }

    fn set_in_built(&mut self, id: HeaderId, value: HeaderValue) -> Result<()> {
        match (id, value) {
            (HeaderId::CallId, HeaderValue::Raw(raw)) => self.call_id = Some(raw.trim()),
            (HeaderId::CallId, other) => {
                self.call_id = Some(ByteView::from(other.to_bytes().into_owned()))
            }
            (HeaderId::CSeq, HeaderValue::CSeq(cseq)) => {
                self.cseq_number = cseq.number;
                self.cseq_method = Some(cseq.method);
            }
            (HeaderId::CSeq, HeaderValue::Raw(raw)) => {
                let cseq = CSeq::parse(&raw)?;
                self.cseq_number = cseq.number;
                self.cseq_method = Some(cseq.method);
            }
            (HeaderId::ContentLength, HeaderValue::Number(n)) => {
                self.content_length = Some(length_from(n)?);
            }
            (HeaderId::ContentLength, HeaderValue::Raw(raw)) => {
                let (_, n) = values::number_value(raw.as_bytes())?;
                self.content_length = Some(length_from(n)?);
            }
            (id, value) => {
                return Err(Error::Parse(format!(
                    "{} cannot hold {:?}",
                    id,
                    value
                )));
            }
        }
        Ok(())
    }

    fn in_built_header(&self, id: HeaderId) -> Option<Header> {
        match id {
            HeaderId::CallId => self
                .call_id
                .as_ref()
                .map(|call_id| Header::new(id, call_id.clone())),
            HeaderId::CSeq => self.cseq_method.as_ref().map(|method| {
                Header::with_value(
                    id,
                    HeaderValue::CSeq(CSeq {
                        number: self.cseq_number,
                        method: method.clone(),
                    }),
                )
            }),
            HeaderId::ContentLength => self
                .content_length
                .map(|len| Header::with_value(id, HeaderValue::Number(len as u64))),
            _ => None,
        }
    }

    /// Returns the singular header `name`.
    ///
    /// In-built identities come back as a header synthesized from the scalar
    /// fields. With `validate` set a raw value is parsed first and grammar
    /// errors are reported; otherwise the stored form is returned as is.
    /// Asking for a known list header is a [`Error::HeaderTypeMismatch`]; use
    /// [`get_headers`](Self::get_headers) or [`top_header`](Self::top_header).
    /// Extension headers have no fixed kind and return their first value.
    pub fn get_header(&self, name: impl Into<HeaderName>, validate: bool) -> Result<Option<Cow<'_, Header>>> {
        let name = name.into();
        if name.id().is_some() {
            expect_kind(&name, HeaderKind::Singular)?;
        }
        if let Some(id) = name.id().filter(HeaderId::is_in_built) {
            return Ok(self.in_built_header(id).map(Cow::Owned));
        }
        let header = match self.headers.slot(&name).and_then(HeaderSlot::first) {
            Some(header) => header,
            None => return Ok(None),
        };
        if validate && !header.is_parsed() {
            return Ok(Some(Cow::Owned(header.parse()?)));
        }
        Ok(Some(Cow::Borrowed(header)))
    }

    /// Every value of the list header `name`, in order. Asking for a singular
    /// header is a [`Error::HeaderTypeMismatch`].
    pub fn get_headers(&self, name: impl Into<HeaderName>) -> Result<Vec<&Header>> {
        let name = name.into();
        expect_kind(&name, HeaderKind::List)?;
        Ok(self
            .headers
            .slot(&name)
            .map(|slot| slot.iter().collect())
            .unwrap_or_default())
    }

    /// First value of `name`, whatever its kind.
    pub fn top_header(&self, name: impl Into<HeaderName>) -> Option<Cow<'_, Header>> {
        let name = name.into();
        if let Some(id) = name.id().filter(HeaderId::is_in_built) {
            return self.in_built_header(id).map(Cow::Owned);
        }
        self.headers
            .slot(&name)
            .and_then(HeaderSlot::first)
            .map(Cow::Borrowed)
    }

    /// Parses every raw value of `name` in place, keeping the structured form.
    pub fn validate_header(&mut self, name: impl Into<HeaderName>) -> Result<()> {
        let name = name.into();
        if name.is_in_built() {
            return Ok(());
        }
        self.invalidate();
        if let Some(slot) = self.headers.slot_mut(&name) {
            for header in slot.iter_mut() {
                header.parse_in_place()?;
            }
        }
        Ok(())
    }

    /// Parses every stored header in place; stops at the first grammar error.
    pub fn validate_all(&mut self) -> Result<()> {
        self.invalidate();
        for header in self.headers.iter_mut() {
            header.parse_in_place()?;
        }
        Ok(())
    }

    /// Removes the first (or only) value of `name`. For in-built identities
    /// the scalar is cleared and its previous value returned as a header.
    pub fn remove_header(&mut self, name: impl Into<HeaderName>) -> Option<Header> {
        let name = name.into();
        self.invalidate();
        if let Some(id) = name.id().filter(HeaderId::is_in_built) {
            return self.take_in_built(id);
        }
        self.headers.remove_first(&name)
    }

    /// Removes every value of `name`.
    pub fn remove_headers(&mut self, name: impl Into<HeaderName>) -> Vec<Header> {
        let name = name.into();
        self.invalidate();
        if let Some(id) = name.id().filter(HeaderId::is_in_built) {
            return self.take_in_built(id).into_iter().collect();
        }
        self.headers.remove_all(&name)
    }

    fn take_in_built(&mut self, id: HeaderId) -> Option<Header> {
        let previous = self.in_built_header(id);
        match id {
            HeaderId::CallId => self.call_id = None,
            HeaderId::CSeq => {
                self.cseq_number = 0;
                self.cseq_method = None;
            }
            HeaderId::ContentLength => self.content_length = None,
            _ => {}
        }
        previous
    }

    /// Replaces the first value of the header's identity, or adds it.
    /// Returns the value that was replaced.
    pub fn update_header(&mut self, header: Header) -> Result<Option<Header>> {
        self.invalidate();
        match header.id() {
            Some(id) if id.is_in_built() => {
                let previous = self.in_built_header(id);
                self.set_in_built(id, header.into_value())?;
                Ok(previous)
            }
            _ => Ok(self.headers.update(header)),
        }
    }

    /// Number of stored header values, in-built headers excluded
    pub fn header_count(&self) -> usize {
        self.headers.len()
    }

    // ---- in-built fields ----------------------------------------------

    pub fn call_id(&self) -> Option<&ByteView> {
        self.call_id.as_ref()
    }

    /// Sets Call-ID; surrounding whitespace is dropped as when parsed.
    pub fn set_call_id(&mut self, call_id: impl Into<ByteView>) {
        self.invalidate();
        self.call_id = Some(call_id.into().trim());
    }

    pub fn cseq_number(&self) -> u64 {
        self.cseq_number
    }

    pub fn cseq_method(&self) -> Option<&ByteView> {
        self.cseq_method.as_ref()
    }

    /// Sets both CSeq components; the method is interned when it is a known one.
    pub fn set_cseq(&mut self, number: u64, method: impl Into<ByteView>) {
        self.invalidate();
        self.cseq_number = number;
        self.cseq_method = Some(method.into().interned());
    }

    pub(crate) fn set_cseq_number(&mut self, number: u64) {
        self.invalidate();
        self.cseq_number = number;
    }

    pub(crate) fn set_cseq_method(&mut self, method: ByteView) {
        self.invalidate();
        self.cseq_method = Some(method.interned());
    }

    /// Declared Content-Length, or the body length when none was declared
    pub fn content_length(&self) -> i32 {
        self.content_length
            .unwrap_or_else(|| i32::try_from(self.body.len()).unwrap_or(i32::MAX))
    }

    pub(crate) fn set_content_length(&mut self, length: i32) {
        self.invalidate();
        self.content_length = Some(length);
    }

    pub fn body(&self) -> &ByteView {
        &self.body
    }

    /// Replaces the body and sets Content-Length to its size.
    pub fn set_body(&mut self, body: impl Into<ByteView>) {
        self.invalidate();
        self.body = body.into();
        self.content_length = Some(i32::try_from(self.body.len()).unwrap_or(i32::MAX));
    }

    pub fn binding_info(&self) -> Option<&BindingInfo> {
        self.binding_info.as_ref()
    }

    pub fn set_binding_info(&mut self, info: Option<BindingInfo>) {
        self.invalidate();
        self.binding_info = info;
    }

    // ---- convenience accessors ----------------------------------------

    fn address_tag(&self, id: HeaderId) -> Option<ByteView> {
        let header = self.headers.slot(&HeaderName::Known(id))?.first()?;
        header.as_name_addr()?.tag().cloned()
    }

    /// `tag` parameter of the To header
    pub fn to_tag(&self) -> Option<ByteView> {
        self.address_tag(HeaderId::To)
    }

    /// `tag` parameter of the From header
    pub fn from_tag(&self) -> Option<ByteView> {
        self.address_tag(HeaderId::From)
    }

    /// Branch of the topmost Via. `None` when absent or unparseable.
    pub fn top_via_branch(&self) -> Option<ByteView> {
        let header = self.headers.slot(&HeaderName::Known(HeaderId::Via))?.first()?;
        header.as_via()?.branch().cloned()
    }

    // ---- transaction key ----------------------------------------------

    /// The cached transaction key, if one was derived
    pub fn transaction_key(&self) -> Option<&TransactionKey> {
        self.transaction_key.as_ref()
    }

    pub(crate) fn set_transaction_key(&mut self, key: TransactionKey) {
        self.transaction_key = Some(key);
    }

    /// Forgets the cached key so the next derivation recomputes it.
    pub fn clear_transaction_key(&mut self) {
        self.transaction_key = None;
    }
}

fn expect_kind(name: &HeaderName, expected: HeaderKind) -> Result<()> {
    let actual = name.kind();
    if actual != expected {
        return Err(Error::HeaderTypeMismatch {
            header: name.to_string(),
            actual,
        });
    }
    Ok(())
}

fn length_from(n: u64) -> Result<i32> {
    i32::try_from(n).map_err(|_| Error::Parse(format!("Content-Length {} out of range", n)))
}

/// Deep copy. The copy starts unfinalized and without a transaction key.
impl Clone for MessageCore {
    fn clone(&self) -> Self {
        MessageCore {
            config: Arc::clone(&self.config),
            headers: self.headers.clone(),
            cseq_number: self.cseq_number,
            cseq_method: self.cseq_method.clone(),
            call_id: self.call_id.clone(),
            content_length: self.content_length,
            body: self.body.clone(),
            binding_info: self.binding_info.clone(),
            finalized: None,
            transaction_key: None,
        }
    }
}

/// In-built scalars, headers (by identity, semantically) and body. The
/// finalize cache, binding info and transaction key do not count.
impl PartialEq for MessageCore {
    fn eq(&self, other: &Self) -> bool {
        self.cseq_number == other.cseq_number
            && self.cseq_method == other.cseq_method
            && self.call_id == other.call_id
            && self.content_length() == other.content_length()
            && self.body == other.body
            && self.headers == other.headers
    }
}

impl fmt::Debug for MessageCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageCore")
            .field("headers", &self.headers)
            .field("cseq_number", &self.cseq_number)
            .field("cseq_method", &self.cseq_method)
            .field("call_id", &self.call_id)
            .field("content_length", &self.content_length)
            .field("body_len", &self.body.len())
            .field("finalized", &self.finalized.is_some())
            .field("transaction_key", &self.transaction_key)
            .finish()
    }
}

/// Behavior shared by requests and responses
pub trait SipMessage {
    fn core(&self) -> &MessageCore;

    /// Mutable access to the shared state. Every mutator on [`MessageCore`]
    /// invalidates the finalize cache.
    fn core_mut(&mut self) -> &mut MessageCore;

    /// Writes the start line including its CRLF.
    fn write_start_line(&self, buf: &mut BytesMut);

    fn is_request(&self) -> bool;

    fn is_finalized(&self) -> bool {
        self.core().is_finalized()
    }

    /// Serializes the message once and caches the bytes. Requests without
    /// Max-Forwards get the configured default first.
    fn finalize(&mut self) -> Bytes {
        if let Some(bytes) = self.core().finalized_bytes() {
            trace!("finalize: cached buffer reused");
            return bytes.clone();
        }
        if let Some(max_forwards) = writer::missing_max_forwards(self.core(), self.is_request()) {
            self.core_mut().headers.add(max_forwards, false);
        }
        let bytes = self.serialize();
        trace!(len = bytes.len(), "finalize: message serialized");
        self.core_mut().set_finalized(bytes.clone());
        bytes
    }

    /// The wire form: the cached bytes when finalized, a fresh encoding
    /// otherwise. Never caches.
    fn serialize(&self) -> Bytes {
        if let Some(bytes) = self.core().finalized_bytes() {
            return bytes.clone();
        }
        let core = self.core();
        let mut buf = BytesMut::with_capacity(writer::estimate_len(core));
        self.write_start_line(&mut buf);
        writer::encode_headers_and_body(core, self.is_request(), &mut buf);
        buf.freeze()
    }

    /// Finalizes and writes the bytes to `sink`.
    fn write<W: io::Write>(&mut self, sink: &mut W) -> Result<()>
    where
        Self: Sized,
    {
        let bytes = self.finalize();
        sink.write_all(&bytes)?;
        Ok(())
    }

    /// Checks that the finalized bytes still match the header graph.
    ///
    /// Reports [`Error::StaleCacheInvariantViolation`] when a mutation slipped
    /// past invalidation. Meant for tests; it re-encodes the whole message.
    fn verify_cache(&self) -> Result<()> {
        let cached = match self.core().finalized_bytes() {
            Some(bytes) => bytes,
            None => return Ok(()),
        };
        let core = self.core();
        let mut buf = BytesMut::with_capacity(cached.len());
        self.write_start_line(&mut buf);
        writer::encode_headers_and_body(core, self.is_request(), &mut buf);
        if buf[..] != cached[..] {
            return Err(Error::StaleCacheInvariantViolation);
        }
        Ok(())
    }

    /// The transaction key under the configured policy, derived on first use
    /// and cached.
    fn transaction_key(&mut self) -> Result<TransactionKey>
    where
        Self: Sized,
    {
        let builder = TransactionKeyBuilder::new(Arc::clone(self.core().config()));
        let policy = self.core().config().key_policy;
        builder.derive(self, policy)
    }
}

/// A request or a response
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Request(Request),
    Response(Response),
}

impl Message {
    pub fn as_request(&self) -> Option<&Request> {
        match self {
            Message::Request(request) => Some(request),
            Message::Response(_) => None,
        }
    }

    pub fn as_response(&self) -> Option<&Response> {
        match self {
            Message::Response(response) => Some(response),
            Message::Request(_) => None,
        }
    }

    pub fn into_request(self) -> Option<Request> {
        match self {
            Message::Request(request) => Some(request),
            Message::Response(_) => None,
        }
    }

    pub fn into_response(self) -> Option<Response> {
        match self {
            Message::Response(response) => Some(response),
            Message::Request(_) => None,
        }
    }
}

impl SipMessage for Message {
    fn core(&self) -> &MessageCore {
        match self {
            Message::Request(request) => request.core(),
            Message::Response(response) => response.core(),
        }
    }

    fn core_mut(&mut self) -> &mut MessageCore {
        match self {
            Message::Request(request) => request.core_mut(),
            Message::Response(response) => response.core_mut(),
        }
    }

    fn write_start_line(&self, buf: &mut BytesMut) {
        match self {
            Message::Request(request) => request.write_start_line(buf),
            Message::Response(response) => response.write_start_line(buf),
        }
    }

    fn is_request(&self) -> bool {
        matches!(self, Message::Request(_))
    }
}

impl From<Request> for Message {
    fn from(request: Request) -> Self {
        Message::Request(request)
    }
}

impl From<Response> for Message {
    fn from(response: Response) -> Self {
        Message::Response(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core() -> MessageCore {
        MessageCore::new(Arc::new(CoreConfig::default()))
    }

    #[test]
    fn test_in_built_redirection() {
        let mut m = core();
        m.add(HeaderId::CallId, "a84b4c76e66710@pc33.atlanta.com").unwrap();
        m.add("CSeq", "314159 INVITE").unwrap();
        m.add("l", "0").unwrap();

        assert_eq!(m.header_count(), 0);
        assert_eq!(m.call_id().unwrap(), &"a84b4c76e66710@pc33.atlanta.com");
        assert_eq!(m.cseq_number(), 314159);
        assert!(m.cseq_method().unwrap().is_interned());

        let call_id = m.get_header(HeaderId::CallId, false).unwrap().unwrap();
        assert_eq!(call_id.value().to_bytes().as_ref(), b"a84b4c76e66710@pc33.atlanta.com");
        assert!(m.headers().iter().all(|h| !h.name().is_in_built()));
    }

    #[test]
    fn test_bad_in_built_values() {
        let mut m = core();
        assert!(m.add("CSeq", "INVITE").is_err());
        assert!(m.add("Content-Length", "-4").is_err());
        assert!(m.add("Content-Length", "99999999999").is_err());
        assert!(m.cseq_method().is_none());
    }

    #[test]
    fn test_remove_in_built_returns_prior_value() {
        let mut m = core();
        m.set_cseq(2, "BYE");
        let removed = m.remove_header(HeaderId::CSeq).unwrap();
        match removed.value() {
            HeaderValue::CSeq(cseq) => assert_eq!(cseq.to_string(), "2 BYE"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(m.cseq_method().is_none());
        assert!(m.remove_header(HeaderId::CSeq).is_none());
    }

    #[test]
    fn test_kind_mismatch() {
        let mut m = core();
        m.add(HeaderId::Via, "SIP/2.0/UDP a;branch=z9hG4bK1").unwrap();
        m.add(HeaderId::To, "<sip:bob@biloxi.com>").unwrap();

        let err = m.get_header(HeaderId::Via, false).unwrap_err();
        assert!(matches!(err, Error::HeaderTypeMismatch { actual: HeaderKind::List, .. }));
        assert!(m.get_headers(HeaderId::To).is_err());

        assert_eq!(m.get_headers(HeaderId::Via).unwrap().len(), 1);
        assert!(m.top_header(HeaderId::Via).is_some());

        m.add("X-Custom", "one").unwrap();
        m.add("X-Custom", "two").unwrap();
        let first = m.get_header("x-custom", true).unwrap().unwrap();
        assert_eq!(first.value().to_bytes().as_ref(), b"one");
        assert_eq!(m.get_headers("X-Custom").unwrap().len(), 2);
        assert!(m.get_header("X-Missing", false).unwrap().is_none());
        assert!(m.get_header(HeaderId::To, true).unwrap().unwrap().is_parsed());
    }

    #[test]
    fn test_validate_reports_grammar_errors() {
        let mut m = core();
        m.add(HeaderId::To, "<<<").unwrap();
        assert!(m.get_header(HeaderId::To, false).unwrap().is_some());
        assert!(m.get_header(HeaderId::To, true).is_err());
        assert!(m.validate_header(HeaderId::To).is_err());
    }

    #[test]
    fn test_validate_header_in_place() {
        let mut m = core();
        m.add(HeaderId::From, "Alice <sip:alice@atlanta.com>;tag=1928301774").unwrap();
        m.validate_header(HeaderId::From).unwrap();
        let from = m.get_header(HeaderId::From, false).unwrap().unwrap();
        assert!(matches!(from, Cow::Borrowed(_)));
        assert!(matches!(from.value(), HeaderValue::NameAddr(_)));
        assert_eq!(m.from_tag().unwrap(), "1928301774");
    }

    #[test]
    fn test_update_header() {
        let mut m = core();
        assert!(m.update_header(Header::new(HeaderId::Expires, "60")).unwrap().is_none());
        let old = m.update_header(Header::new(HeaderId::Expires, "120")).unwrap().unwrap();
        assert_eq!(old.value().to_bytes().as_ref(), b"60");
        let old = m.update_header(Header::new(HeaderId::CallId, "new")).unwrap();
        assert!(old.is_none());
        assert_eq!(m.call_id().unwrap(), &"new");
    }

    #[test]
    fn test_clone_resets_cache_and_key() {
        let mut m = core();
        m.set_finalized(Bytes::from_static(b"x"));
        let c = m.clone();
        assert!(m.is_finalized());
        assert!(!c.is_finalized());
        assert!(c.transaction_key().is_none());
    }

    #[test]
    fn test_declared_length_counts_in_equality() {
        let a = core();
        let mut b = a.clone();
        assert_eq!(a, b);
        b.add(HeaderId::ContentLength, "10").unwrap();
        assert_eq!(b.content_length(), 10);
        assert_ne!(a, b);

        let mut c = a.clone();
        c.add(HeaderId::ContentLength, "0").unwrap();
        assert_eq!(a, c);
    }

    #[test]
    fn test_call_id_trimmed_on_every_path() {
        let mut a = core();
        let mut b = core();
        a.set_call_id("  a84b4c76e66710@pc33.atlanta.com\t");
        b.add(HeaderId::CallId, " a84b4c76e66710@pc33.atlanta.com ").unwrap();
        assert_eq!(a.call_id().unwrap(), &"a84b4c76e66710@pc33.atlanta.com");
        assert_eq!(a, b);
    }

    #[test]
    fn test_body_sets_length() {
        let mut m = core();
        assert_eq!(m.content_length(), 0);
        m.set_body("v=0\r\n");
        assert_eq!(m.content_length(), 5);
        assert_eq!(m.get_header(HeaderId::ContentLength, false).unwrap().unwrap().value().to_bytes().as_ref(), b"5");
    }
}
