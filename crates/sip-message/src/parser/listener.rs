//! Parser sinks.
//!
//! The framer in [`framing`](super::framing) does not build messages itself;
//! it reports what it finds to a [`MessageListener`]. [`MessageAssembler`]
//! turns those events into a [`Message`], while the classic transaction key
//! collector listens to the same events to fingerprint a message.

use std::sync::Arc;

use tracing::trace;

use crate::config::CoreConfig;
use crate::error::{Error, Result};
use crate::message::{Message, Request, Response, SipMessage};
use crate::types::{ByteView, Header, HeaderId, HeaderName};

/// Components of the in-built headers, reported through
/// [`MessageListener::element_found`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementId {
    CSeqNumber,
    CSeqMethod,
    CallId,
    ContentLength,
}

/// Receives framing events. Every view passed in points into the buffer being
/// scanned.
///
/// All methods default to doing nothing. An error returned from any of them
/// stops the scan and is handed back to the caller of
/// [`scan`](super::framing::scan).
pub trait MessageListener {
    fn request_begin(&mut self, _method: &ByteView, _uri: &ByteView, _version: &ByteView) -> Result<()> {
        Ok(())
    }

    fn response_begin(&mut self, _code: u16, _reason: &ByteView, _version: &ByteView) -> Result<()> {
        Ok(())
    }

    /// A header with a known identity starts. Returning `false` skips its
    /// `header_found` and `element_found` events.
    fn header_begin(&mut self, _id: HeaderId) -> bool {
        true
    }

    /// One value of a known header. List headers report each comma-separated
    /// element on its own.
    fn header_found(&mut self, _id: HeaderId, _value: &ByteView) -> Result<()> {
        Ok(())
    }

    /// One component of an in-built header (CSeq, Call-ID, Content-Length).
    fn element_found(&mut self, _context: HeaderId, _element: ElementId, _value: &ByteView) -> Result<()> {
        Ok(())
    }

    /// An extension header, name and value as received.
    fn unknown_found(&mut self, _name: &ByteView, _value: &ByteView) -> Result<()> {
        Ok(())
    }

    fn body_found(&mut self, _body: &ByteView) -> Result<()> {
        Ok(())
    }

    /// The whole message was framed.
    fn message_found(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Builds a [`Message`] from framing events.
///
/// Header values are attached as raw views over the scanned buffer and parsed
/// only on demand; CSeq, Call-ID and Content-Length go straight into the
/// in-built scalars.
#[derive(Debug)]
pub struct MessageAssembler {
    config: Arc<CoreConfig>,
    message: Option<Message>,
}

impl MessageAssembler {
    pub fn new(config: Arc<CoreConfig>) -> Self {
        MessageAssembler {
            config,
            message: None,
        }
    }

    /// The assembled message. Fails when no start line was seen.
    pub fn finish(self) -> Result<Message> {
        self.message
            .ok_or_else(|| Error::Parse("no start line".to_string()))
    }

    fn message_mut(&mut self) -> Result<&mut Message> {
        self.message
            .as_mut()
            .ok_or_else(|| Error::Parse("header before start line".to_string()))
    }
}

impl MessageListener for MessageAssembler {
    fn request_begin(&mut self, method: &ByteView, uri: &ByteView, version: &ByteView) -> Result<()> {
        let mut request = Request::new(Arc::clone(&self.config), method.clone(), uri.clone());
        request.set_version(version.clone());
        self.message = Some(Message::Request(request));
        Ok(())
    }

    fn response_begin(&mut self, code: u16, reason: &ByteView, version: &ByteView) -> Result<()> {
        let mut response = Response::new(Arc::clone(&self.config), code);
        response.set_reason(reason.clone());
        response.set_version(version.clone());
        self.message = Some(Message::Response(response));
        Ok(())
    }

    fn header_found(&mut self, id: HeaderId, value: &ByteView) -> Result<()> {
        let core = self.message_mut()?.core_mut();
        core.add_header(Header::new(id, value.clone()), false)
    }

    fn element_found(&mut self, context: HeaderId, element: ElementId, value: &ByteView) -> Result<()> {
        let core = self.message_mut()?.core_mut();
        match element {
            ElementId::CSeqNumber => {
                let number = value
                    .parse_u64()
                    .ok_or_else(|| Error::Parse(format!("bad CSeq number {:?}", value)))?;
                core.set_cseq_number(number);
            }
            ElementId::CSeqMethod => core.set_cseq_method(value.clone()),
            ElementId::CallId => core.set_call_id(value.clone()),
            ElementId::ContentLength => {
                let length = value
                    .parse_i32()
                    .ok_or_else(|| Error::Parse(format!("bad {} value {:?}", context, value)))?;
                core.set_content_length(length);
            }
        }
        Ok(())
    }

    fn unknown_found(&mut self, name: &ByteView, value: &ByteView) -> Result<()> {
        let core = self.message_mut()?.core_mut();
        core.add_header(Header::new(HeaderName::Other(name.clone()), value.clone()), false)
    }

    fn body_found(&mut self, body: &ByteView) -> Result<()> {
        self.message_mut()?.core_mut().set_body(body.clone());
        Ok(())
    }

    fn message_found(&mut self) -> Result<()> {
        if let Some(message) = &self.message {
            trace!(
                request = message.is_request(),
                headers = message.core().header_count(),
                "message assembled"
            );
        }
        Ok(())
    }
}
