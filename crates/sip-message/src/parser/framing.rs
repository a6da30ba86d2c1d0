//! Message framing (RFC 3261 §7).
//!
//! [`scan`] splits a buffer into start line, header lines and body and
//! reports them to a [`MessageListener`]. It never copies: every reported
//! value is a [`ByteView`] into the scanned buffer. Folded header lines stay
//! one value with the continuation kept verbatim; list headers are split at
//! top-level commas.
//!
//! ```rust
//! use std::sync::Arc;
//! use rvoip_sip_message::prelude::*;
//!
//! let raw = "SIP/2.0 180 Ringing\r\n\
//!            Via: SIP/2.0/UDP pc33.atlanta.com;branch=z9hG4bK776asdhds\r\n\
//!            Call-ID: a84b4c76e66710@pc33.atlanta.com\r\n\
//!            CSeq: 314159 INVITE\r\n\
//!            Content-Length: 0\r\n\
//!            \r\n";
//! let message = parse_message(raw, Arc::new(CoreConfig::default())).unwrap();
//! assert_eq!(message.as_response().unwrap().status(), 180);
//! assert_eq!(message.core().cseq_number(), 314159);
//! ```

use std::sync::Arc;

use bytes::Bytes;
use nom::{
    bytes::complete::{tag, take_while1, take_while_m_n},
    character::complete::{digit1, space1},
    combinator::{all_consuming, map_res, rest},
    sequence::{delimited, pair, preceded, terminated, tuple},
};
use tracing::trace;

use super::listener::{ElementId, MessageAssembler, MessageListener};
use super::values::{self, token};
use super::whitespace::{lws, owsp, sws, ParseResult};
use crate::config::CoreConfig;
use crate::error::{Error, Result};
use crate::message::Message;
use crate::types::{ByteView, HeaderId};

/// Parses a complete message from `bytes`.
///
/// The returned message keeps views into `bytes`; nothing is copied.
pub fn parse_message(bytes: impl Into<Bytes>, config: Arc<CoreConfig>) -> Result<Message> {
    let view = ByteView::new(bytes);
    let mut assembler = MessageAssembler::new(config);
    scan(&view, &mut assembler)?;
    assembler.finish()
}

/// Frames `input` and reports what it finds to `listener`.
///
/// Framing errors (no start line, a header line without a colon, a malformed
/// CSeq or Content-Length, a body shorter than its declared length) are
/// returned, as is any error raised by the listener.
pub fn scan<L: MessageListener + ?Sized>(input: &ByteView, listener: &mut L) -> Result<()> {
    let line_end = input
        .index_of(b"\r\n", 0)
        .ok_or_else(|| Error::Parse("missing start line".to_string()))?;
    start_line(&input.substring(0, line_end), listener)?;

    let mut pos = line_end + 2;
    let mut content_length = None;
    loop {
        if pos >= input.len() {
            return Err(Error::Parse("missing empty line after headers".to_string()));
        }
        if input.as_bytes()[pos..].starts_with(b"\r\n") {
            pos += 2;
            break;
        }
        let end = header_line_end(input, pos)?;
        if let Some(length) = header_line(&input.substring(pos, end), listener)? {
            content_length = Some(length);
        }
        pos = end + 2;
    }

    let remaining = input.substring_from(pos);
    let body = match content_length {
        Some(length) if length > remaining.len() => {
            return Err(Error::Parse(format!(
                "body truncated: Content-Length {} but {} bytes left",
                length,
                remaining.len()
            )));
        }
        Some(length) => remaining.substring(0, length),
        None => remaining,
    };
    if !body.is_empty() {
        listener.body_found(&body)?;
    }
    trace!(len = input.len(), body = body.len(), "message framed");
    listener.message_found()
}

fn is_version(bytes: &[u8]) -> bool {
    bytes.len() > 4 && bytes[..4].eq_ignore_ascii_case(b"SIP/")
}

/// Status-Line = SIP-Version SP Status-Code SP Reason-Phrase
fn status_line(input: &[u8]) -> ParseResult<(&[u8], u16, &[u8])> {
    all_consuming(tuple((
        terminated(take_while1(|c: u8| c != b' '), space1),
        map_res(take_while_m_n(3, 3, |c: u8| c.is_ascii_digit()), |d: &[u8]| {
            std::str::from_utf8(d)
                .map_err(|_| ())
                .and_then(|s| s.parse::<u16>().map_err(|_| ()))
        }),
        // The reason phrase may be empty but its separator may not.
        preceded(tag(b" "), rest),
    )))(input)
}

/// Request-Line = Method SP Request-URI SP SIP-Version
fn request_line(input: &[u8]) -> ParseResult<(&[u8], &[u8], &[u8])> {
    all_consuming(tuple((
        terminated(token, space1),
        terminated(take_while1(|c: u8| c != b' '), space1),
        take_while1(|c: u8| c != b' '),
    )))(input)
}

fn start_line<L: MessageListener + ?Sized>(line: &ByteView, listener: &mut L) -> Result<()> {
    let bytes = line.as_bytes();
    if bytes.starts_with(b"SIP/") {
        let (_, (version, code, reason)) = status_line(bytes)
            .map_err(|_| Error::Parse(format!("invalid status line {:?}", line)))?;
        let reason = line.slice_ref(reason).trim();
        return listener.response_begin(code, &reason, &line.slice_ref(version));
    }
    let (_, (method, uri, version)) = request_line(bytes)
        .map_err(|_| Error::Parse(format!("invalid request line {:?}", line)))?;
    if !is_version(version) {
        return Err(Error::Parse(format!("invalid SIP version in {:?}", line)));
    }
    listener.request_begin(
        &line.slice_ref(method).interned(),
        &line.slice_ref(uri),
        &line.slice_ref(version),
    )
}

/// Offset of the CRLF that ends the header line starting at `pos`, skipping
/// folded continuations.
fn header_line_end(input: &ByteView, pos: usize) -> Result<usize> {
    let bytes = input.as_bytes();
    let mut end = input
        .index_of(b"\r\n", pos)
        .ok_or_else(|| Error::Parse("unterminated header line".to_string()))?;
    while end + 2 < bytes.len() && matches!(bytes[end + 2], b' ' | b'\t') {
        end = input
            .index_of(b"\r\n", end + 2)
            .ok_or_else(|| Error::Parse("unterminated folded header line".to_string()))?;
    }
    Ok(end)
}

/// Reports one header line. Returns the Content-Length when the line carried it.
fn header_line<L: MessageListener + ?Sized>(line: &ByteView, listener: &mut L) -> Result<Option<usize>> {
    let colon = line
        .index_of_byte(b':', 0)
        .ok_or_else(|| Error::Parse(format!("header line without colon {:?}", line)))?;
    let name = line.substring(0, colon).trim();
    if name.is_empty() || !name.as_bytes().iter().all(|c| values::is_token_char(*c)) {
        return Err(Error::Parse(format!("invalid header name {:?}", name)));
    }
    let value = line.substring_from(colon + 1).trim();

    let id = match HeaderId::from_name(name.as_bytes()) {
        Some(id) => id,
        None => {
            listener.unknown_found(&name, &value)?;
            return Ok(None);
        }
    };

    let mut content_length = None;
    if id == HeaderId::ContentLength {
        let (_, length) = values::number_value(value.as_bytes())
            .map_err(|_| Error::Parse(format!("invalid Content-Length {:?}", value)))?;
        let length = usize::try_from(length)
            .map_err(|_| Error::Parse(format!("Content-Length {} out of range", length)))?;
        content_length = Some(length);
    }
    if !listener.header_begin(id) {
        return Ok(content_length);
    }

    match id {
        HeaderId::CSeq => {
            let (_, (number, method)) = cseq_spans(value.as_bytes())
                .map_err(|_| Error::Parse(format!("invalid CSeq {:?}", value)))?;
            listener.element_found(id, ElementId::CSeqNumber, &value.slice_ref(number))?;
            listener.element_found(id, ElementId::CSeqMethod, &value.slice_ref(method))?;
        }
        HeaderId::CallId => listener.element_found(id, ElementId::CallId, &value)?,
        HeaderId::ContentLength => listener.element_found(id, ElementId::ContentLength, &value)?,
        _ if id.is_comma_joinable() => {
            for element in split_list(&value) {
                listener.header_found(id, &element)?;
            }
        }
        _ => listener.header_found(id, &value)?,
    }
    Ok(content_length)
}

/// CSeq = 1*DIGIT LWS Method, returned as spans
fn cseq_spans(input: &[u8]) -> ParseResult<(&[u8], &[u8])> {
    all_consuming(delimited(owsp, pair(terminated(digit1, lws), token), sws))(input)
}

/// Splits a list header value at commas outside quoted strings and angle
/// brackets. Empty elements are dropped.
pub(crate) fn split_list(value: &ByteView) -> Vec<ByteView> {
    let bytes = value.as_bytes();
    let mut elements = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut in_angle = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if in_quotes => i += 1,
            b'"' => in_quotes = !in_quotes,
            b'<' if !in_quotes => in_angle = true,
            b'>' if !in_quotes => in_angle = false,
            b',' if !in_quotes && !in_angle => {
                elements.push(value.substring(start, i).trim());
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    elements.push(value.substring(start, bytes.len()).trim());
    elements.retain(|element| !element.is_empty());
    elements
}
