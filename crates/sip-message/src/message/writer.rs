//! Wire encoding of a message (RFC 3261 §7).
//!
//! Header order is fixed: hot slots in priority order, then Call-ID, CSeq and
//! Content-Length, then overflow headers in insertion order. Content-Length
//! is always the current body length.

use bytes::{BufMut, BytesMut};

use super::MessageCore;
use crate::types::{Header, HeaderId, HeaderName, HeaderValue};

/// Rough size of the header section, to size the output buffer once.
pub(crate) fn estimate_len(core: &MessageCore) -> usize {
    let headers: usize = core
        .headers()
        .iter()
        .map(|h| h.name().as_bytes().len() + h.value().to_bytes().len() + 4)
        .sum();
    128 + headers + core.body().len()
}

/// The Max-Forwards header a request gets at finalization, if it lacks one.
pub(crate) fn missing_max_forwards(core: &MessageCore, is_request: bool) -> Option<Header> {
    if !is_request {
        return None;
    }
    let value = core.config().default_max_forwards?;
    let name = HeaderName::Known(HeaderId::MaxForwards);
    if core.headers().slot(&name).is_some() {
        return None;
    }
    Some(Header::with_value(name, HeaderValue::Number(u64::from(value))))
}

/// Writes everything after the start line.
///
/// A missing Max-Forwards is emitted where [`MessageCore::add_header`] would
/// have stored it, so the output equals what finalization produces.
pub(crate) fn encode_headers_and_body(core: &MessageCore, is_request: bool, buf: &mut BytesMut) {
    let compact = core.config().compact_headers;
    let store = core.headers();
    let mut pending_max_forwards = missing_max_forwards(core, is_request);
    let max_forwards_is_hot = store.is_hot(&HeaderName::Known(HeaderId::MaxForwards));

    for (name, slot) in store.hot_slots() {
        if max_forwards_is_hot && name.id().map_or(false, |id| id > HeaderId::MaxForwards) {
            if let Some(mf) = pending_max_forwards.take() {
                mf.encode_line(buf, compact);
            }
        }
        for header in slot.iter() {
            header.encode_line(buf, compact);
        }
    }
    if max_forwards_is_hot {
        if let Some(mf) = pending_max_forwards.take() {
            mf.encode_line(buf, compact);
        }
    }

    encode_in_built(core, compact, buf);

    for (_, slot) in store.overflow_slots() {
        for header in slot.iter() {
            header.encode_line(buf, compact);
        }
    }
    if let Some(mf) = pending_max_forwards.take() {
        mf.encode_line(buf, compact);
    }

    buf.put_slice(b"\r\n");
    buf.put_slice(core.body().as_bytes());
}

fn encode_in_built(core: &MessageCore, compact: bool, buf: &mut BytesMut) {
    let name = |id: HeaderId| HeaderName::Known(id);
    if let Some(call_id) = core.call_id() {
        buf.put_slice(name(HeaderId::CallId).wire_name(compact));
        buf.put_slice(b": ");
        buf.put_slice(call_id.as_bytes());
        buf.put_slice(b"\r\n");
    }
    if let Some(method) = core.cseq_method() {
        buf.put_slice(name(HeaderId::CSeq).wire_name(compact));
        buf.put_slice(b": ");
        buf.put_slice(core.cseq_number().to_string().as_bytes());
        buf.put_u8(b' ');
        buf.put_slice(method.as_bytes());
        buf.put_slice(b"\r\n");
    }
    buf.put_slice(name(HeaderId::ContentLength).wire_name(compact));
    buf.put_slice(b": ");
    buf.put_slice(core.body().len().to_string().as_bytes());
    buf.put_slice(b"\r\n");
}
