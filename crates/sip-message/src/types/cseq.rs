use std::fmt;

use bytes::{BufMut, BytesMut};

use super::byte_view::ByteView;
use crate::error::Result;
use crate::parser::values;

/// CSeq value: sequence number and method
///
/// Messages keep CSeq as two scalar fields; this type is the header view
/// synthesized from them and the parsed form of a raw CSeq value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CSeq {
    pub number: u64,
    pub method: ByteView,
}

impl CSeq {
    pub fn new(number: u64, method: impl Into<ByteView>) -> Self {
        CSeq {
            number,
            method: method.into().interned(),
        }
    }

    /// Parses `1*DIGIT LWS Method`; the method is interned when it is a
    /// known one.
    pub fn parse(value: &ByteView) -> Result<CSeq> {
        let (_, (number, method)) = values::cseq(value.as_bytes())?;
        Ok(CSeq {
            number,
            method: value.slice_ref(method).interned(),
        })
    }

    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        buf.put_slice(self.number.to_string().as_bytes());
        buf.put_u8(b' ');
        buf.put_slice(self.method.as_bytes());
    }
}

impl fmt::Display for CSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.number, self.method)
    }
}
