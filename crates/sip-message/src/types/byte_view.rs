//! # Byte views
//!
//! [`ByteView`] is the zero-copy primitive every protocol token in this crate is
//! built from. A view is a window (`start`, `len`) over a shared, immutable
//! [`Bytes`] buffer; slicing a view never copies, and two views may alias the
//! same inbound datagram.
//!
//! The backing buffer cannot be mutated through a view. The only way to get
//! writable bytes is to copy them out ([`ByteView::copy`] or
//! [`ByteView::to_bytes_mut`]).
//!
//! ## Examples
//!
//! ```rust
//! use rvoip_sip_message::types::ByteView;
//!
//! let line = ByteView::from_static(b"INVITE sip:bob@biloxi.com SIP/2.0");
//! let method = line.substring(0, 6);
//! assert!(method.equals_ignore_case(&ByteView::from_static(b"invite")));
//! assert_eq!(method.hash_code(), 2164597513);
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use bytes::{Bytes, BytesMut};

use super::token_table;

/// Multiplier of the Java `String.hashCode` polynomial.
const MULT: u32 = 31;

/// An immutable, zero-copy slice over protocol bytes.
#[derive(Clone)]
pub struct ByteView {
    buffer: Bytes,
    start: usize,
    len: usize,
    hash: OnceLock<u32>,
}

impl ByteView {
    /// Creates a view over `len` bytes of `buffer` starting at `start`.
    ///
    /// # Panics
    ///
    /// Panics when `start + len` exceeds the buffer length. Spans handed to the
    /// core are validated by the parser first, so a violation is a bug.
    pub fn from_bytes(buffer: Bytes, start: usize, len: usize) -> Self {
        let end = start.checked_add(len).expect("ByteView span overflows usize");
        assert!(
            end <= buffer.len(),
            "ByteView bounds violation: {}..{} over a buffer of {} bytes",
            start,
            end,
            buffer.len()
        );
        ByteView {
            buffer,
            start,
            len,
            hash: OnceLock::new(),
        }
    }

    /// Creates a view covering a whole buffer.
    pub fn new(buffer: impl Into<Bytes>) -> Self {
        let buffer = buffer.into();
        let len = buffer.len();
        Self::from_bytes(buffer, 0, len)
    }

    /// Creates a view over static bytes without allocating.
    pub fn from_static(bytes: &'static [u8]) -> Self {
        Self::new(Bytes::from_static(bytes))
    }

    /// The empty view.
    pub fn empty() -> Self {
        Self::from_static(b"")
    }

    /// The viewed bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[self.start..self.start + self.len]
    }

    /// Offset of the view inside its backing buffer.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Number of bytes in the view.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when the view holds no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The backing buffer, shared with every view aliasing it.
    pub fn buffer(&self) -> &Bytes {
        &self.buffer
    }

    /// Returns the viewed bytes as a `Bytes` handle sharing the backing buffer.
    pub fn to_bytes(&self) -> Bytes {
        self.buffer.slice(self.start..self.start + self.len)
    }

    /// Copies the viewed bytes into a writable buffer.
    pub fn to_bytes_mut(&self) -> BytesMut {
        BytesMut::from(self.as_bytes())
    }

    /// Byte at `index`, relative to the start of the view.
    ///
    /// # Panics
    ///
    /// Panics when `index >= len()`.
    pub fn byte_at(&self, index: usize) -> u8 {
        assert!(index < self.len, "ByteView index {} out of range {}", index, self.len);
        self.buffer[self.start + index]
    }

    /// Byte-wise equality.
    pub fn equals(&self, other: &ByteView) -> bool {
        self.as_bytes() == other.as_bytes()
    }

    /// Byte-wise equality with ASCII letter folding.
    ///
    /// Only `A-Z`/`a-z` fold; bytes at or above `0x80` compare literally.
    pub fn equals_ignore_case(&self, other: &ByteView) -> bool {
        self.eq_ignore_case_bytes(other.as_bytes())
    }

    /// [`equals_ignore_case`](Self::equals_ignore_case) against a raw slice.
    pub fn eq_ignore_case_bytes(&self, other: &[u8]) -> bool {
        self.as_bytes().eq_ignore_ascii_case(other)
    }

    /// Java `String.hashCode` compatible hash (`h = 31 * h + byte`), cached
    /// after the first call. The empty view hashes to `0`.
    pub fn hash_code(&self) -> u32 {
        *self.hash.get_or_init(|| java_hash(self.as_bytes()))
    }

    /// Lexicographic comparison over raw byte values.
    pub fn compare(&self, other: &ByteView) -> Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }

    /// A new view of bytes `begin..end` of this view, sharing the buffer.
    ///
    /// # Panics
    ///
    /// Panics when `begin > end` or `end > len()`.
    pub fn substring(&self, begin: usize, end: usize) -> ByteView {
        assert!(
            begin <= end && end <= self.len,
            "ByteView substring {}..{} out of range {}",
            begin,
            end,
            self.len
        );
        ByteView::from_bytes(self.buffer.clone(), self.start + begin, end - begin)
    }

    /// A view of the bytes from `begin` to the end of this view.
    pub fn substring_from(&self, begin: usize) -> ByteView {
        self.substring(begin, self.len)
    }

    /// Converts a sub-slice of [`as_bytes`](Self::as_bytes) back into a view
    /// over the same buffer.
    ///
    /// # Panics
    ///
    /// Panics when `subset` does not point inside this view.
    pub fn slice_ref(&self, subset: &[u8]) -> ByteView {
        if subset.is_empty() {
            return ByteView::from_bytes(self.buffer.clone(), self.start, 0);
        }
        let base = self.as_bytes().as_ptr() as usize;
        let sub = subset.as_ptr() as usize;
        assert!(
            sub >= base && sub + subset.len() <= base + self.len,
            "slice_ref: subset is not contained in this view"
        );
        self.substring(sub - base, sub - base + subset.len())
    }

    /// Position of the first occurrence of `needle` at or after `from`.
    ///
    /// A plain first-byte anchored scan; protocol tokens are short. An empty
    /// needle matches at `from`.
    pub fn index_of(&self, needle: &[u8], from: usize) -> Option<usize> {
        if needle.is_empty() {
            return Some(from);
        }
        let hay = self.as_bytes();
        if needle.len() > hay.len() {
            return None;
        }
        let first = needle[0];
        let last_start = hay.len() - needle.len();
        let mut i = from;
        while i <= last_start {
            if hay[i] != first {
                i += 1;
                continue;
            }
            if &hay[i + 1..i + needle.len()] == &needle[1..] {
                return Some(i);
            }
            i += 1;
        }
        None
    }

    /// Position of the first occurrence of `byte` at or after `from`.
    pub fn index_of_byte(&self, byte: u8, from: usize) -> Option<usize> {
        let hay = self.as_bytes();
        if from >= hay.len() {
            return None;
        }
        hay[from..].iter().position(|b| *b == byte).map(|p| p + from)
    }

    /// Position of the last occurrence of `needle`. An empty needle matches
    /// at `len()`.
    pub fn last_index_of(&self, needle: &[u8]) -> Option<usize> {
        let hay = self.as_bytes();
        if needle.len() > hay.len() {
            return None;
        }
        (0..=hay.len() - needle.len())
            .rev()
            .find(|&i| &hay[i..i + needle.len()] == needle)
    }

    /// Position of the last occurrence of `byte`.
    pub fn last_index_of_byte(&self, byte: u8) -> Option<usize> {
        self.as_bytes().iter().rposition(|b| *b == byte)
    }

    /// Returns `true` if the view begins with `prefix`.
    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.as_bytes().starts_with(prefix)
    }

    /// Case-insensitive [`starts_with`](Self::starts_with).
    pub fn starts_with_ignore_case(&self, prefix: &[u8]) -> bool {
        self.len >= prefix.len() && self.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix)
    }

    /// The view without leading and trailing SP, HTAB, CR and LF.
    pub fn trim(&self) -> ByteView {
        let bytes = self.as_bytes();
        let is_ws = |b: &u8| matches!(*b, b' ' | b'\t' | b'\r' | b'\n');
        let begin = bytes.iter().position(|b| !is_ws(b)).unwrap_or(bytes.len());
        let end = bytes.iter().rposition(|b| !is_ws(b)).map(|p| p + 1).unwrap_or(begin);
        self.substring(begin, end)
    }

    /// Copies the bytes into a fresh buffer at offset zero.
    ///
    /// This is the only way to obtain a view that does not alias the
    /// original buffer.
    pub fn copy(&self) -> ByteView {
        ByteView::new(Bytes::copy_from_slice(self.as_bytes()))
    }

    /// ASCII-lowercased copy of the view. Returns the same view when it has no
    /// uppercase letters.
    pub fn to_lowercase(&self) -> ByteView {
        if !self.as_bytes().iter().any(u8::is_ascii_uppercase) {
            return self.clone();
        }
        ByteView::new(self.as_bytes().to_ascii_lowercase())
    }

    /// Parses the view as an unsigned decimal number.
    pub fn parse_u64(&self) -> Option<u64> {
        let bytes = self.as_bytes();
        if bytes.is_empty() || bytes.len() > 20 {
            return None;
        }
        let mut value: u64 = 0;
        for b in bytes {
            if !b.is_ascii_digit() {
                return None;
            }
            value = value.checked_mul(10)?.checked_add(u64::from(b - b'0'))?;
        }
        Some(value)
    }

    /// Parses the view as a non-negative `i32`.
    pub fn parse_i32(&self) -> Option<i32> {
        self.parse_u64().and_then(|v| i32::try_from(v).ok())
    }

    /// Returns `true` when both views point at the same bytes of the same
    /// buffer. Interned singletons compare identical.
    pub fn ptr_eq(&self, other: &ByteView) -> bool {
        self.len == other.len && self.as_bytes().as_ptr() == other.as_bytes().as_ptr()
    }

    /// Returns `true` if this view is one of the shared token singletons.
    pub fn is_interned(&self) -> bool {
        token_table::lookup(self.as_bytes()).map_or(false, |t| t.ptr_eq(self))
    }

    /// Returns the interned singleton for `buffer[start..start+len]`, or a new
    /// view over `buffer` when the token is unknown.
    pub fn intern(buffer: &Bytes, start: usize, len: usize) -> ByteView {
        match token_table::lookup(&buffer[start..start + len]) {
            Some(token) => token,
            None => ByteView::from_bytes(buffer.clone(), start, len),
        }
    }

    /// Like [`intern`](Self::intern) but matches the lowercased token. On a miss
    /// the lowercased bytes are copied into a fresh buffer.
    pub fn intern_lowercased(buffer: &Bytes, start: usize, len: usize) -> ByteView {
        let src = &buffer[start..start + len];
        let mut scratch = [0u8; 32];
        if len <= scratch.len() {
            let folded = &mut scratch[..len];
            for (dst, b) in folded.iter_mut().zip(src) {
                *dst = b.to_ascii_lowercase();
            }
            if let Some(token) = token_table::lookup(folded) {
                return token;
            }
            return ByteView::new(Bytes::copy_from_slice(folded));
        }
        ByteView::new(src.to_ascii_lowercase())
    }

    /// Interns a whole view.
    pub fn interned(self) -> ByteView {
        token_table::lookup(self.as_bytes()).unwrap_or(self)
    }

    /// Lossy UTF-8 rendering, for logs and errors.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(self.as_bytes()).into_owned()
    }
}

/// Java `String.hashCode` over bytes treated as Latin-1 characters.
pub fn java_hash(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(0u32, |h, b| h.wrapping_mul(MULT).wrapping_add(u32::from(*b)))
}

impl Default for ByteView {
    fn default() -> Self {
        ByteView::empty()
    }
}

impl PartialEq for ByteView {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl Eq for ByteView {}

impl PartialEq<[u8]> for ByteView {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_bytes() == other
    }
}

impl PartialEq<&[u8]> for ByteView {
    fn eq(&self, other: &&[u8]) -> bool {
        self.as_bytes() == *other
    }
}

impl<const N: usize> PartialEq<&[u8; N]> for ByteView {
    fn eq(&self, other: &&[u8; N]) -> bool {
        self.as_bytes() == &other[..]
    }
}

impl PartialEq<&str> for ByteView {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialOrd for ByteView {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl Ord for ByteView {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl Hash for ByteView {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

impl AsRef<[u8]> for ByteView {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Display for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

impl fmt::Debug for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteView({:?})", String::from_utf8_lossy(self.as_bytes()))
    }
}

impl From<&'static str> for ByteView {
    fn from(s: &'static str) -> Self {
        ByteView::from_static(s.as_bytes())
    }
}

impl From<&'static [u8]> for ByteView {
    fn from(b: &'static [u8]) -> Self {
        ByteView::from_static(b)
    }
}

impl From<String> for ByteView {
    fn from(s: String) -> Self {
        ByteView::new(s.into_bytes())
    }
}

impl From<Vec<u8>> for ByteView {
    fn from(v: Vec<u8>) -> Self {
        ByteView::new(v)
    }
}

impl From<Bytes> for ByteView {
    fn from(b: Bytes) -> Self {
        ByteView::new(b)
    }
}
