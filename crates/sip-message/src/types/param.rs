//! # Header and URI parameters
//!
//! `;name=value` pairs as they trail Via, To, From, Contact and URI values.
//! Names are interned when they are common tokens (`tag`, `branch`, ...) and
//! compare ignoring ASCII case; values compare exactly.

use std::fmt;

use bytes::{BufMut, BytesMut};

use super::byte_view::ByteView;
use crate::parser::values::RawParam;

/// A single `name[=value]` parameter
#[derive(Debug, Clone)]
pub struct Param {
    name: ByteView,
    value: Option<ByteView>,
}

impl Param {
    /// Creates a parameter; `value` is `None` for flag parameters like `lr`.
    pub fn new(name: impl Into<ByteView>, value: Option<ByteView>) -> Self {
        Param {
            name: name.into().interned(),
            value,
        }
    }

    /// Shorthand for a `branch` parameter
    pub fn branch(value: impl Into<ByteView>) -> Self {
        Param::new("branch", Some(value.into()))
    }

    /// Shorthand for a `tag` parameter
    pub fn tag(value: impl Into<ByteView>) -> Self {
        Param::new("tag", Some(value.into()))
    }

    pub fn name(&self) -> &ByteView {
        &self.name
    }

    pub fn value(&self) -> Option<&ByteView> {
        self.value.as_ref()
    }

    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(b';');
        buf.put_slice(self.name.as_bytes());
        if let Some(value) = &self.value {
            buf.put_u8(b'=');
            buf.put_slice(value.as_bytes());
        }
    }
}

impl PartialEq for Param {
    fn eq(&self, other: &Self) -> bool {
        self.name.equals_ignore_case(&other.name) && self.value == other.value
    }
}

impl Eq for Param {}

/// Ordered parameter list
#[derive(Debug, Clone, Default)]
pub struct Params(Vec<Param>);

impl Params {
    pub fn new() -> Self {
        Params(Vec::new())
    }

    /// Builds the list from parser output, re-anchoring every slice in `source`.
    pub(crate) fn from_raw(source: &ByteView, raw: &[RawParam<'_>]) -> Self {
        Params(
            raw.iter()
                .map(|(name, value)| Param {
                    name: source.slice_ref(name).interned(),
                    value: value.map(|v| source.slice_ref(v)),
                })
                .collect(),
        )
    }

    /// Value of the first parameter called `name` (ASCII case-insensitive).
    /// A flag parameter yields `Some(None)`.
    pub fn get(&self, name: &[u8]) -> Option<Option<&ByteView>> {
        self.0
            .iter()
            .find(|p| p.name.eq_ignore_case_bytes(name))
            .map(|p| p.value.as_ref())
    }

    /// Value of `name`, flattening flag parameters to `None`.
    pub fn value_of(&self, name: &[u8]) -> Option<&ByteView> {
        self.get(name).flatten()
    }

    pub fn contains(&self, name: &[u8]) -> bool {
        self.get(name).is_some()
    }

    /// Replaces the first parameter called `name`, or appends one.
    pub fn set(&mut self, param: Param) {
        match self.0.iter_mut().find(|p| p.name.equals_ignore_case(&param.name)) {
            Some(existing) => *existing = param,
            None => self.0.push(param),
        }
    }

    /// Removes every parameter called `name`; returns whether any existed.
    pub fn remove(&mut self, name: &[u8]) -> bool {
        let before = self.0.len();
        self.0.retain(|p| !p.name.eq_ignore_case_bytes(name));
        before != self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        for param in &self.0 {
            param.encode(buf);
        }
    }
}

/// Parameter order is not significant.
impl PartialEq for Params {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self.0.iter().all(|p| other.0.iter().any(|q| p == q))
    }
}

impl Eq for Params {}

impl FromIterator<Param> for Params {
    fn from_iter<I: IntoIterator<Item = Param>>(iter: I) -> Self {
        Params(iter.into_iter().collect())
    }
}

impl fmt::Display for Params {
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
    fn test_get_and_flags() {
        let params: Params = vec![
            Param::branch("z9hG4bK1"),
            Param::new("rport", None),
        ]
        .into_iter()
        .collect();
        assert_eq!(params.value_of(b"BRANCH").unwrap(), &"z9hG4bK1");
        assert_eq!(params.get(b"rport"), Some(None));
        assert_eq!(params.get(b"received"), None);
        assert_eq!(params.to_string(), ";branch=z9hG4bK1;rport");
    }

    #[test]
    fn test_names_are_interned() {
        let p = Param::tag("abc");
        assert!(p.name().is_interned());
    }

    #[test]
    fn test_set_and_remove() {
        let mut params = Params::new();
        params.set(Param::tag("1"));
        params.set(Param::tag("2"));
        assert_eq!(params.len(), 1);
        assert_eq!(params.value_of(b"tag").unwrap(), &"2");
        assert!(params.remove(b"TAG"));
        assert!(params.is_empty());
    }

    #[test]
    fn test_equality_ignores_order() {
        let a: Params = vec![Param::tag("1"), Param::new("lr", None)].into_iter().collect();
        let b: Params = vec![Param::new("LR", None), Param::tag("1")].into_iter().collect();
        let c: Params = vec![Param::tag("2"), Param::new("lr", None)].into_iter().collect();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
