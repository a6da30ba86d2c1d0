//! Two-tier header storage.
//!
//! Identities whose priority is below the configured hot level live in a
//! fixed array indexed by priority. Everything else, extension headers
//! included, goes to an overflow list keyed by name that preserves
//! insertion order. In-built headers never reach the store.

use std::collections::VecDeque;

use crate::types::{Header, HeaderKind, HeaderName, HOT_SLOT_CAPACITY};

/// Storage form of one header identity
#[derive(Debug, Clone)]
pub enum HeaderSlot {
    /// A singular header
    Single(Header),
    /// The values of a list header, in arrival order
    List(VecDeque<Header>),
}

impl HeaderSlot {
    pub fn first(&self) -> Option<&Header> {
        match self {
            HeaderSlot::Single(header) => Some(header),
            HeaderSlot::List(list) => list.front(),
        }
    }

    pub fn first_mut(&mut self) -> Option<&mut Header> {
        match self {
            HeaderSlot::Single(header) => Some(header),
            HeaderSlot::List(list) => list.front_mut(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            HeaderSlot::Single(_) => 1,
            HeaderSlot::List(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = &Header> + '_> {
        match self {
            HeaderSlot::Single(header) => Box::new(std::iter::once(header)),
            HeaderSlot::List(list) => Box::new(list.iter()),
        }
    }

    pub fn iter_mut(&mut self) -> Box<dyn Iterator<Item = &mut Header> + '_> {
        match self {
            HeaderSlot::Single(header) => Box::new(std::iter::once(header)),
            HeaderSlot::List(list) => Box::new(list.iter_mut()),
        }
    }

    fn into_headers(self) -> Vec<Header> {
        match self {
            HeaderSlot::Single(header) => vec![header],
            HeaderSlot::List(list) => list.into(),
        }
    }
}

impl PartialEq for HeaderSlot {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

#[derive(Debug, Clone)]
struct OverflowEntry {
    name: HeaderName,
    slot: HeaderSlot,
}

/// Hot slot array plus overflow list
#[derive(Debug, Clone)]
pub struct HeaderStore {
    hot: [Option<HeaderSlot>; HOT_SLOT_CAPACITY],
    hot_level: usize,
    overflow: Vec<OverflowEntry>,
}

impl HeaderStore {
    /// Creates an empty store; `hot_level` is clamped to the slot capacity.
    pub fn new(hot_level: usize) -> Self {
        HeaderStore {
            hot: std::array::from_fn(|_| None),
            hot_level: hot_level.min(HOT_SLOT_CAPACITY),
            overflow: Vec::new(),
        }
    }

    pub fn hot_level(&self) -> usize {
        self.hot_level
    }

    fn hot_index(&self, name: &HeaderName) -> Option<usize> {
        name.id()
            .map(|id| id.priority())
            .filter(|priority| *priority < self.hot_level)
    }

    /// Returns `true` if `name` is stored in a hot slot under this store's level.
    pub fn is_hot(&self, name: &HeaderName) -> bool {
        self.hot_index(name).is_some()
    }

    pub fn slot(&self, name: &HeaderName) -> Option<&HeaderSlot> {
        match self.hot_index(name) {
            Some(index) => self.hot[index].as_ref(),
            None => self
                .overflow
                .iter()
                .find(|entry| entry.name == *name)
                .map(|entry| &entry.slot),
        }
    }

    pub fn slot_mut(&mut self, name: &HeaderName) -> Option<&mut HeaderSlot> {
        match self.hot_index(name) {
            Some(index) => self.hot[index].as_mut(),
            None => self
                .overflow
                .iter_mut()
                .find(|entry| entry.name == *name)
                .map(|entry| &mut entry.slot),
        }
    }

    fn take_slot(&mut self, name: &HeaderName) -> Option<HeaderSlot> {
        match self.hot_index(name) {
            Some(index) => self.hot[index].take(),
            None => {
                let pos = self.overflow.iter().position(|entry| entry.name == *name)?;
                Some(self.overflow.remove(pos).slot)
            }
        }
    }

    fn put_slot(&mut self, name: HeaderName, slot: HeaderSlot) {
        match self.hot_index(&name) {
            Some(index) => self.hot[index] = Some(slot),
            None => match self.overflow.iter_mut().find(|entry| entry.name == name) {
                Some(entry) => entry.slot = slot,
                None => self.overflow.push(OverflowEntry { name, slot }),
            },
        }
    }

    /// Stores `header`. Singular identities replace their previous value, which
    /// is returned; list identities append, or prepend when `prepend` is set.
    pub fn add(&mut self, header: Header, prepend: bool) -> Option<Header> {
        let name = header.name().clone();
        match name.kind() {
            HeaderKind::Singular => match self.slot_mut(&name) {
                Some(slot) => std::mem::replace(slot, HeaderSlot::Single(header))
                    .into_headers()
                    .pop(),
                None => {
                    self.put_slot(name, HeaderSlot::Single(header));
                    None
                }
            },
            HeaderKind::List => {
                match self.slot_mut(&name) {
                    Some(HeaderSlot::List(list)) => {
                        if prepend {
                            list.push_front(header);
                        } else {
                            list.push_back(header);
                        }
                    }
                    _ => {
                        let mut list = VecDeque::with_capacity(2);
                        list.push_back(header);
                        self.put_slot(name, HeaderSlot::List(list));
                    }
                }
                None
            }
        }
    }

    /// Removes the first (or only) value of `name`.
    pub fn remove_first(&mut self, name: &HeaderName) -> Option<Header> {
        if let HeaderSlot::List(list) = self.slot_mut(name)? {
            if list.len() > 1 {
                return list.pop_front();
            }
        }
        // Last value: drop the slot so the identity disappears entirely.
        self.take_slot(name).and_then(|slot| slot.into_headers().pop())
    }

    /// Removes every value of `name`.
    pub fn remove_all(&mut self, name: &HeaderName) -> Vec<Header> {
        self.take_slot(name).map(HeaderSlot::into_headers).unwrap_or_default()
    }

    /// Replaces the first value of the header's identity, or adds it.
    /// Returns the replaced value.
    pub fn update(&mut self, header: Header) -> Option<Header> {
        let name = header.name().clone();
        match self.slot_mut(&name).and_then(HeaderSlot::first_mut) {
            Some(first) => Some(std::mem::replace(first, header)),
            None => self.add(header, false),
        }
    }

    /// Number of stored header values.
    pub fn len(&self) -> usize {
        self.slots().map(|(_, slot)| slot.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Occupied hot slots in priority order.
    pub fn hot_slots(&self) -> impl Iterator<Item = (HeaderName, &HeaderSlot)> + '_ {
        self.hot
            .iter()
            .filter_map(|slot| slot.as_ref())
            .filter_map(|slot| slot.first().map(|h| (h.name().clone(), slot)))
    }

    /// Overflow entries in insertion order.
    pub fn overflow_slots(&self) -> impl Iterator<Item = (HeaderName, &HeaderSlot)> + '_ {
        self.overflow.iter().map(|entry| (entry.name.clone(), &entry.slot))
    }

    /// Every slot: hot slots in priority order, then overflow in insertion order.
    pub fn slots(&self) -> impl Iterator<Item = (HeaderName, &HeaderSlot)> + '_ {
        self.hot_slots().chain(self.overflow_slots())
    }

    /// Every header value in serialization order.
    pub fn iter(&self) -> impl Iterator<Item = &Header> + '_ {
        self.slots().flat_map(|(_, slot)| slot.iter())
    }

    /// Mutable access to every header value.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Header> + '_ {
        let hot = self.hot.iter_mut().filter_map(Option::as_mut);
        let overflow = self.overflow.iter_mut().map(|entry| &mut entry.slot);
        hot.chain(overflow).flat_map(HeaderSlot::iter_mut)
    }
}

/// Same identities with equal values in the same order. Storage tier and
/// the relative order of different identities do not matter.
impl PartialEq for HeaderStore {
    fn eq(&self, other: &Self) -> bool {
        let mut count = 0;
        for (name, slot) in self.slots() {
            count += 1;
            match other.slot(&name) {
                Some(theirs) if theirs == slot => {}
                _ => return false,
            }
        }
        count == other.slots().count()
    }
}
