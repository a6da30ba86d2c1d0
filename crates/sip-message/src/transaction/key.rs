use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{BitOr, BitOrAssign};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::types::ByteView;

/// How a transaction key was computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyAlgorithm {
    /// RFC 3261 §17: the topmost Via branch, which starts with `z9hG4bK`
    BranchCookie,
    /// RFC 2543 matching over To, From, Call-ID, CSeq, Via and Request-URI
    Classic,
}

/// Flags that select which message components take part in key matching.
///
/// Contexts combine with `|`:
///
/// ```rust
/// use rvoip_sip_message::transaction::KeyContext;
///
/// let context = KeyContext::USE_VIA | KeyContext::INCOMING;
/// assert!(context.contains(KeyContext::USE_VIA));
/// assert!(!context.contains(KeyContext::LOOKUP));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyContext(u16);

impl KeyContext {
    /// Classic keys: compare top Via host, port and branch
    pub const USE_VIA: KeyContext = KeyContext(0x01);
    /// Classic keys of requests: compare Request-URI user, host and port
    pub const USE_URI: KeyContext = KeyContext(0x02);
    /// Ignore the CSeq method, so ACK and CANCEL find their INVITE
    pub const LOOKUP: KeyContext = KeyContext(0x04);
    /// The message was received: branch keys compare the Via sent-by, classic
    /// keys the configured uniquifier header
    pub const INCOMING: KeyContext = KeyContext(0x08);
    /// Classic keys: compare the To tag
    pub const USE_TO_TAG: KeyContext = KeyContext(0x10);
    /// Compare the CSeq method for every method, not only ACK, CANCEL and PRACK
    pub const USE_METHOD: KeyContext = KeyContext(0x20);

    pub const fn empty() -> Self {
        KeyContext(0)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn from_bits(bits: u16) -> Self {
        KeyContext(bits)
    }

    pub const fn contains(self, other: KeyContext) -> bool {
        self.0 & other.0 == other.0
    }

    /// The context two keys are compared under: a component takes part only
    /// when both keys ask for it, while `LOOKUP` on either side applies.
    fn shared(self, other: KeyContext) -> KeyContext {
        let lookup = (self.0 | other.0) & Self::LOOKUP.0;
        KeyContext((self.0 & other.0 & !Self::LOOKUP.0) | lookup)
    }
}

impl BitOr for KeyContext {
    type Output = KeyContext;

    fn bitor(self, rhs: KeyContext) -> KeyContext {
        KeyContext(self.0 | rhs.0)
    }
}

impl BitOrAssign for KeyContext {
    fn bitor_assign(&mut self, rhs: KeyContext) {
        self.0 |= rhs.0;
    }
}

/// Components of a classic key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassicField {
    ToTag,
    ToUser,
    ToHost,
    ToPort,
    FromUser,
    FromHost,
    FromPort,
    FromTag,
    CallId,
    CSeqNumber,
    ViaHost,
    ViaPort,
    ViaBranch,
    UriUser,
    UriHost,
    UriPort,
    Uniquifier,
    CSeqMethod,
}

pub(crate) const CLASSIC_FIELD_COUNT: usize = 18;

impl ClassicField {
    const BASE: [ClassicField; 9] = [
        ClassicField::ToUser,
        ClassicField::ToHost,
        ClassicField::ToPort,
        ClassicField::FromUser,
        ClassicField::FromHost,
        ClassicField::FromPort,
        ClassicField::FromTag,
        ClassicField::CallId,
        ClassicField::CSeqNumber,
    ];
    const VIA: [ClassicField; 3] = [
        ClassicField::ViaHost,
        ClassicField::ViaPort,
        ClassicField::ViaBranch,
    ];
    const URI: [ClassicField; 3] = [
        ClassicField::UriUser,
        ClassicField::UriHost,
        ClassicField::UriPort,
    ];

    fn is_port(self) -> bool {
        matches!(
            self,
            ClassicField::ToPort | ClassicField::FromPort | ClassicField::ViaPort | ClassicField::UriPort
        )
    }
}

/// The components of a classic key, copied out of the finalized message into
/// one buffer. Absent components are empty.
#[derive(Clone)]
pub struct ClassicFingerprint {
    bytes: Bytes,
    spans: [(usize, usize); CLASSIC_FIELD_COUNT],
    is_request: bool,
}

impl ClassicFingerprint {
    pub(crate) fn new(bytes: Bytes, spans: [(usize, usize); CLASSIC_FIELD_COUNT], is_request: bool) -> Self {
        ClassicFingerprint {
            bytes,
            spans,
            is_request,
        }
    }

    /// Bytes of `field`; empty when the message did not carry it.
    pub fn get(&self, field: ClassicField) -> &[u8] {
        let (start, len) = self.spans[field as usize];
        &self.bytes[start..start + len]
    }

    pub fn is_request(&self) -> bool {
        self.is_request
    }

    /// Fields compared under `context`, in a fixed order.
    fn fields(&self, context: KeyContext) -> impl Iterator<Item = ClassicField> + '_ {
        let to_tag = context
            .contains(KeyContext::USE_TO_TAG)
            .then_some(ClassicField::ToTag);
        let via = context
            .contains(KeyContext::USE_VIA)
            .then_some(ClassicField::VIA)
            .into_iter()
            .flatten();
        let uri = (context.contains(KeyContext::USE_URI) && self.is_request)
            .then_some(ClassicField::URI)
            .into_iter()
            .flatten();
        let uniquifier = context
            .contains(KeyContext::INCOMING)
            .then_some(ClassicField::Uniquifier);
        to_tag
            .into_iter()
            .chain(ClassicField::BASE)
            .chain(via)
            .chain(uri)
            .chain(uniquifier)
    }

    fn field_matches(&self, other: &ClassicFingerprint, field: ClassicField) -> bool {
        let (a, b) = (self.get(field), other.get(field));
        if field.is_port() && is_default_port(a) && is_default_port(b) {
            return true;
        }
        a == b
    }
}

impl fmt::Debug for ClassicFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (index, (_, len)) in self.spans.iter().enumerate() {
            if *len > 0 {
                let field = field_at(index);
                map.entry(&field, &String::from_utf8_lossy(self.get(field)));
            }
        }
        map.finish()
    }
}

fn field_at(index: usize) -> ClassicField {
    use ClassicField::*;
    [
        ToTag, ToUser, ToHost, ToPort, FromUser, FromHost, FromPort, FromTag, CallId, CSeqNumber,
        ViaHost, ViaPort, ViaBranch, UriUser, UriHost, UriPort, Uniquifier, CSeqMethod,
    ][index]
}

/// Absent, or 5060
fn is_default_port(port: &[u8]) -> bool {
    port.is_empty() || port == b"5060"
}

fn mix(hash: u32, bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(hash, |h, b| h.wrapping_mul(31).wrapping_add(u32::from(*b)))
}

/// ACK, CANCEL and PRACK match only their own kind unless looking up.
fn is_method_sensitive(method: &ByteView) -> bool {
    method == &"ACK" || method == &"CANCEL" || method == &"PRACK"
}

#[derive(Clone, Debug)]
enum KeyData {
    Branch {
        branch: ByteView,
        /// Top Via sent-by host, lowercased
        host: ByteView,
        port: Option<u16>,
    },
    Classic(ClassicFingerprint),
}

/// Identifies the transaction a message belongs to.
///
/// Equality depends on the [`KeyContext`] of both keys. The hash only covers
/// components every context compares, so keys with different contexts can
/// share a map.
#[derive(Clone, Debug)]
pub struct TransactionKey {
    data: KeyData,
    cseq_method: Option<ByteView>,
    context: KeyContext,
}

impl TransactionKey {
    pub(crate) fn branch_cookie(
        branch: ByteView,
        cseq_method: ByteView,
        host: ByteView,
        port: Option<u16>,
        context: KeyContext,
    ) -> Self {
        TransactionKey {
            data: KeyData::Branch {
                branch,
                host: host.to_lowercase(),
                port,
            },
            cseq_method: Some(cseq_method),
            context,
        }
    }

    pub(crate) fn classic(fingerprint: ClassicFingerprint, cseq_method: Option<ByteView>, context: KeyContext) -> Self {
        TransactionKey {
            data: KeyData::Classic(fingerprint),
            cseq_method,
            context,
        }
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        match self.data {
            KeyData::Branch { .. } => KeyAlgorithm::BranchCookie,
            KeyData::Classic(_) => KeyAlgorithm::Classic,
        }
    }

    /// The full branch, cookie included. `None` for classic keys.
    pub fn branch(&self) -> Option<&ByteView> {
        match &self.data {
            KeyData::Branch { branch, .. } => Some(branch),
            KeyData::Classic(_) => None,
        }
    }

    pub fn cseq_method(&self) -> Option<&ByteView> {
        self.cseq_method.as_ref()
    }

    /// Top Via sent-by of a branch key
    pub fn sent_by(&self) -> Option<(&ByteView, Option<u16>)> {
        match &self.data {
            KeyData::Branch { host, port, .. } => Some((host, *port)),
            KeyData::Classic(_) => None,
        }
    }

    pub fn classic_fingerprint(&self) -> Option<&ClassicFingerprint> {
        match &self.data {
            KeyData::Classic(fingerprint) => Some(fingerprint),
            KeyData::Branch { .. } => None,
        }
    }

    pub fn context(&self) -> KeyContext {
        self.context
    }

    /// Changes what the key is matched on; nothing is recomputed.
    pub fn set_key_context(&mut self, context: KeyContext) {
        self.context = context;
    }

    /// Whether the CSeq method takes part under `context`
    fn uses_method(&self, context: KeyContext) -> bool {
        if context.contains(KeyContext::LOOKUP) {
            return false;
        }
        context.contains(KeyContext::USE_METHOD)
            || self.cseq_method.as_ref().map_or(false, is_method_sensitive)
    }

    /// Java-style hash over the components that any two equal keys share,
    /// whatever their contexts: the branch of a branch key, the To, From,
    /// Call-ID and CSeq number fields of a classic key. Components that only
    /// some contexts compare (sent-by, Via, Request-URI, To tag, uniquifier,
    /// method) are left to `eq`.
    pub fn hash_code(&self) -> u32 {
        match &self.data {
            KeyData::Branch { branch, .. } => mix(0, branch.as_bytes()),
            KeyData::Classic(fingerprint) => ClassicField::BASE
                .iter()
                .filter(|field| !(field.is_port() && is_default_port(fingerprint.get(**field))))
                .fold(0, |hash, field| mix(hash, fingerprint.get(*field))),
        }
    }
}

impl PartialEq for TransactionKey {
    fn eq(&self, other: &Self) -> bool {
        let context = self.context.shared(other.context);
        let components_match = match (&self.data, &other.data) {
            (
                KeyData::Branch { branch, host, port },
                KeyData::Branch {
                    branch: other_branch,
                    host: other_host,
                    port: other_port,
                },
            ) => {
                branch == other_branch
                    && (!context.contains(KeyContext::INCOMING)
                        || (host == other_host && port.unwrap_or(5060) == other_port.unwrap_or(5060)))
            }
            (KeyData::Classic(a), KeyData::Classic(b)) => {
                let context = if a.is_request && b.is_request {
                    context
                } else {
                    KeyContext(context.0 & !KeyContext::USE_URI.0)
                };
                a.fields(context).all(|field| a.field_matches(b, field))
            }
            _ => false,
        };
        if !components_match {
            return false;
        }
        if self.uses_method(context) || other.uses_method(context) {
            return self.cseq_method == other.cseq_method;
        }
        true
    }
}

impl Eq for TransactionKey {}

impl Hash for TransactionKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.hash_code());
    }
}

/// The compared components, comma separated.
impl fmt::Display for TransactionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let context = self.context;
        let mut parts: Vec<String> = Vec::new();
        match &self.data {
            KeyData::Branch { branch, host, port } => {
                parts.push(branch.to_string_lossy());
                if self.uses_method(context) {
                    if let Some(method) = &self.cseq_method {
                        parts.push(method.to_string_lossy());
                    }
                }
                if context.contains(KeyContext::INCOMING) {
                    parts.push(host.to_string_lossy());
                    parts.push(port.unwrap_or(5060).to_string());
                }
            }
            KeyData::Classic(fingerprint) => {
                for field in fingerprint.fields(context) {
                    parts.push(String::from_utf8_lossy(fingerprint.get(field)).into_owned());
                }
                if self.uses_method(context) {
                    parts.push(String::from_utf8_lossy(fingerprint.get(ClassicField::CSeqMethod)).into_owned());
                }
            }
        }
        f.write_str(&parts.join(","))
    }
}
