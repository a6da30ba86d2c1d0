use std::fmt;

use serde::{Deserialize, Serialize};

use super::byte_view::ByteView;

/// Capacity of the hot slot array in a message's header store.
///
/// Headers whose [`HeaderId::priority`] is below the configured hot level get a
/// direct-indexed slot; the level can never exceed this capacity.
pub const HOT_SLOT_CAPACITY: usize = 24;

/// Whether a header holds one value or an ordered sequence of values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeaderKind {
    /// At most one value per message
    Singular,
    /// Zero or more values, kept in arrival order
    List,
}

/// Known SIP header identities
///
/// The discriminant is the header's priority: lower values are accessed more
/// often, get the hot slots first and are serialized first. CSeq, Call-ID and
/// Content-Length are *in-built*: a message keeps them as scalar fields, never
/// as header objects.
///
/// # Examples
///
/// ```rust
/// use rvoip_sip_message::types::{HeaderId, HeaderKind};
///
/// let via = HeaderId::from_name(b"v").unwrap();
/// assert_eq!(via, HeaderId::Via);
/// assert_eq!(via.kind(), HeaderKind::List);
/// assert_eq!(via.priority(), 0);
/// assert!(HeaderId::CallId.is_in_built());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum HeaderId {
    /// Via: Path taken by the request so far
    Via = 0,
    /// Max-Forwards: Limit on the number of hops
    MaxForwards,
    /// Route: Forced route for a request
    Route,
    /// Record-Route: Proxies that want to stay in the path
    RecordRoute,
    /// To: Logical recipient
    To,
    /// From: Initiator
    From,
    /// CSeq: Command sequence (in-built)
    CSeq,
    /// Call-ID: Call identifier (in-built)
    CallId,
    /// Content-Length: Body size (in-built)
    ContentLength,
    /// Contact: Where subsequent requests should be sent
    Contact,
    /// Expires: Expiration time
    Expires,
    /// Proxy-Require: Capabilities required of proxies
    ProxyRequire,
    /// Require: Capabilities required of the UAS
    Require,
    /// Remote-Party-ID: Asserted caller identity (draft)
    RemotePartyId,
    /// Event: Event package
    Event,
    /// Diversion: Call diversion history
    Diversion,
    /// P-Asserted-Identity (RFC 3325)
    PAssertedIdentity,
    /// P-Associated-URI (RFC 3455)
    PAssociatedUri,
    /// P-Called-Party-ID (RFC 3455)
    PCalledPartyId,
    /// Service-Route (RFC 3608)
    ServiceRoute,
    /// P-Access-Network-Info (RFC 3455)
    PAccessNetworkInfo,
    /// Privacy (RFC 3323)
    Privacy,
    /// Content-Type: Media type of the body
    ContentType,
    /// Supported: Supported extensions
    Supported,
    /// Allow-Events: Supported event packages
    AllowEvents,
    /// Proxy-Authenticate: Proxy challenge
    ProxyAuthenticate,
    /// Proxy-Authorization: Proxy credentials
    ProxyAuthorization,
    /// Authorization: UAS credentials
    Authorization,
    /// Authentication-Info: Mutual authentication data
    AuthenticationInfo,
    /// WWW-Authenticate: UAS challenge
    WwwAuthenticate,
    /// Accept: Acceptable media types
    Accept,
    /// Accept-Encoding: Acceptable encodings
    AcceptEncoding,
    /// Accept-Language: Acceptable languages
    AcceptLanguage,
    /// Alert-Info: Alternative ring tone
    AlertInfo,
    /// Allow: Supported methods
    Allow,
    /// Call-Info: Additional caller/callee information
    CallInfo,
    /// Content-Disposition: Body presentation
    ContentDisposition,
    /// Content-Encoding: Body encoding
    ContentEncoding,
    /// Content-Language: Body language
    ContentLanguage,
    /// Date
    Date,
    /// Error-Info: Pointer to error details
    ErrorInfo,
    /// In-Reply-To: Call-IDs this call refers to
    InReplyTo,
    /// MIME-Version
    MimeVersion,
    /// Min-Expires: Minimum refresh interval
    MinExpires,
    /// Organization
    Organization,
    /// Priority: Urgency of the request
    Priority,
    /// RAck: Reliable provisional acknowledgement
    RAck,
    /// Reason (RFC 3326)
    Reason,
    /// Refer-To (RFC 3515)
    ReferTo,
    /// Referred-By (RFC 3892)
    ReferredBy,
    /// Reply-To
    ReplyTo,
    /// Retry-After
    RetryAfter,
    /// RSeq: Reliable provisional sequence
    RSeq,
    /// Server: UAS software
    Server,
    /// Session-Expires (RFC 4028)
    SessionExpires,
    /// Min-SE (RFC 4028)
    MinSE,
    /// Subject
    Subject,
    /// Subscription-State
    SubscriptionState,
    /// Timestamp
    Timestamp,
    /// Unsupported
    Unsupported,
    /// User-Agent: UAC software
    UserAgent,
    /// Warning
    Warning,
    /// Path (RFC 3327)
    Path,
    /// Accept-Contact (RFC 3841)
    AcceptContact,
    /// Reject-Contact (RFC 3841)
    RejectContact,
    /// Request-Disposition (RFC 3841)
    RequestDisposition,
    /// Identity (RFC 4474)
    Identity,
}

impl HeaderId {
    /// Every known header, in priority order.
    pub const ALL: [HeaderId; 67] = [
        HeaderId::Via,
        HeaderId::MaxForwards,
        HeaderId::Route,
        HeaderId::RecordRoute,
        HeaderId::To,
        HeaderId::From,
        HeaderId::CSeq,
        HeaderId::CallId,
        HeaderId::ContentLength,
        HeaderId::Contact,
        HeaderId::Expires,
        HeaderId::ProxyRequire,
        HeaderId::Require,
        HeaderId::RemotePartyId,
        HeaderId::Event,
        HeaderId::Diversion,
        HeaderId::PAssertedIdentity,
        HeaderId::PAssociatedUri,
        HeaderId::PCalledPartyId,
        HeaderId::ServiceRoute,
        HeaderId::PAccessNetworkInfo,
        HeaderId::Privacy,
        HeaderId::ContentType,
        HeaderId::Supported,
        HeaderId::AllowEvents,
        HeaderId::ProxyAuthenticate,
        HeaderId::ProxyAuthorization,
        HeaderId::Authorization,
        HeaderId::AuthenticationInfo,
        HeaderId::WwwAuthenticate,
        HeaderId::Accept,
        HeaderId::AcceptEncoding,
        HeaderId::AcceptLanguage,
        HeaderId::AlertInfo,
        HeaderId::Allow,
        HeaderId::CallInfo,
        HeaderId::ContentDisposition,
        HeaderId::ContentEncoding,
        HeaderId::ContentLanguage,
        HeaderId::Date,
        HeaderId::ErrorInfo,
        HeaderId::InReplyTo,
        HeaderId::MimeVersion,
        HeaderId::MinExpires,
        HeaderId::Organization,
        HeaderId::Priority,
        HeaderId::RAck,
        HeaderId::Reason,
        HeaderId::ReferTo,
        HeaderId::ReferredBy,
        HeaderId::ReplyTo,
        HeaderId::RetryAfter,
        HeaderId::RSeq,
        HeaderId::Server,
        HeaderId::SessionExpires,
        HeaderId::MinSE,
        HeaderId::Subject,
        HeaderId::SubscriptionState,
        HeaderId::Timestamp,
        HeaderId::Unsupported,
        HeaderId::UserAgent,
        HeaderId::Warning,
        HeaderId::Path,
        HeaderId::AcceptContact,
        HeaderId::RejectContact,
        HeaderId::RequestDisposition,
        HeaderId::Identity,
    ];

    /// Returns the canonical name of the header
    pub fn as_str(&self) -> &'static str {
        match self {
            HeaderId::Via => "Via",
            HeaderId::MaxForwards => "Max-Forwards",
            HeaderId::Route => "Route",
            HeaderId::RecordRoute => "Record-Route",
            HeaderId::To => "To",
            HeaderId::From => "From",
            HeaderId::CSeq => "CSeq",
            HeaderId::CallId => "Call-ID",
            HeaderId::ContentLength => "Content-Length",
            HeaderId::Contact => "Contact",
            HeaderId::Expires => "Expires",
            HeaderId::ProxyRequire => "Proxy-Require",
            HeaderId::Require => "Require",
            HeaderId::RemotePartyId => "Remote-Party-ID",
            HeaderId::Event => "Event",
            HeaderId::Diversion => "Diversion",
            HeaderId::PAssertedIdentity => "P-Asserted-Identity",
            HeaderId::PAssociatedUri => "P-Associated-URI",
            HeaderId::PCalledPartyId => "P-Called-Party-ID",
            HeaderId::ServiceRoute => "Service-Route",
            HeaderId::PAccessNetworkInfo => "P-Access-Network-Info",
            HeaderId::Privacy => "Privacy",
            HeaderId::ContentType => "Content-Type",
            HeaderId::Supported => "Supported",
            HeaderId::AllowEvents => "Allow-Events",
            HeaderId::ProxyAuthenticate => "Proxy-Authenticate",
            HeaderId::ProxyAuthorization => "Proxy-Authorization",
            HeaderId::Authorization => "Authorization",
            HeaderId::AuthenticationInfo => "Authentication-Info",
            HeaderId::WwwAuthenticate => "WWW-Authenticate",
            HeaderId::Accept => "Accept",
            HeaderId::AcceptEncoding => "Accept-Encoding",
            HeaderId::AcceptLanguage => "Accept-Language",
            HeaderId::AlertInfo => "Alert-Info",
            HeaderId::Allow => "Allow",
            HeaderId::CallInfo => "Call-Info",
            HeaderId::ContentDisposition => "Content-Disposition",
            HeaderId::ContentEncoding => "Content-Encoding",
            HeaderId::ContentLanguage => "Content-Language",
            HeaderId::Date => "Date",
            HeaderId::ErrorInfo => "Error-Info",
            HeaderId::InReplyTo => "In-Reply-To",
            HeaderId::MimeVersion => "MIME-Version",
            HeaderId::MinExpires => "Min-Expires",
            HeaderId::Organization => "Organization",
            HeaderId::Priority => "Priority",
            HeaderId::RAck => "RAck",
            HeaderId::Reason => "Reason",
            HeaderId::ReferTo => "Refer-To",
            HeaderId::ReferredBy => "Referred-By",
            HeaderId::ReplyTo => "Reply-To",
            HeaderId::RetryAfter => "Retry-After",
            HeaderId::RSeq => "RSeq",
            HeaderId::Server => "Server",
            HeaderId::SessionExpires => "Session-Expires",
            HeaderId::MinSE => "Min-SE",
            HeaderId::Subject => "Subject",
            HeaderId::SubscriptionState => "Subscription-State",
            HeaderId::Timestamp => "Timestamp",
            HeaderId::Unsupported => "Unsupported",
            HeaderId::UserAgent => "User-Agent",
            HeaderId::Warning => "Warning",
            HeaderId::Path => "Path",
            HeaderId::AcceptContact => "Accept-Contact",
            HeaderId::RejectContact => "Reject-Contact",
            HeaderId::RequestDisposition => "Request-Disposition",
            HeaderId::Identity => "Identity",
        }
    }

    /// Single-letter compact form (RFC 3261 §7.3.3 and extensions), if any
    pub fn compact_form(&self) -> Option<&'static str> {
        match self {
            HeaderId::Via => Some("v"),
            HeaderId::CallId => Some("i"),
            HeaderId::Contact => Some("m"),
            HeaderId::ContentLength => Some("l"),
            HeaderId::ContentType => Some("c"),
            HeaderId::ContentEncoding => Some("e"),
            HeaderId::From => Some("f"),
            HeaderId::To => Some("t"),
            HeaderId::Subject => Some("s"),
            HeaderId::Supported => Some("k"),
            HeaderId::Event => Some("o"),
            HeaderId::AllowEvents => Some("u"),
            HeaderId::ReferTo => Some("r"),
            HeaderId::ReferredBy => Some("b"),
            HeaderId::SessionExpires => Some("x"),
            HeaderId::AcceptContact => Some("a"),
            HeaderId::RejectContact => Some("j"),
            HeaderId::RequestDisposition => Some("d"),
            HeaderId::Identity => Some("y"),
            _ => None,
        }
    }

    /// Whether the header holds a single value or a list. Fixed per identity.
    pub fn kind(&self) -> HeaderKind {
        match self {
            HeaderId::Via
            | HeaderId::Route
            | HeaderId::RecordRoute
            | HeaderId::Contact
            | HeaderId::ProxyRequire
            | HeaderId::Require
            | HeaderId::RemotePartyId
            | HeaderId::Diversion
            | HeaderId::PAssertedIdentity
            | HeaderId::PAssociatedUri
            | HeaderId::ServiceRoute
            | HeaderId::Privacy
            | HeaderId::Supported
            | HeaderId::AllowEvents
            | HeaderId::ProxyAuthenticate
            | HeaderId::ProxyAuthorization
            | HeaderId::Authorization
            | HeaderId::WwwAuthenticate
            | HeaderId::Accept
            | HeaderId::AcceptEncoding
            | HeaderId::AcceptLanguage
            | HeaderId::AlertInfo
            | HeaderId::Allow
            | HeaderId::CallInfo
            | HeaderId::ContentEncoding
            | HeaderId::ContentLanguage
            | HeaderId::ErrorInfo
            | HeaderId::InReplyTo
            | HeaderId::Reason
            | HeaderId::Unsupported
            | HeaderId::Warning
            | HeaderId::Path
            | HeaderId::AcceptContact
            | HeaderId::RejectContact
            | HeaderId::RequestDisposition => HeaderKind::List,
            _ => HeaderKind::Singular,
        }
    }

    /// Lower is hotter.
    #[inline]
    pub fn priority(&self) -> usize {
        *self as usize
    }

    /// CSeq, Call-ID and Content-Length are stored as scalar fields.
    #[inline]
    pub fn is_in_built(&self) -> bool {
        matches!(self, HeaderId::CSeq | HeaderId::CallId | HeaderId::ContentLength)
    }

    /// Whether list values of this header may be joined with commas on one
    /// line. Authentication headers carry commas inside their values.
    pub fn is_comma_joinable(&self) -> bool {
        self.kind() == HeaderKind::List
            && !matches!(
                self,
                HeaderId::ProxyAuthenticate
                    | HeaderId::ProxyAuthorization
                    | HeaderId::Authorization
                    | HeaderId::WwwAuthenticate
            )
    }

    /// Recognizes a header name, full or compact, ignoring ASCII case.
    pub fn from_name(name: &[u8]) -> Option<HeaderId> {
        if name.len() == 1 {
            let c = name[0].to_ascii_lowercase();
            return HeaderId::ALL.iter().copied().find(|id| {
                id.compact_form().map_or(false, |f| f.as_bytes()[0] == c)
            });
        }
        HeaderId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str().as_bytes().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for HeaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A header identity as callers name it: a known id, or an extension header
/// identified by its name bytes.
///
/// Extension names compare ignoring ASCII case and are always list-kind.
#[derive(Debug, Clone)]
pub enum HeaderName {
    /// One of the known header identities
    Known(HeaderId),
    /// Extension header, e.g. `X-Custom`
    Other(ByteView),
}

impl HeaderName {
    /// Recognizes `name`, falling back to an extension header over the same
    /// bytes (interned when it is a registered token).
    pub fn recognize(name: ByteView) -> Self {
        match HeaderId::from_name(name.as_bytes()) {
            Some(id) => HeaderName::Known(id),
            None => HeaderName::Other(name.interned()),
        }
    }

    /// The known id, if any
    pub fn id(&self) -> Option<HeaderId> {
        match self {
            HeaderName::Known(id) => Some(*id),
            HeaderName::Other(_) => None,
        }
    }

    /// Singular or list
    pub fn kind(&self) -> HeaderKind {
        match self {
            HeaderName::Known(id) => id.kind(),
            HeaderName::Other(_) => HeaderKind::List,
        }
    }

    /// Returns `true` for CSeq, Call-ID and Content-Length
    pub fn is_in_built(&self) -> bool {
        self.id().map_or(false, |id| id.is_in_built())
    }

    /// Canonical (or as-received, for extensions) name bytes
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            HeaderName::Known(id) => id.as_str().as_bytes(),
            HeaderName::Other(name) => name.as_bytes(),
        }
    }

    /// Name as written on the wire, honoring compact mode for known headers
    pub fn wire_name(&self, compact: bool) -> &[u8] {
        match self {
            HeaderName::Known(id) if compact => id
                .compact_form()
                .unwrap_or_else(|| id.as_str())
                .as_bytes(),
            _ => self.as_bytes(),
        }
    }
}

impl PartialEq for HeaderName {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HeaderName::Known(a), HeaderName::Known(b)) => a == b,
            (HeaderName::Other(a), HeaderName::Other(b)) => a.equals_ignore_case(b),
            _ => false,
        }
    }
}

impl Eq for HeaderName {}

impl From<HeaderId> for HeaderName {
    fn from(id: HeaderId) -> Self {
        HeaderName::Known(id)
    }
}

impl From<&'static str> for HeaderName {
    fn from(name: &'static str) -> Self {
        HeaderName::recognize(ByteView::from(name))
    }
}

impl From<ByteView> for HeaderName {
    fn from(name: ByteView) -> Self {
        HeaderName::recognize(name)
    }
}

impl fmt::Display for HeaderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_is_in_priority_order() {
        for (i, id) in HeaderId::ALL.iter().enumerate() {
            assert_eq!(id.priority(), i, "{} out of order", id);
        }
        assert!(HeaderId::ContentType.priority() < HOT_SLOT_CAPACITY);
    }

    #[test]
    fn test_from_name() {
        assert_eq!(HeaderId::from_name(b"call-id"), Some(HeaderId::CallId));
        assert_eq!(HeaderId::from_name(b"I"), Some(HeaderId::CallId));
        assert_eq!(HeaderId::from_name(b"m"), Some(HeaderId::Contact));
        assert_eq!(HeaderId::from_name(b"l"), Some(HeaderId::ContentLength));
        assert_eq!(HeaderId::from_name(b"WWW-AUTHENTICATE"), Some(HeaderId::WwwAuthenticate));
        assert_eq!(HeaderId::from_name(b"X-Custom"), None);
        assert_eq!(HeaderId::from_name(b"z"), None);
    }

    #[test]
    fn test_header_name_equality() {
        let a = HeaderName::from("X-Trace");
        let b = HeaderName::recognize(ByteView::from_static(b"x-trace"));
        assert_eq!(a, b);
        assert_eq!(HeaderName::from("v"), HeaderName::Known(HeaderId::Via));
        assert_eq!(a.kind(), HeaderKind::List);
    }

    #[test]
    fn test_wire_name() {
        let via = HeaderName::Known(HeaderId::Via);
        assert_eq!(via.wire_name(true), b"v");
        assert_eq!(via.wire_name(false), b"Via");
        let mf = HeaderName::Known(HeaderId::MaxForwards);
        assert_eq!(mf.wire_name(true), b"Max-Forwards");
    }
}
