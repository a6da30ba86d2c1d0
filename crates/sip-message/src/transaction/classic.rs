//! Collects the components of a classic key from framing events.

use bytes::{BufMut, BytesMut};

use super::key::{ClassicField, ClassicFingerprint, KeyContext, TransactionKey, CLASSIC_FIELD_COUNT};
use crate::error::{Error, Result};
use crate::parser::listener::{ElementId, MessageListener};
use crate::parser::values;
use crate::types::{ByteView, HeaderId, HeaderName};

pub(crate) struct ClassicKeyCollector {
    uniquifier: Option<HeaderName>,
    buf: BytesMut,
    spans: [(usize, usize); CLASSIC_FIELD_COUNT],
    cseq_method: Option<ByteView>,
    is_request: bool,
    seen_via: bool,
    seen_to: bool,
    seen_from: bool,
}

impl ClassicKeyCollector {
    pub(crate) fn new(uniquifier: Option<&str>) -> Self {
        ClassicKeyCollector {
            uniquifier: uniquifier.map(|name| HeaderName::recognize(ByteView::from(name.to_string()))),
            buf: BytesMut::with_capacity(160),
            spans: [(0, 0); CLASSIC_FIELD_COUNT],
            cseq_method: None,
            is_request: true,
            seen_via: false,
            seen_to: false,
            seen_from: false,
        }
    }

    fn record(&mut self, field: ClassicField, bytes: &[u8]) {
        self.spans[field as usize] = (self.buf.len(), bytes.len());
        self.buf.put_slice(bytes);
    }

    fn record_lowercase(&mut self, field: ClassicField, bytes: &[u8]) {
        let start = self.buf.len();
        self.buf.extend(bytes.iter().map(u8::to_ascii_lowercase));
        self.spans[field as usize] = (start, bytes.len());
    }

    fn record_port(&mut self, field: ClassicField, port: Option<u16>) {
        if let Some(port) = port {
            self.record(field, port.to_string().as_bytes());
        }
    }

    fn has(&self, field: ClassicField) -> bool {
        self.spans[field as usize].1 > 0
    }

    /// Records user, host and port of `uri`. URIs without a host (`tel:`,
    /// `urn:` ...) contribute everything after the scheme as the user part.
    fn record_uri(&mut self, uri: &[u8], user: ClassicField, host: ClassicField, port: ClassicField) {
        match values::sip_uri(uri) {
            Ok((_, parts)) => {
                if let Some(name) = parts.user {
                    self.record(user, name);
                }
                self.record_lowercase(host, parts.host);
                self.record_port(port, parts.port);
            }
            Err(_) => {
                let data = match uri.iter().position(|b| *b == b':') {
                    Some(colon) => &uri[colon + 1..],
                    None => uri,
                };
                let end = data.iter().position(|b| *b == b';').unwrap_or(data.len());
                self.record(user, &data[..end]);
            }
        }
    }

    fn record_address(&mut self, value: &ByteView, is_to: bool) {
        let (user, host, port, tag) = if is_to {
            (ClassicField::ToUser, ClassicField::ToHost, ClassicField::ToPort, ClassicField::ToTag)
        } else {
            (ClassicField::FromUser, ClassicField::FromHost, ClassicField::FromPort, ClassicField::FromTag)
        };
        // A malformed address contributes nothing and fails validation later.
        if let Ok((_, addr)) = values::complete(value.as_bytes(), values::name_addr) {
            self.record_uri(addr.uri, user, host, port);
            if let Some((_, Some(value))) = addr
                .params
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(b"tag"))
            {
                self.record(tag, value);
            }
        }
    }

    fn record_via(&mut self, value: &ByteView) {
        if let Ok((_, via)) = values::via_parm(value.as_bytes()) {
            self.record_lowercase(ClassicField::ViaHost, via.host);
            self.record_port(ClassicField::ViaPort, via.port);
            if let Some((_, Some(branch))) = via
                .params
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(b"branch"))
            {
                self.record(ClassicField::ViaBranch, branch);
            }
        }
    }

    fn is_uniquifier(&self, name: &HeaderName) -> bool {
        self.uniquifier.as_ref().map_or(false, |u| u == name)
    }

    fn validate(&self) -> Result<()> {
        use ClassicField::*;
        let none = |fields: &[ClassicField]| fields.iter().all(|f| !self.has(*f));
        if none(&[ToUser, ToHost, ToPort]) {
            return Err(Error::KeyDerivationFailed("no To data (user/host/port/uridata)".to_string()));
        }
        if none(&[FromUser, FromHost, FromPort]) {
            return Err(Error::KeyDerivationFailed("no From data (user/host/port/uridata)".to_string()));
        }
        if !self.has(CallId) {
            return Err(Error::KeyDerivationFailed("no Call-Id".to_string()));
        }
        if !self.has(CSeqNumber) {
            return Err(Error::KeyDerivationFailed("no CSeq number".to_string()));
        }
        if none(&[ViaHost, ViaPort, ViaBranch]) {
            return Err(Error::KeyDerivationFailed("no Via data (host/port/branch)".to_string()));
        }
        if self.is_request && none(&[UriUser, UriHost, UriPort]) {
            return Err(Error::KeyDerivationFailed("no RURI data (user/host/port/uridata)".to_string()));
        }
        Ok(())
    }

    /// Validates what was collected and builds the key.
    pub(crate) fn finish(self, context: KeyContext) -> Result<TransactionKey> {
        self.validate()?;
        let fingerprint = ClassicFingerprint::new(self.buf.freeze(), self.spans, self.is_request);
        Ok(TransactionKey::classic(fingerprint, self.cseq_method, context))
    }
}

impl MessageListener for ClassicKeyCollector {
    fn request_begin(&mut self, _method: &ByteView, uri: &ByteView, _version: &ByteView) -> Result<()> {
        self.is_request = true;
        self.record_uri(uri.as_bytes(), ClassicField::UriUser, ClassicField::UriHost, ClassicField::UriPort);
        Ok(())
    }

    fn response_begin(&mut self, _code: u16, _reason: &ByteView, _version: &ByteView) -> Result<()> {
        self.is_request = false;
        Ok(())
    }

    fn header_begin(&mut self, id: HeaderId) -> bool {
        match id {
            HeaderId::Via => !self.seen_via,
            HeaderId::To => !self.seen_to,
            HeaderId::From => !self.seen_from,
            HeaderId::CallId | HeaderId::CSeq => true,
            _ => self.is_uniquifier(&HeaderName::Known(id)),
        }
    }

    fn header_found(&mut self, id: HeaderId, value: &ByteView) -> Result<()> {
        match id {
            HeaderId::Via if !self.seen_via => {
                self.seen_via = true;
                self.record_via(value);
            }
            HeaderId::To if !self.seen_to => {
                self.seen_to = true;
                self.record_address(value, true);
            }
            HeaderId::From if !self.seen_from => {
                self.seen_from = true;
                self.record_address(value, false);
            }
            _ if self.is_uniquifier(&HeaderName::Known(id)) && !self.has(ClassicField::Uniquifier) => {
                self.record(ClassicField::Uniquifier, value.as_bytes());
            }
            _ => {}
        }
        Ok(())
    }

    fn element_found(&mut self, _context: HeaderId, element: ElementId, value: &ByteView) -> Result<()> {
        match element {
            ElementId::CallId => self.record(ClassicField::CallId, value.as_bytes()),
            ElementId::CSeqNumber => self.record(ClassicField::CSeqNumber, value.as_bytes()),
            ElementId::CSeqMethod => {
                self.record(ClassicField::CSeqMethod, value.as_bytes());
                self.cseq_method = Some(value.clone().interned());
            }
            ElementId::ContentLength => {}
        }
        Ok(())
    }

    fn unknown_found(&mut self, name: &ByteView, value: &ByteView) -> Result<()> {
        if self.is_uniquifier(&HeaderName::Other(name.clone())) && !self.has(ClassicField::Uniquifier) {
            self.record(ClassicField::Uniquifier, value.as_bytes());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::framing::scan;

    fn collect(raw: &'static str, uniquifier: Option<&str>) -> Result<TransactionKey> {
        let mut collector = ClassicKeyCollector::new(uniquifier);
        scan(&ByteView::from(raw), &mut collector)?;
        collector.finish(KeyContext::empty())
    }

    #[test]
    fn test_collects_fields() {
        let key = collect(
            "INVITE sip:UserB@There.com SIP/2.0\r\n\
             Via: SIP/2.0/UDP ss1.wcom.com:5060;branch=2d4790.1\r\n\
             Via: SIP/2.0/UDP here.com:5060\r\n\
             From: BigGuy <sip:UserA@here.com>;tag=77\r\n\
             To: LittleGuy <sip:UserB@there.com>\r\n\
             Call-ID: 12345601@here.com\r\n\
             CSeq: 1 INVITE\r\n\
             X-Uniq: abc\r\n\
             \r\n",
            Some("x-uniq"),
        )
        .unwrap();
        let fp = key.classic_fingerprint().unwrap();
        assert_eq!(fp.get(ClassicField::UriUser), b"UserB");
        assert_eq!(fp.get(ClassicField::UriHost), b"there.com");
        assert_eq!(fp.get(ClassicField::ViaHost), b"ss1.wcom.com");
        assert_eq!(fp.get(ClassicField::ViaPort), b"5060");
        assert_eq!(fp.get(ClassicField::ViaBranch), b"2d4790.1");
        assert_eq!(fp.get(ClassicField::FromTag), b"77");
        assert!(fp.get(ClassicField::ToTag).is_empty());
        assert_eq!(fp.get(ClassicField::CSeqNumber), b"1");
        assert_eq!(fp.get(ClassicField::Uniquifier), b"abc");
        assert!(key.cseq_method().unwrap().is_interned());
    }

    #[test]
    fn test_tel_uri_user_data() {
        let key = collect(
            "SIP/2.0 200 OK\r\n\
             Via: SIP/2.0/UDP here.com\r\n\
             From: <tel:+1-201-555-0123;phone-context=x>;tag=1\r\n\
             To: <sip:b@there.com>\r\n\
             Call-ID: c\r\n\
             CSeq: 1 INVITE\r\n\
             \r\n",
            None,
        )
        .unwrap();
        let fp = key.classic_fingerprint().unwrap();
        assert_eq!(fp.get(ClassicField::FromUser), b"+1-201-555-0123");
        assert!(!fp.is_request());
    }

    #[test]
    fn test_validation_messages() {
        let err = collect("BYE sip:a@b SIP/2.0\r\nFrom: <sip:x@y>\r\n\r\n", None).unwrap_err();
        assert_eq!(err.to_string(), "Can't build transaction key: no To data (user/host/port/uridata)");

        let err = collect("BYE sip:a@b SIP/2.0\r\nTo: <sip:x@y>\r\nFrom: <sip:x@y>\r\n\r\n", None).unwrap_err();
        assert_eq!(err.to_string(), "Can't build transaction key: no Call-Id");

        let err = collect(
            "BYE sip:a@b SIP/2.0\r\nTo: <sip:x@y>\r\nFrom: <sip:x@y>\r\nCall-ID: 1\r\nCSeq: 1 BYE\r\n\r\n",
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::KeyDerivationFailed(ref m) if m.starts_with("no Via data")));
    }
}
