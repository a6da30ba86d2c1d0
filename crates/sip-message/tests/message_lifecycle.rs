// Building, finalizing, mutating and re-parsing messages

use std::sync::Arc;

use rvoip_sip_message::prelude::*;

const INVITE_WIRE: &str = "INVITE sip:bob@biloxi.com SIP/2.0\r\n\
Via: SIP/2.0/UDP pc33.atlanta.com;branch=z9hG4bK776asdhds\r\n\
Max-Forwards: 70\r\n\
To: Bob <sip:bob@biloxi.com>\r\n\
From: Alice <sip:alice@atlanta.com>;tag=1928301774\r\n\
Contact: <sip:alice@pc33.atlanta.com>\r\n\
Call-ID: a84b4c76e66710@pc33.atlanta.com\r\n\
CSeq: 314159 INVITE\r\n\
Content-Length: 0\r\n\
Subject: lunch\r\n\
X-Custom: yes\r\n\
\r\n";

fn build_invite(factory: &MessageFactory) -> Request {
    let mut invite = factory.request("INVITE", "sip:bob@biloxi.com");
    let core = invite.core_mut();
    // Added out of wire order on purpose; the store sorts hot headers.
    core.add("Subject", "lunch").unwrap();
    core.add(HeaderId::From, "Alice <sip:alice@atlanta.com>;tag=1928301774").unwrap();
    core.add(HeaderId::To, "Bob <sip:bob@biloxi.com>").unwrap();
    core.add("X-Custom", "yes").unwrap();
    core.add(HeaderId::Contact, "<sip:alice@pc33.atlanta.com>").unwrap();
    core.add(HeaderId::Via, "SIP/2.0/UDP pc33.atlanta.com;branch=z9hG4bK776asdhds").unwrap();
    core.set_call_id("a84b4c76e66710@pc33.atlanta.com");
    core.set_cseq(314159, "INVITE");
    invite
}

#[test]
fn finalize_orders_headers_and_caches() {
    let factory = MessageFactory::default();
    let mut invite = build_invite(&factory);
    assert!(!invite.is_finalized());

    let wire = invite.finalize();
    assert_eq!(std::str::from_utf8(&wire).unwrap(), INVITE_WIRE);
    assert!(invite.is_finalized());
    assert_eq!(invite.finalize().as_ptr(), wire.as_ptr());
    invite.verify_cache().unwrap();
}

#[test]
fn mutation_returns_to_building() {
    let factory = MessageFactory::default();
    let mut invite = build_invite(&factory);
    invite.finalize();

    invite.core_mut().set_body("v=0\r\n");
    assert!(!invite.is_finalized());
    let wire = invite.finalize();
    let text = std::str::from_utf8(&wire).unwrap();
    assert!(text.contains("Content-Length: 5\r\n"));
    assert!(text.ends_with("\r\n\r\nv=0\r\n"));

    invite.set_uri("sip:bob@192.0.2.4");
    assert!(!invite.is_finalized());
    assert!(invite.serialize().starts_with(b"INVITE sip:bob@192.0.2.4 SIP/2.0\r\n"));
}

#[test]
fn write_emits_finalized_bytes() {
    let factory = MessageFactory::default();
    let mut invite = build_invite(&factory);
    let mut sink = Vec::new();
    invite.write(&mut sink).unwrap();
    assert_eq!(sink, INVITE_WIRE.as_bytes());
    assert!(invite.is_finalized());
}

#[test]
fn parsed_message_reserializes_identically() {
    let mut parsed = parse_message(INVITE_WIRE, Arc::new(CoreConfig::default())).unwrap();
    assert!(parsed.is_request());
    assert!(!parsed.is_finalized());
    assert_eq!(parsed.finalize(), INVITE_WIRE.as_bytes());

    let factory = MessageFactory::default();
    let mut built = Message::from(build_invite(&factory));
    built.finalize();
    assert_eq!(parsed, built);
}

#[test]
fn equality_ignores_whitespace_and_name_case() {
    let loose = INVITE_WIRE
        .replace("To: Bob <sip:bob@biloxi.com>", "t:  Bob <sip:bob@biloxi.com>")
        .replace("Subject: lunch", "SUBJECT: lunch");
    let a = parse_message(INVITE_WIRE, Default::default()).unwrap();
    let b = parse_message(loose, Default::default()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn clone_starts_building_without_key() {
    let factory = MessageFactory::default();
    let mut invite = build_invite(&factory);
    invite.finalize();
    invite.transaction_key().unwrap();

    let copy = invite.clone();
    assert!(!copy.is_finalized());
    assert!(copy.core().transaction_key().is_none());
    assert_eq!(copy, invite);
}

#[test]
fn clone_mutations_leave_original_intact() {
    let factory = MessageFactory::default();
    let invite = build_invite(&factory);

    let mut copy = invite.clone();
    assert!(copy.core_mut().remove_header(HeaderId::To).is_some());
    assert!(copy.core_mut().remove_header("Subject").is_some());
    copy.core_mut().remove_headers(HeaderId::Via);
    copy.core_mut().set_cseq(1, "BYE");

    let to = invite.core().get_header(HeaderId::To, true).unwrap().unwrap();
    assert_eq!(to.to_string(), "To: Bob <sip:bob@biloxi.com>");
    assert!(invite.core().get_header("Subject", false).unwrap().is_some());
    assert_eq!(invite.core().get_headers(HeaderId::Via).unwrap().len(), 1);
    assert_eq!(invite.core().cseq_number(), 314159);
    assert!(copy.core().get_header(HeaderId::To, false).unwrap().is_none());
    assert_ne!(copy, invite);
}

#[test]
fn in_built_headers_are_synthesized() {
    let factory = MessageFactory::default();
    let mut invite = build_invite(&factory);

    let cseq = invite.core().get_header(HeaderId::CSeq, true).unwrap().unwrap();
    assert_eq!(cseq.to_string(), "CSeq: 314159 INVITE");

    let removed = invite.core_mut().remove_header(HeaderId::CallId).unwrap();
    assert_eq!(removed.to_string(), "Call-ID: a84b4c76e66710@pc33.atlanta.com");
    assert!(invite.core().call_id().is_none());

    let err = invite.core().get_header(HeaderId::Via, false).unwrap_err();
    assert!(matches!(err, Error::HeaderTypeMismatch { .. }));
    assert_eq!(invite.core().get_headers(HeaderId::Via).unwrap().len(), 1);
}

#[test]
fn compact_form_and_no_max_forwards() {
    let factory = MessageFactory::with_config(
        CoreConfig::default()
            .with_compact_headers()
            .with_default_max_forwards(None),
    )
    .unwrap();
    let mut invite = build_invite(&factory);
    let wire = invite.finalize();
    let text = std::str::from_utf8(&wire).unwrap();
    assert!(text.contains("\r\nv: SIP/2.0/UDP"));
    assert!(text.contains("\r\ni: a84b4c76e66710@pc33.atlanta.com\r\n"));
    assert!(text.contains("\r\nl: 0\r\n"));
    assert!(!text.contains("Max-Forwards"));
}

#[test]
fn response_for_request_copies_dialog_headers() {
    let factory = MessageFactory::default();
    let invite = build_invite(&factory);
    let mut ringing = factory.response_for(&invite, 180);
    ringing.core_mut().add(HeaderId::To, "Bob <sip:bob@biloxi.com>;tag=a6c85cf").unwrap();

    assert_eq!(ringing.reason(), &"Ringing");
    assert!(ringing.is_provisional());
    assert_eq!(ringing.core().to_tag().unwrap(), "a6c85cf");
    assert_eq!(ringing.core().from_tag().unwrap(), "1928301774");
    assert_eq!(ringing.core().call_id(), invite.core().call_id());

    let wire = ringing.finalize();
    assert!(wire.starts_with(b"SIP/2.0 180 Ringing\r\nVia: "));
    assert!(!std::str::from_utf8(&wire).unwrap().contains("Max-Forwards"));
}

#[test]
fn truncated_body_is_a_framing_error() {
    let raw = "SIP/2.0 200 OK\r\nContent-Length: 10\r\n\r\nshort";
    let err = parse_message(raw, Default::default()).unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
}
