// Property tests for ByteView

use bytes::Bytes;
use proptest::prelude::*;
use rvoip_sip_message::types::{java_hash, ByteView};

/// A buffer plus a valid begin..end range inside it
fn arb_window() -> impl Strategy<Value = (Vec<u8>, usize, usize)> {
    prop::collection::vec(any::<u8>(), 0..64).prop_flat_map(|buf| {
        let len = buf.len();
        (Just(buf), 0..=len).prop_flat_map(move |(buf, begin)| {
            (Just(buf), Just(begin), begin..=len)
        })
    })
}

proptest! {
    #[test]
    fn substring_shares_buffer((buf, begin, end) in arb_window()) {
        let whole = ByteView::new(Bytes::from(buf.clone()));
        let sub = whole.substring(begin, end);
        prop_assert_eq!(sub.as_bytes(), &buf[begin..end]);
        prop_assert_eq!(sub.start(), begin);
        prop_assert_eq!(sub.buffer().as_ptr(), whole.buffer().as_ptr());
    }

    #[test]
    fn copy_is_equal_but_detached((buf, begin, end) in arb_window()) {
        let sub = ByteView::new(Bytes::from(buf)).substring(begin, end);
        let copy = sub.copy();
        prop_assert_eq!(&copy, &sub);
        prop_assert_eq!(copy.start(), 0);
        prop_assert_eq!(copy.hash_code(), sub.hash_code());
    }

    #[test]
    fn hash_matches_java_string_hash(text in "[ -~]{0,40}") {
        let expected = text
            .chars()
            .fold(0i32, |h, c| h.wrapping_mul(31).wrapping_add(c as i32));
        let view = ByteView::from(text.clone());
        prop_assert_eq!(view.hash_code(), expected as u32);
        prop_assert_eq!(java_hash(text.as_bytes()), expected as u32);
    }

    #[test]
    fn ignore_case_equality_agrees_with_lowercase(text in "[a-zA-Z0-9.-]{0,24}") {
        let upper = ByteView::from(text.to_ascii_uppercase());
        let lower = ByteView::from(text.to_ascii_lowercase());
        prop_assert!(upper.equals_ignore_case(&lower));
        prop_assert_eq!(upper.to_lowercase(), lower);
    }

    #[test]
    fn compare_is_byte_order(a in prop::collection::vec(any::<u8>(), 0..16),
                             b in prop::collection::vec(any::<u8>(), 0..16)) {
        let left = ByteView::from(a.clone());
        let right = ByteView::from(b.clone());
        prop_assert_eq!(left.compare(&right), a.cmp(&b));
        prop_assert_eq!(left.equals(&right), a == b);
    }

    #[test]
    fn trim_strips_only_linear_whitespace(core in "[!-~]([ -~]{0,10}[!-~])?",
                                          pad in "[ \t\r\n]{0,4}") {
        let padded = format!("{pad}{core}{pad}");
        let view = ByteView::from(padded);
        let trimmed = view.trim();
        prop_assert_eq!(trimmed.as_bytes(), core.as_bytes());
    }

    #[test]
    fn parse_u64_matches_std(n in any::<u64>()) {
        prop_assert_eq!(ByteView::from(n.to_string()).parse_u64(), Some(n));
    }
}

#[test]
fn known_tokens_intern_to_singletons() {
    let buf = Bytes::from_static(b"xxINVITEyy");
    let a = ByteView::intern(&buf, 2, 6);
    let b = ByteView::from("INVITE").interned();
    assert!(a.ptr_eq(&b));
    assert!(a.is_interned());

    let unknown = ByteView::intern(&buf, 0, 4);
    assert!(!unknown.is_interned());
    assert_eq!(unknown, "xxIN");
}

#[test]
fn lowercased_interning_folds_case() {
    let buf = Bytes::from_static(b"Call-ID");
    let token = ByteView::intern_lowercased(&buf, 0, buf.len());
    assert_eq!(token, "call-id");
}
