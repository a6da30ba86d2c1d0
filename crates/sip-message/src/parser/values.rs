//! nom parsers for the header values the core gives structure to.
//!
//! Every parser works on plain `&[u8]` and returns sub-slices of its input,
//! so callers can turn the results back into views over the original buffer
//! with [`ByteView::slice_ref`](crate::types::ByteView::slice_ref).

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::digit1,
    combinator::{all_consuming, map, map_res, opt, recognize},
    error::{Error as NomError, ErrorKind},
    multi::{many0, many1},
    sequence::{delimited, pair, preceded, terminated, tuple},
};

use super::whitespace::{colon, equal, laquot, lws, owsp, raquot, semi, slash, sws, ParseResult};

/// token = 1*(alphanum / "-" / "." / "!" / "%" / "*" / "_" / "+" / "`" / "'" / "~")
pub fn is_token_char(c: u8) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, b'-' | b'.' | b'!' | b'%' | b'*' | b'_' | b'+' | b'`' | b'\'' | b'~')
}

pub fn token(input: &[u8]) -> ParseResult<&[u8]> {
    take_while1(is_token_char)(input)
}

fn is_host_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b'-' | b'.' | b'_')
}

/// host = hostname / IPv4address / IPv6reference
pub fn host(input: &[u8]) -> ParseResult<&[u8]> {
    alt((
        recognize(delimited(
            tag(b"["),
            take_while1(|c: u8| c.is_ascii_hexdigit() || c == b':' || c == b'.'),
            tag(b"]"),
        )),
        take_while1(is_host_char),
    ))(input)
}

pub fn port(input: &[u8]) -> ParseResult<u16> {
    map_res(digit1, |d: &[u8]| {
        std::str::from_utf8(d)
            .map_err(|_| ())
            .and_then(|s| s.parse::<u16>().map_err(|_| ()))
    })(input)
}

/// quoted-string, returned with its surrounding quotes.
pub fn quoted_string(input: &[u8]) -> ParseResult<&[u8]> {
    if input.first() != Some(&b'"') {
        return Err(nom::Err::Error(NomError::new(input, ErrorKind::Char)));
    }
    let mut i = 1;
    while i < input.len() {
        match input[i] {
            b'\\' => i += 2,
            b'"' => return Ok((&input[i + 1..], &input[..=i])),
            _ => i += 1,
        }
    }
    Err(nom::Err::Error(NomError::new(input, ErrorKind::Eof)))
}

fn gen_value(input: &[u8]) -> ParseResult<&[u8]> {
    alt((
        quoted_string,
        take_while1(|c: u8| is_token_char(c) || matches!(c, b'[' | b']' | b':')),
    ))(input)
}

/// One `name[=value]` pair.
pub type RawParam<'a> = (&'a [u8], Option<&'a [u8]>);

/// *( SEMI generic-param )
pub fn params(input: &[u8]) -> ParseResult<Vec<RawParam<'_>>> {
    many0(preceded(
        semi,
        pair(token, opt(preceded(equal, gen_value))),
    ))(input)
}

/// Components of one Via entry.
#[derive(Debug, PartialEq, Eq)]
pub struct RawVia<'a> {
    pub protocol: &'a [u8],
    pub transport: &'a [u8],
    pub host: &'a [u8],
    pub port: Option<u16>,
    pub params: Vec<RawParam<'a>>,
}

/// via-parm = sent-protocol LWS sent-by *( SEMI via-params )
pub fn via_parm(input: &[u8]) -> ParseResult<RawVia<'_>> {
    let (rest, (protocol, transport)) = pair(
        recognize(tuple((token, slash, token))),
        preceded(slash, token),
    )(input)?;
    let (rest, _) = lws(rest)?;
    let (rest, host) = host(rest)?;
    let (rest, port) = opt(preceded(colon, port))(rest)?;
    let (rest, params) = params(rest)?;
    Ok((
        rest,
        RawVia {
            protocol,
            transport,
            host,
            port,
            params,
        },
    ))
}

/// Components of a name-addr or addr-spec value.
#[derive(Debug, PartialEq, Eq)]
pub struct RawNameAddr<'a> {
    pub display_name: Option<&'a [u8]>,
    pub uri: &'a [u8],
    pub bracketed: bool,
    pub params: Vec<RawParam<'a>>,
}

fn display_name(input: &[u8]) -> ParseResult<&[u8]> {
    alt((
        terminated(quoted_string, owsp),
        map(recognize(many1(terminated(token, sws))), trim_end),
    ))(input)
}

fn trim_end(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|b| !matches!(*b, b' ' | b'\t' | b'\r' | b'\n'))
        .map_or(0, |p| p + 1);
    &bytes[..end]
}

fn bracketed_addr(input: &[u8]) -> ParseResult<(Option<&[u8]>, &[u8])> {
    pair(
        opt(display_name),
        delimited(laquot, take_while1(|c: u8| c != b'>'), raquot),
    )(input)
}

/// (name-addr / addr-spec) *( SEMI generic-param )
///
/// Without angle brackets the URI ends at the first `;`, so trailing
/// parameters belong to the header, as RFC 3261 §20 requires.
pub fn name_addr(input: &[u8]) -> ParseResult<RawNameAddr<'_>> {
    let (rest, _) = sws(input)?;
    let (rest, (display_name, uri, bracketed)) = alt((
        map(bracketed_addr, |(d, u)| (d, u, true)),
        map(
            take_while1(|c: u8| !matches!(c, b';' | b',' | b' ' | b'\t' | b'\r' | b'\n')),
            |u| (None, u, false),
        ),
    ))(rest)?;
    let (rest, params) = params(rest)?;
    Ok((
        rest,
        RawNameAddr {
            display_name,
            uri,
            bracketed,
            params,
        },
    ))
}

/// Components of a SIP/SIPS URI that take part in transaction matching.
#[derive(Debug, PartialEq, Eq)]
pub struct RawUri<'a> {
    pub scheme: &'a [u8],
    pub user: Option<&'a [u8]>,
    pub host: &'a [u8],
    pub port: Option<u16>,
}

/// scheme ":" [ user [ ":" password ] "@" ] host [ ":" port ] ...
///
/// URI parameters and headers are left in the remainder.
pub fn sip_uri(input: &[u8]) -> ParseResult<RawUri<'_>> {
    let (rest, scheme) = terminated(take_while1(|c: u8| c.is_ascii_alphanumeric() || c == b'+'), tag(b":"))(input)?;
    let (rest, user) = opt(terminated(
        terminated(
            take_while1(|c: u8| !matches!(c, b'@' | b':' | b';' | b'?' | b'>')),
            opt(preceded(tag(b":"), take_while(|c: u8| c != b'@'))),
        ),
        tag(b"@"),
    ))(rest)?;
    let (rest, host) = host(rest)?;
    let (rest, port) = opt(preceded(tag(b":"), port))(rest)?;
    Ok((
        rest,
        RawUri {
            scheme,
            user,
            host,
            port,
        },
    ))
}

/// CSeq = 1*DIGIT LWS Method
pub fn cseq(input: &[u8]) -> ParseResult<(u64, &[u8])> {
    all_consuming(delimited(
        owsp,
        pair(terminated(number, lws), token),
        sws,
    ))(input)
}

/// 1*DIGIT as `u64`
pub fn number(input: &[u8]) -> ParseResult<u64> {
    map_res(digit1, |d: &[u8]| {
        std::str::from_utf8(d)
            .map_err(|_| ())
            .and_then(|s| s.parse::<u64>().map_err(|_| ()))
    })(input)
}

/// A whole value that is a single number, surrounded by optional whitespace.
pub fn number_value(input: &[u8]) -> ParseResult<u64> {
    all_consuming(delimited(sws, number, sws))(input)
}

/// Lowercased bytes with linear whitespace removed, for comparing tokens such
/// as `SIP / 2.0` and `sip/2.0`.
pub fn normalize_token(bytes: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .filter(|b| !matches!(**b, b' ' | b'\t' | b'\r' | b'\n'))
        .map(u8::to_ascii_lowercase)
        .collect()
}

/// Runs `parser` and requires it to consume everything but trailing whitespace.
pub fn complete<'a, O>(
    input: &'a [u8],
    parser: impl FnMut(&'a [u8]) -> ParseResult<'a, O>,
) -> ParseResult<'a, O> {
    all_consuming(terminated(parser, sws))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_via_parm() {
        let (rest, via) =
            via_parm(b"SIP/2.0/UDP pc33.atlanta.com:5060;branch=z9hG4bK776asdhds;rport").unwrap();
        assert!(rest.is_empty());
        assert_eq!(via.protocol, b"SIP/2.0");
        assert_eq!(via.transport, b"UDP");
        assert_eq!(via.host, b"pc33.atlanta.com");
        assert_eq!(via.port, Some(5060));
        assert_eq!(via.params[0], (&b"branch"[..], Some(&b"z9hG4bK776asdhds"[..])));
        assert_eq!(via.params[1], (&b"rport"[..], None));
    }

    #[test]
    fn test_via_ipv6_and_spacing() {
        let (_, via) = via_parm(b"SIP / 2.0 / TCP [2001:db8::1]:5070 ; branch = z9hG4bKx").unwrap();
        assert_eq!(via.transport, b"TCP");
        assert_eq!(via.host, b"[2001:db8::1]");
        assert_eq!(via.port, Some(5070));
        assert_eq!(via.params[0].1, Some(&b"z9hG4bKx"[..]));
    }

    #[test]
    fn test_name_addr_forms() {
        let (_, na) = name_addr(b"\"Bob\" <sip:bob@biloxi.com>;tag=a6c85cf").unwrap();
        assert_eq!(na.display_name, Some(&b"\"Bob\""[..]));
        assert_eq!(na.uri, b"sip:bob@biloxi.com");
        assert!(na.bracketed);
        assert_eq!(na.params, vec![(&b"tag"[..], Some(&b"a6c85cf"[..]))]);

        let (_, na) = name_addr(b"Alice Smith <sip:alice@atlanta.com>").unwrap();
        assert_eq!(na.display_name, Some(&b"Alice Smith"[..]));

        let (_, na) = name_addr(b"sip:carol@chicago.com;tag=1928301774").unwrap();
        assert_eq!(na.display_name, None);
        assert!(!na.bracketed);
        assert_eq!(na.uri, b"sip:carol@chicago.com");
        assert_eq!(na.params[0].0, b"tag");
    }

    #[test]
    fn test_sip_uri() {
        let (rest, uri) = sip_uri(b"sip:alice:secret@atlanta.com:5061;transport=tcp").unwrap();
        assert_eq!(uri.scheme, b"sip");
        assert_eq!(uri.user, Some(&b"alice"[..]));
        assert_eq!(uri.host, b"atlanta.com");
        assert_eq!(uri.port, Some(5061));
        assert_eq!(rest, b";transport=tcp");

        let (_, uri) = sip_uri(b"sip:registrar.biloxi.com").unwrap();
        assert_eq!(uri.user, None);
        assert_eq!(uri.host, b"registrar.biloxi.com");
    }

    #[test]
    fn test_cseq() {
        assert_eq!(cseq(b"314159 INVITE").unwrap().1, (314159, &b"INVITE"[..]));
        assert_eq!(cseq(b" 1  ACK ").unwrap().1, (1, &b"ACK"[..]));
        assert!(cseq(b"INVITE 1").is_err());
        assert!(cseq(b"1").is_err());
        assert!(cseq(b"1 INVITE extra").is_err());
    }

    #[test]
    fn test_quoted_string() {
        let (rest, q) = quoted_string(b"\"a \\\"b\\\" c\" <").unwrap();
        assert_eq!(q, b"\"a \\\"b\\\" c\"");
        assert_eq!(rest, b" <");
        assert!(quoted_string(b"\"open").is_err());
    }

    #[test]
    fn test_number_value() {
        assert_eq!(number_value(b" 70 ").unwrap().1, 70);
        assert!(number_value(b"7O").is_err());
    }
}
