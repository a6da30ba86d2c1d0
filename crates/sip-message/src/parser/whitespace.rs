use nom::{
    branch::alt,
    bytes::complete::tag,
    combinator::{opt, recognize},
    multi::{many0, many1},
    sequence::{pair, tuple},
    IResult,
};

// Type alias for parser result
pub type ParseResult<'a, O> = IResult<&'a [u8], O>;

/// Parses a single whitespace character (SP or HTAB)
pub fn wsp(input: &[u8]) -> ParseResult<&[u8]> {
    recognize(alt((tag(b" "), tag(b"\t"))))(input)
}

/// Parses optional whitespace (0 or more SP or HTAB)
pub fn owsp(input: &[u8]) -> ParseResult<&[u8]> {
    recognize(many0(wsp))(input)
}

/// Parses CRLF (accepts \r\n or just \n)
pub fn crlf(input: &[u8]) -> ParseResult<&[u8]> {
    recognize(alt((tag(b"\r\n"), tag(b"\n"))))(input)
}

/// LWS = [*WSP CRLF] 1*WSP
///
/// A CRLF followed by whitespace is a folded continuation of the same line.
pub fn lws(input: &[u8]) -> ParseResult<&[u8]> {
    alt((
        recognize(pair(pair(owsp, crlf), many1(wsp))),
        recognize(many1(wsp)),
    ))(input)
}

/// SWS = [LWS]
pub fn sws(input: &[u8]) -> ParseResult<&[u8]> {
    opt(lws)(input).map(|(rem, val)| (rem, val.unwrap_or(&[])))
}

fn padded<'a>(sep: &'static [u8]) -> impl FnMut(&'a [u8]) -> ParseResult<'a, &'a [u8]> {
    recognize(tuple((sws, tag(sep), sws)))
}

/// SLASH = SWS "/" SWS
pub fn slash(input: &[u8]) -> ParseResult<&[u8]> {
    padded(b"/")(input)
}

/// EQUAL = SWS "=" SWS
pub fn equal(input: &[u8]) -> ParseResult<&[u8]> {
    padded(b"=")(input)
}

/// SEMI = SWS ";" SWS
pub fn semi(input: &[u8]) -> ParseResult<&[u8]> {
    padded(b";")(input)
}

/// COLON = SWS ":" SWS
pub fn colon(input: &[u8]) -> ParseResult<&[u8]> {
    padded(b":")(input)
}

/// LAQUOT = SWS "<"
pub fn laquot(input: &[u8]) -> ParseResult<&[u8]> {
    recognize(pair(sws, tag(b"<")))(input)
}

/// RAQUOT = ">" SWS
pub fn raquot(input: &[u8]) -> ParseResult<&[u8]> {
    recognize(pair(tag(b">"), sws))(input)
}

/// Returns `true` for SP, HTAB, CR and LF.
#[inline]
pub fn is_lws_byte(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

/// Collapses every run of linear whitespace to one SP and drops leading and
/// trailing whitespace. Used to compare header values that differ only in
/// folding or spacing.
pub fn normalize_lws(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut pending_space = false;
    for &b in input {
        if is_lws_byte(b) {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(b' ');
            pending_space = false;
        }
        out.push(b);
    }
    out
}
