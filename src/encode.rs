//! URL percent-encoding helpers.
//!
//! The decoder is strict: a `%` must be followed by exactly two hex digits
//! (either case), anything else fails the whole decode. All other bytes pass
//! through untouched, so decoding is byte-preserving for non-escape input.

/// Decodes `%HH` escapes in `src`. Returns `None` on a malformed escape.
pub fn url_decode(src: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(src.len());
    let mut i = 0;

    while i < src.len() {
        if src[i] == b'%' {
            let hi = hex_value(*src.get(i + 1)?)?;
            let lo = hex_value(*src.get(i + 2)?)?;
            out.push(hi * 16 + lo);
            i += 3;
        } else {
            out.push(src[i]);
            i += 1;
        }
    }

    Some(out)
}

/// Percent-encodes everything outside the RFC 3986 unreserved set, with
/// lowercase hex digits.
pub fn url_encode(src: &[u8]) -> String {
    let mut out = String::with_capacity(src.len());

    for &b in src {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02x}", b));
        }
    }

    out
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
