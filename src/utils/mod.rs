//! Header and query normalization helpers shared by the request and reply paths.
//!
//! All functions here are pure; header canonicalization in particular keeps no
//! process-wide table.

use std::collections::HashMap;

use crate::models::MultiValueMap;

/// Returns true for bytes allowed in an HTTP token (RFC 9110 `tchar`).
#[inline]
const fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_'
                | b'`' | b'|' | b'~'
        )
}

/// Canonical MIME header form of `key`.
///
/// The first letter and any letter following a hyphen are upper-cased, the rest
/// lower-cased: `content-type` → `Content-Type`. Keys containing bytes that are
/// not valid in a header name are returned unchanged.
#[must_use]
pub fn canonical_header_key(key: &str) -> String {
    if !key.bytes().all(is_token_byte) {
        return key.to_string();
    }
    let mut upper = true;
    key.chars()
        .map(|c| {
            let mapped = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            mapped
        })
        .collect()
}

/// Wraps every value into a one-element sequence.
#[must_use]
#[allow(clippy::implicit_hasher)]
pub fn lift_single(single: HashMap<String, String>) -> MultiValueMap {
    single.into_iter().map(|(k, v)| (k, vec![v])).collect()
}

/// Byte offset of the first malformed percent-escape in `s`, if any.
///
/// A `%` must be followed by exactly two hex digits.
#[must_use]
pub fn invalid_percent_escape(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return Some(i);
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    None
}

/// Decodes one form-urlencoded query component: `+` becomes a space, `%XX`
/// sequences are unescaped. Invalid UTF-8 is replaced lossily.
#[must_use]
pub fn decode_query_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    let decoded = urlencoding::decode_binary(spaced.as_bytes());
    String::from_utf8_lossy(&decoded).into_owned()
}

/// Parses a raw query string into decoded multi-value parameters.
///
/// Values for the same key keep their order. A pair without `=` yields an empty
/// value; empty pairs are skipped.
#[must_use]
pub fn parse_query(raw: &str) -> MultiValueMap {
    let mut params = MultiValueMap::new();
    for pair in raw.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        params
            .entry(decode_query_component(key))
            .or_default()
            .push(decode_query_component(value));
    }
    params
}
