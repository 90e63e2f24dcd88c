//! Request target construction from already-escaped path and query values.

use std::borrow::Cow;

use http::Uri;

use crate::models::{AdapterError, MultiValueMap};
use crate::utils::invalid_percent_escape;

/// Builds the request URI from an escaped `path` and escaped query values.
///
/// Nothing is re-encoded: `hello%20world` stays as-is in the URI and decodes to
/// `hello world` when read back. Raw bytes a [`Uri`] cannot hold (space, `"`,
/// `<`, `>`, controls, non-ASCII) are percent-escaped, so `q=a"b` still reads back
/// as `a"b`. Each value of a multi-valued key becomes its own `key=value` pair, in
/// the order given. Order across keys is unspecified.
///
/// # Errors
///
/// Returns `AdapterError::MalformedUrl` when the path is not absolute or contains
/// an invalid percent-escape.
#[allow(clippy::implicit_hasher)]
pub fn build_uri(path: &str, query: &MultiValueMap) -> Result<Uri, AdapterError> {
    let path = if path.is_empty() { "/" } else { path };
    if !path.starts_with('/') {
        return Err(AdapterError::MalformedUrl(format!(
            "path must start with '/': {path:?}"
        )));
    }

    if query.values().all(Vec::is_empty) {
        return parse_target(path);
    }

    let mut target = String::with_capacity(path.len() + 1 + estimated_query_len(query));
    target.push_str(path);
    target.push('?');
    let mut first = true;
    for (key, values) in query {
        for value in values {
            if !first {
                target.push('&');
            }
            target.push_str(key);
            target.push('=');
            target.push_str(value);
            first = false;
        }
    }
    parse_target(&target)
}

fn estimated_query_len(query: &MultiValueMap) -> usize {
    query
        .iter()
        .map(|(k, vs)| vs.iter().map(|v| k.len() + v.len() + 2).sum::<usize>())
        .sum()
}

fn parse_target(target: &str) -> Result<Uri, AdapterError> {
    if let Some(pos) = invalid_percent_escape(target) {
        return Err(AdapterError::MalformedUrl(format!(
            "invalid URL escape at byte {pos} in {target:?}"
        )));
    }
    escape_unrepresentable(target)
        .parse::<Uri>()
        .map_err(|e| AdapterError::MalformedUrl(format!("{target:?}: {e}")))
}

/// Bytes that [`Uri`] refuses in a path or query. `%` is not among them, so
/// existing escapes pass through untouched.
#[inline]
const fn needs_escape(b: u8) -> bool {
    b <= b' ' || b >= 0x7F || matches!(b, b'"' | b'<' | b'>' | b'\\' | b'^' | b'`')
}

fn escape_unrepresentable(target: &str) -> Cow<'_, str> {
    if !target.bytes().any(needs_escape) {
        return Cow::Borrowed(target);
    }
    let mut escaped = String::with_capacity(target.len() + 16);
    for b in target.bytes() {
        if needs_escape(b) {
            escaped.push_str(&urlencoding::encode_binary(&[b]));
        } else {
            escaped.push(char::from(b));
        }
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::utils::parse_query;
    use std::collections::HashMap;

    fn single(pairs: &[(&str, &str)]) -> MultiValueMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), vec![(*v).to_string()]))
            .collect()
    }

    #[test]
    fn test_path_only() {
        let uri = build_uri("/api/users", &HashMap::new()).unwrap();
        assert_eq!(uri.path(), "/api/users");
        assert_eq!(uri.query(), None);
    }

    #[test]
    fn test_empty_path_is_root() {
        assert_eq!(build_uri("", &HashMap::new()).unwrap().path(), "/");
    }

    #[test]
    fn test_escaped_path_kept_verbatim() {
        let uri = build_uri("/api/v1/users%2F123", &single(&[("action", "view")])).unwrap();
        assert_eq!(uri.path(), "/api/v1/users%2F123");
        assert_eq!(uri.query(), Some("action=view"));
    }

    #[test]
    fn test_multiple_params() {
        let uri = build_uri("/filter", &single(&[("page", "1"), ("limit", "10")])).unwrap();
        let params = parse_query(uri.query().unwrap());
        assert_eq!(params["page"], vec!["1"]);
        assert_eq!(params["limit"], vec!["10"]);
    }

    #[test]
    fn test_multi_value_order_preserved() {
        let query = HashMap::from([(
            "id".to_string(),
            vec!["3".to_string(), "1".to_string(), "2".to_string()],
        )]);
        let uri = build_uri("/items", &query).unwrap();
        assert_eq!(uri.query(), Some("id=3&id=1&id=2"));
    }

    #[test]
    fn test_no_double_encoding() {
        let test_cases = vec![
            ("john%20doe", "john doe"),
            ("a%2Bb", "a+b"),
            ("a%26b", "a&b"),
            ("x%3D5", "x=5"),
            ("", ""),
        ];
        for (raw, expected) in test_cases {
            let uri = build_uri("/test", &single(&[("k", raw)])).unwrap();
            let params = parse_query(uri.query().unwrap());
            assert_eq!(params["k"], vec![expected], "decoding {raw}");
        }
    }

    #[test]
    fn test_keys_without_values_are_ignored() {
        let query = HashMap::from([("empty".to_string(), Vec::new())]);
        let uri = build_uri("/test", &query).unwrap();
        assert_eq!(uri.query(), None);
    }

    #[test]
    fn test_invalid_escape_fails() {
        let err = build_uri("/bad%zzpath", &HashMap::new()).unwrap_err();
        assert_eq!(err.kind(), "MalformedURL");

        let err = build_uri("/ok", &single(&[("q", "100%")])).unwrap_err();
        assert_eq!(err.kind(), "MalformedURL");
    }

    #[test]
    fn test_unrepresentable_characters_escaped() {
        let test_cases = vec![
            ("a\"b", "a%22b", "a\"b"),
            ("<a>", "%3Ca%3E", "<a>"),
            ("a b", "a%20b", "a b"),
            ("caf\u{e9}", "caf%C3%A9", "caf\u{e9}"),
            ("{a}|[1]", "{a}|[1]", "{a}|[1]"),
            ("50%25 <off>", "50%25%20%3Coff%3E", "50% <off>"),
        ];
        for (raw, target, decoded) in test_cases {
            let uri = build_uri("/search", &single(&[("q", raw)])).unwrap();
            assert_eq!(uri.query(), Some(format!("q={target}").as_str()), "escaping {raw}");
            let params = parse_query(uri.query().unwrap());
            assert_eq!(params["q"], vec![decoded], "decoding {raw}");
        }
    }

    #[test]
    fn test_path_with_space_escaped() {
        let uri = build_uri("/a b", &HashMap::new()).unwrap();
        assert_eq!(uri.path(), "/a%20b");
        assert_eq!(uri.query(), None);
    }

    #[test]
    fn test_relative_path_fails() {
        let err = build_uri("relative/path", &HashMap::new()).unwrap_err();
        assert!(matches!(err, AdapterError::MalformedUrl(_)));
    }
}
