//! Canonical signed message construction

use std::borrow::Cow;

use serde_json::Value;

/// Body substituted for an absent or empty request body
const EMPTY_BODY: &[u8] = b"{}";

/// Request body as seen by the verifier.
#[derive(Debug, Clone, Copy)]
pub enum Body<'a> {
    /// No body was sent
    Absent,
    /// Exact bytes as received on the wire
    Raw(&'a [u8]),
    /// An already-parsed JSON document.
    ///
    /// Re-serialized by serde_json, which may differ from other JSON writers
    /// (a float `1.0` stays `1.0` where `JSON.stringify` writes `1`). Senders
    /// in other languages should be verified against [`Body::Raw`].
    Json(&'a Value),
}

/// Bytes of the body that take part in the signature.
///
/// Raw bodies are used verbatim. Parsed JSON is re-serialized compactly with
/// key order preserved. Absent, empty, and `null` bodies become `{}`.
pub fn canonical_body<'a>(body: &Body<'a>) -> Cow<'a, [u8]> {
    match body {
        Body::Absent => Cow::Borrowed(EMPTY_BODY),
        Body::Raw(bytes) if bytes.is_empty() => Cow::Borrowed(EMPTY_BODY),
        Body::Raw(bytes) => Cow::Borrowed(*bytes),
        Body::Json(Value::Null) => Cow::Borrowed(EMPTY_BODY),
        // Value's Display is compact JSON and cannot fail
        Body::Json(value) => Cow::Owned(value.to_string().into_bytes()),
    }
}

/// Build `"{timestamp}.{canonical_body}"`.
///
/// `timestamp` is the header value exactly as received, so the receiver signs
/// the same bytes the sender did.
pub fn canonical_message(timestamp: &str, body: &Body<'_>) -> Vec<u8> {
    let body = canonical_body(body);
    let mut message = Vec::with_capacity(timestamp.len() + 1 + body.len());
    message.extend_from_slice(timestamp.as_bytes());
    message.push(b'.');
    message.extend_from_slice(&body);
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_body_verbatim() {
        let raw = br#"{ "b": 2,  "a": 1 }"#;
        let msg = canonical_message("1700000000000", &Body::Raw(raw));
        assert_eq!(msg, br#"1700000000000.{ "b": 2,  "a": 1 }"#.to_vec());
    }

    #[test]
    fn test_empty_bodies_become_braces() {
        let null = Value::Null;
        for body in [Body::Absent, Body::Raw(b""), Body::Json(&null)] {
            assert_eq!(canonical_message("5", &body), b"5.{}".to_vec());
        }
    }

    #[test]
    fn test_empty_object_distinct_from_other_bodies() {
        let empty = canonical_message("5", &Body::Absent);
        let others = [
            canonical_message("5", &Body::Raw(b"[]")),
            canonical_message("5", &Body::Raw(b"{ }")),
            canonical_message("5", &Body::Raw(b"0")),
            canonical_message("5", &Body::Raw(b"\"\"")),
        ];
        for other in others {
            assert_ne!(empty, other);
        }
    }

    #[test]
    fn test_json_compact_and_ordered() {
        let value = json!({"z": 1, "a": [true, null], "m": {"k": "v"}});
        let msg = canonical_message("1", &Body::Json(&value));
        assert_eq!(
            String::from_utf8(msg).unwrap(),
            r#"1.{"z":1,"a":[true,null],"m":{"k":"v"}}"#
        );
    }

    #[test]
    fn test_json_floats_keep_fraction() {
        let value = json!({"a": 1.0});
        assert_eq!(
            canonical_message("1", &Body::Json(&value)),
            br#"1.{"a":1.0}"#.to_vec()
        );
        assert_ne!(
            canonical_message("1", &Body::Json(&value)),
            canonical_message("1", &Body::Raw(br#"{"a":1}"#))
        );
    }

    #[test]
    fn test_json_matches_raw_compact() {
        let value = json!({"a": 1});
        assert_eq!(
            canonical_message("1700000000000", &Body::Json(&value)),
            canonical_message("1700000000000", &Body::Raw(br#"{"a":1}"#)),
        );
    }
}
