//! Wire codec for data store values.
//!
//! The service stores infinite numbers and writes them as the bare token
//! `inf` (or `-inf`), which standard JSON cannot parse. Decoding rewrites
//! those tokens to sentinel strings before parsing; encoding rewrites sentinel
//! strings back to bare tokens after serializing. Both passes track string
//! literals, so a string value that merely contains `inf` is left alone.
//!
//! Values whose genuine string content equals a sentinel cannot round-trip:
//! they are written as the bare token and come back as an infinity.

use base64::{engine::general_purpose::STANDARD, Engine};
use md5::{Digest, Md5};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Placeholder string standing in for positive infinity
pub const INF_SENTINEL: &str = "INF_REPLACE_ME";

/// Placeholder string standing in for negative infinity
pub const NEG_INF_SENTINEL: &str = "-INF_REPLACE_ME";

const INF_TOKEN: &str = "inf";
const NEG_INF_TOKEN: &str = "-inf";

/// Compute the base64-encoded MD5 digest sent as `content-md5`
pub fn compute_digest(content: &[u8]) -> String {
    STANDARD.encode(Md5::digest(content))
}

/// Parse wire JSON, accepting bare `inf`/`-inf` in value position
pub fn decode<T>(wire: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let json = replace_bare_infinities(wire);
    Ok(serde_json::from_str(&json)?)
}

/// Serialize to wire JSON, writing sentinel strings as bare `inf`/`-inf`
pub fn encode<T>(value: &T) -> Result<String>
where
    T: Serialize + ?Sized,
{
    let json = serde_json::to_string(value)?;
    Ok(replace_sentinels(&json))
}

fn replace_bare_infinities(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' => i = string_end(bytes, i),
            b'-' if is_token_at(bytes, i, NEG_INF_TOKEN) => {
                out.push_str(&text[copied..i]);
                out.push('"');
                out.push_str(NEG_INF_SENTINEL);
                out.push('"');
                i += NEG_INF_TOKEN.len();
                copied = i;
            }
            b'i' if is_token_at(bytes, i, INF_TOKEN) => {
                out.push_str(&text[copied..i]);
                out.push('"');
                out.push_str(INF_SENTINEL);
                out.push('"');
                i += INF_TOKEN.len();
                copied = i;
            }
            _ => i += 1,
        }
    }

    out.push_str(&text[copied..]);
    out
}

fn replace_sentinels(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'"' {
            i += 1;
            continue;
        }

        let end = string_end(bytes, i);
        let token = match text.get(i + 1..end - 1) {
            Some(INF_SENTINEL) => Some(INF_TOKEN),
            Some(NEG_INF_SENTINEL) => Some(NEG_INF_TOKEN),
            _ => None,
        };

        if let Some(token) = token {
            // object keys must stay strings
            if !is_object_key(bytes, end) {
                out.push_str(&text[copied..i]);
                out.push_str(token);
                copied = end;
            }
        }
        i = end;
    }

    out.push_str(&text[copied..]);
    out
}

/// Index just past the string literal opening at `start`
fn string_end(bytes: &[u8], start: usize) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn is_token_at(bytes: &[u8], at: usize, token: &str) -> bool {
    let end = at + token.len();
    bytes.get(at..end) == Some(token.as_bytes())
        && bytes
            .get(end)
            .map_or(true, |b| !b.is_ascii_alphanumeric() && *b != b'_')
}

fn is_object_key(bytes: &[u8], after: usize) -> bool {
    bytes[after..]
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .map_or(false, |b| *b == b':')
}

/// Serde adapter for `f64` fields that may hold an infinity.
///
/// Use with `#[serde(with = "opencloud::codec::float")]`.
pub mod float {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{INF_SENTINEL, NEG_INF_SENTINEL};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if value.is_infinite() {
            let sentinel = if value.is_sign_positive() {
                INF_SENTINEL
            } else {
                NEG_INF_SENTINEL
            };
            serializer.serialize_str(sentinel)
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Repr::deserialize(deserializer)? {
            Repr::Number(n) => Ok(n),
            Repr::Text(s) if s == INF_SENTINEL => Ok(f64::INFINITY),
            Repr::Text(s) if s == NEG_INF_SENTINEL => Ok(f64::NEG_INFINITY),
            Repr::Text(other) => Err(D::Error::custom(format!(
                "expected a number, got string {:?}",
                other
            ))),
        }
    }
}
