//! Response envelope decoding.
//!
//! The backend wraps payloads as `{ code, message, data? }` where `code == 0`
//! means success regardless of HTTP status. Some auth endpoints answer with
//! `statusCode: 200` instead of `code`. The raw shape is decoded once here and
//! turned into a tagged [`Envelope`]; nothing downstream sees the raw fields.

use serde::Deserialize;

/// A backend message: either a string or a list of validation strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Message {
    Text(String),
    Lines(Vec<String>),
}

impl Message {
    /// Flatten to one string; list entries are joined with a space.
    pub fn joined(&self) -> String {
        match self {
            Message::Text(text) => text.clone(),
            Message::Lines(lines) => lines.join(" "),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawEnvelope<T> {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default, rename = "statusCode")]
    status_code: Option<u16>,
    #[serde(default)]
    message: Option<Message>,
    #[serde(default, rename = "type")]
    outcome: Option<String>,
    #[serde(default = "Option::default")]
    data: Option<T>,
}

/// Decoded backend envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<T> {
    Success {
        data: Option<T>,
        message: String,
        /// The optional `type` tag (e.g. `"success"`).
        outcome: Option<String>,
    },
    Failure {
        code: i64,
        message: String,
    },
}

impl<T> From<RawEnvelope<T>> for Envelope<T> {
    fn from(raw: RawEnvelope<T>) -> Self {
        let message = raw.message.map(|m| m.joined()).unwrap_or_default();
        let ok = raw.code == Some(0) || (raw.code.is_none() && raw.status_code == Some(200));
        if ok {
            Envelope::Success {
                data: raw.data,
                message,
                outcome: raw.outcome,
            }
        } else {
            Envelope::Failure {
                code: raw.code.unwrap_or(-1),
                message,
            }
        }
    }
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Envelope::Success { message, .. } | Envelope::Failure { message, .. } => message,
        }
    }
}

/// Pull a human-readable message out of an error body, if it has one.
pub fn error_body_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<Message>,
        error: Option<String>,
    }

    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .message
        .map(|m| m.joined())
        .or(parsed.error)
        .filter(|m| !m.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn decode(body: &str) -> Envelope<Value> {
        serde_json::from_str::<RawEnvelope<Value>>(body).unwrap().into()
    }

    #[test]
    fn test_code_zero_is_success() {
        let env = decode(r#"{"code":0,"message":"ok","data":{"id":1}}"#);
        match env {
            Envelope::Success { data, message, .. } => {
                assert_eq!(message, "ok");
                assert_eq!(data.unwrap()["id"], 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_status_code_fallback() {
        assert!(decode(r#"{"statusCode":200,"data":null}"#).is_success());
        assert!(!decode(r#"{"statusCode":400}"#).is_success());
    }

    #[test]
    fn test_failure_joins_message_list() {
        let env = decode(r#"{"code":1,"message":["password too short","needs a digit"]}"#);
        assert_eq!(
            env,
            Envelope::Failure {
                code: 1,
                message: "password too short needs a digit".into()
            }
        );
    }

    #[test]
    fn test_error_body_message() {
        assert_eq!(
            error_body_message(r#"{"message":["a","b"]}"#).as_deref(),
            Some("a b")
        );
        assert_eq!(error_body_message(r#"{"error":"Bad"}"#).as_deref(), Some("Bad"));
        assert_eq!(error_body_message("<html>"), None);
    }
}
