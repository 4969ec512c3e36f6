//! Echo reply encoding.
//!
//! - JSON payloads => same payload, `message` prefixed, extra fields kept
//! - anything else => plain text, prefixed

use chatwire_core::protocol::{encode_outbound, WirePayload};

pub fn echo_reply(prefix: &str, text: &str) -> String {
    let Ok(mut payload) = serde_json::from_str::<WirePayload>(text) else {
        return format!("{prefix}{text}");
    };
    payload.message = format!("{prefix}{}", payload.message);
    encode_outbound(&payload).unwrap_or_else(|_| format!("{prefix}{text}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn json_payload_is_prefixed_and_preserved() {
        let out = echo_reply("Echo: ", r#"{"message":"hi","conversation":3}"#);
        let v: Value = serde_json::from_str(&out).unwrap_or_default();
        assert_eq!(v["message"], "Echo: hi");
        assert_eq!(v["conversation"], 3);
    }

    #[test]
    fn plain_text_is_prefixed() {
        assert_eq!(echo_reply("Echo: ", "hi"), "Echo: hi");
    }

    #[test]
    fn json_without_message_is_treated_as_text() {
        assert_eq!(echo_reply(">", r#"{"a":1}"#), r#">{"a":1}"#);
    }
}
