//! Outbound wire envelope
//!
//! Every message leaving the gateway carries the same routing metadata,
//! independent of the transport that delivers it:
//!
//! - `subject` - message/category tag
//! - `creationTime` - UTC timestamp of the send attempt
//! - `from` - originating device identifier
//! - `dspl` - human-readable device display name
//!
//! plus a JSON body when the payload is structured. Senders must preserve
//! these fields; nothing else about the protocol is assumed here.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ProtocolError, Reading, Result, MAX_FRAME_SIZE};

/// Outbound message envelope with routing metadata and JSON body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    /// Message/category tag
    pub subject: String,

    /// UTC timestamp of the send attempt
    #[serde(rename = "creationTime")]
    pub creation_time: DateTime<Utc>,

    /// Originating device identifier
    pub from: String,

    /// Human-readable device display name
    pub dspl: String,

    /// Message body; structured JSON for typed readings, a JSON string
    /// for raw pass-through payloads that do not parse as JSON
    pub body: Value,
}

impl WireMessage {
    /// Build an envelope for a typed reading
    ///
    /// `creation_time` is stamped "now" - it records the send attempt, not
    /// the sample time (the sample time travels inside the body).
    pub fn for_reading(subject: impl Into<String>, reading: &Reading) -> Result<Self> {
        Ok(Self {
            subject: subject.into(),
            creation_time: Utc::now(),
            from: reading.device_id.clone(),
            dspl: reading.display_name.clone(),
            body: serde_json::to_value(reading)?,
        })
    }

    /// Build an envelope for an already-serialized payload
    ///
    /// The raw payload is embedded as structured JSON when it parses, and
    /// as a JSON string otherwise, so malformed intake lines still relay.
    pub fn for_serialized(
        subject: impl Into<String>,
        from: impl Into<String>,
        dspl: impl Into<String>,
        raw: &str,
    ) -> Self {
        let body = serde_json::from_str::<Value>(raw)
            .unwrap_or_else(|_| Value::String(raw.to_owned()));

        Self {
            subject: subject.into(),
            creation_time: Utc::now(),
            from: from.into(),
            dspl: dspl.into(),
            body,
        }
    }

    /// Encode the envelope as a JSON frame
    pub fn encode(&self) -> Result<Bytes> {
        let encoded = serde_json::to_vec(self)?;
        if encoded.len() > MAX_FRAME_SIZE {
            return Err(ProtocolError::FrameTooLarge {
                size: encoded.len(),
                max: MAX_FRAME_SIZE,
            });
        }
        Ok(Bytes::from(encoded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_reading_metadata() {
        let reading = Reading::new("dev-7", "temperature", 19.0).with_display_name("Lab");
        let before = Utc::now();
        let msg = WireMessage::for_reading("sensor", &reading).unwrap();

        assert_eq!(msg.subject, "sensor");
        assert_eq!(msg.from, "dev-7");
        assert_eq!(msg.dspl, "Lab");
        assert!(msg.creation_time >= before);

        // The body is the structured reading, including the sample time
        assert_eq!(msg.body["device_id"], "dev-7");
        assert_eq!(msg.body["value"], 19.0);
    }

    #[test]
    fn test_for_serialized_json_payload() {
        let msg = WireMessage::for_serialized("sensor", "gw-1", "Gateway", r#"{"value":42}"#);
        assert_eq!(msg.from, "gw-1");
        assert_eq!(msg.body["value"], 42);
    }

    #[test]
    fn test_for_serialized_non_json_payload() {
        let msg = WireMessage::for_serialized("sensor", "gw-1", "Gateway", "not json at all");
        assert_eq!(msg.body, Value::String("not json at all".into()));
    }

    #[test]
    fn test_encode_wire_field_names() {
        let msg = WireMessage::for_serialized("sensor", "gw-1", "Gateway", "42");
        let frame = msg.encode().unwrap();
        let decoded: Value = serde_json::from_slice(&frame).unwrap();

        // Wire names are part of the contract with downstream consumers
        assert!(decoded.get("subject").is_some());
        assert!(decoded.get("creationTime").is_some());
        assert!(decoded.get("from").is_some());
        assert!(decoded.get("dspl").is_some());
        assert!(decoded.get("body").is_some());
    }

    #[test]
    fn test_encode_round_trip() {
        let reading = Reading::new("dev-1", "temperature", 3.5);
        let msg = WireMessage::for_reading("sensor", &reading).unwrap();
        let frame = msg.encode().unwrap();
        let back: WireMessage = serde_json::from_slice(&frame).unwrap();
        assert_eq!(back, msg);
    }
}
