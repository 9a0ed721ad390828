//! WhatsApp Cloud API webhook payload shapes.
//!
//! Only the envelope (`entry` and `changes`) is decoded up front. Messages and
//! contacts stay raw JSON until the router reaches them, so one odd message
//! fails on its own instead of taking its siblings down with it.

use {
    serde::{Deserialize, Deserializer, Serialize, de::Error as _},
    serde_json::Value,
    tracing::debug,
};

use crate::error::PayloadError;

/// `object` value carried by WhatsApp Business webhooks.
pub const WHATSAPP_BUSINESS_OBJECT: &str = "whatsapp_business_account";

/// The only change field that carries inbound messages.
pub const MESSAGES_FIELD: &str = "messages";

/// Top-level webhook body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

impl WebhookPayload {
    pub fn from_value(value: Value) -> Result<Self, PayloadError> {
        Ok(serde_json::from_value(value)?)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

/// One change notification. `field` and `value` are kept raw: statuses and
/// account updates arrive here too, each with its own shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookChange {
    #[serde(default)]
    pub field: Value,
    #[serde(default)]
    pub value: Value,
}

impl WebhookChange {
    #[must_use]
    pub fn carries_messages(&self) -> bool {
        self.field.as_str() == Some(MESSAGES_FIELD)
    }

    /// Raw messages, empty when `value.messages` is absent or not a list.
    #[must_use]
    pub fn messages(&self) -> &[Value] {
        self.value
            .get("messages")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Contacts in payload order. An entry that does not decode keeps its
    /// slot as a contact without a profile.
    #[must_use]
    pub fn contacts(&self) -> Vec<Contact> {
        let Some(raw) = self.value.get("contacts").and_then(Value::as_array) else {
            return Vec::new();
        };
        raw.iter()
            .map(|contact| {
                Contact::deserialize(contact).unwrap_or_else(|e| {
                    debug!(error = %e, "ignoring undecodable webhook contact");
                    Contact::default()
                })
            })
            .collect()
    }

    #[must_use]
    pub fn phone_number_id(&self) -> Option<&Value> {
        self.value.get("metadata")?.get("phone_number_id")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default, deserialize_with = "string_or_number")]
    pub wa_id: Option<String>,
    #[serde(default)]
    pub profile: Option<ContactProfile>,
}

impl Contact {
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.profile.as_ref()?.name.as_deref()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactProfile {
    #[serde(default)]
    pub name: Option<String>,
}

/// One inbound message. Media, location and interactive bodies are kept as
/// raw JSON in `extra`; only text bodies are read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookMessage {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    /// Sender phone number. Numeric senders are read as their digits.
    #[serde(default, deserialize_with = "string_or_number")]
    pub from: Option<String>,
    /// Unix seconds.
    #[serde(default, deserialize_with = "string_or_number")]
    pub timestamp: Option<String>,
    #[serde(default, rename = "type")]
    pub message_type: Option<String>,
    #[serde(default)]
    pub text: Option<TextBody>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Rendered in acknowledgements when a message carries no `type`.
pub const UNKNOWN_MESSAGE_TYPE: &str = "unknown";

impl WebhookMessage {
    pub fn from_value(value: &Value) -> Result<Self, PayloadError> {
        Self::deserialize(value).map_err(PayloadError::InvalidMessage)
    }

    /// Message type, `"unknown"` when absent.
    #[must_use]
    pub fn kind(&self) -> &str {
        self.message_type.as_deref().unwrap_or(UNKNOWN_MESSAGE_TYPE)
    }

    /// Text body for `type == "text"` messages. A text message without a
    /// body reads as the empty string.
    #[must_use]
    pub fn text_body(&self) -> Option<&str> {
        if self.message_type.as_deref() != Some("text") {
            return None;
        }
        Some(
            self.text
                .as_ref()
                .and_then(|t| t.body.as_deref())
                .unwrap_or_default(),
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextBody {
    #[serde(default)]
    pub body: Option<String>,
}

/// Name from the first contact's profile, if the payload carried one.
#[must_use]
pub fn first_contact_name(contacts: &[Contact]) -> Option<&str> {
    contacts.first()?.name()
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected a string or number, found {other}"
        ))),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn parses_text_message_payload() {
        let payload = WebhookPayload::from_value(json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "id": "WABA_ID",
                "changes": [{
                    "field": "messages",
                    "value": {
                        "messaging_product": "whatsapp",
                        "metadata": {
                            "display_phone_number": "15550000000",
                            "phone_number_id": "1234567890"
                        },
                        "contacts": [{"profile": {"name": "Alice"}, "wa_id": "15551234"}],
                        "messages": [{
                            "from": "15551234",
                            "id": "wamid.1",
                            "timestamp": "1700000000",
                            "type": "text",
                            "text": {"body": "Hi"}
                        }]
                    }
                }]
            }]
        }))
        .unwrap();

        let change = &payload.entry[0].changes[0];
        assert_eq!(payload.object, WHATSAPP_BUSINESS_OBJECT);
        assert!(change.carries_messages());
        assert_eq!(change.phone_number_id(), Some(&json!("1234567890")));
        assert_eq!(first_contact_name(&change.contacts()), Some("Alice"));
        let msg = WebhookMessage::from_value(&change.messages()[0]).unwrap();
        assert_eq!(msg.from.as_deref(), Some("15551234"));
        assert_eq!(msg.kind(), "text");
        assert_eq!(msg.text_body(), Some("Hi"));
    }

    #[test]
    fn media_message_keeps_raw_body() {
        let msg = WebhookMessage::from_value(&json!({
            "from": "15551234",
            "type": "image",
            "image": {"id": "media-1", "mime_type": "image/jpeg"}
        }))
        .unwrap();

        assert_eq!(msg.kind(), "image");
        assert_eq!(msg.text_body(), None);
        assert_eq!(msg.extra["image"]["id"], "media-1");
    }

    #[test]
    fn missing_type_reads_unknown() {
        let msg = WebhookMessage::from_value(&json!({"from": "1"})).unwrap();
        assert_eq!(msg.kind(), UNKNOWN_MESSAGE_TYPE);
        assert_eq!(msg.text_body(), None);
    }

    #[test]
    fn text_without_body_is_empty() {
        let msg = WebhookMessage::from_value(&json!({"from": "1", "type": "text"})).unwrap();
        assert_eq!(msg.text_body(), Some(""));
    }

    #[test]
    fn numeric_sender_reads_as_digits() {
        let msg = WebhookMessage::from_value(&json!({
            "from": 15551234,
            "timestamp": 1700000000,
            "type": "image"
        }))
        .unwrap();
        assert_eq!(msg.from.as_deref(), Some("15551234"));
        assert_eq!(msg.timestamp.as_deref(), Some("1700000000"));
    }

    #[test]
    fn text_that_is_not_an_object_fails_the_message() {
        let err = WebhookMessage::from_value(&json!({
            "from": "1",
            "type": "text",
            "text": "oops-string-not-object"
        }))
        .unwrap_err();
        assert!(matches!(err, PayloadError::InvalidMessage(_)));

        let err = WebhookMessage::from_value(&json!({"from": ["1"], "type": "text"})).unwrap_err();
        assert!(matches!(err, PayloadError::InvalidMessage(_)));
    }

    #[test]
    fn sparse_payload_uses_defaults() {
        let payload = WebhookPayload::from_value(json!({
            "object": "whatsapp_business_account",
            "entry": [{"changes": [{"field": "messages", "value": {}}]}]
        }))
        .unwrap();
        let change = &payload.entry[0].changes[0];
        assert!(change.messages().is_empty());
        assert_eq!(first_contact_name(&change.contacts()), None);
        assert_eq!(change.phone_number_id(), None);
    }

    #[test]
    fn odd_change_value_reads_as_empty() {
        let payload = WebhookPayload::from_value(json!({
            "object": "whatsapp_business_account",
            "entry": [{"changes": [
                {"field": "messages", "value": "not-an-object"},
                {"field": 7, "value": {"messages": "nope", "contacts": {}}}
            ]}]
        }))
        .unwrap();
        let changes = &payload.entry[0].changes;
        assert!(changes[0].carries_messages());
        assert!(changes[0].messages().is_empty());
        assert!(!changes[1].carries_messages());
        assert!(changes[1].messages().is_empty());
        assert!(changes[1].contacts().is_empty());
    }

    #[test]
    fn wrong_shape_is_malformed() {
        let err = WebhookPayload::from_value(json!({
            "object": "whatsapp_business_account",
            "entry": {"not": "a list"}
        }))
        .unwrap_err();
        assert!(matches!(err, PayloadError::Malformed(_)));
    }

    #[test]
    fn contact_without_profile_has_no_name() {
        let contacts = vec![Contact {
            wa_id: Some("1".into()),
            profile: None,
        }];
        assert_eq!(first_contact_name(&contacts), None);
    }

    #[test]
    fn undecodable_contact_keeps_its_slot() {
        let change = WebhookChange {
            field: json!("messages"),
            value: json!({"contacts": [
                {"wa_id": "1", "profile": "not-an-object"},
                {"wa_id": "2", "profile": {"name": "Bob"}}
            ]}),
        };
        let contacts = change.contacts();
        assert_eq!(contacts.len(), 2);
        assert_eq!(first_contact_name(&contacts), None);
        assert_eq!(contacts[1].name(), Some("Bob"));
    }
}
