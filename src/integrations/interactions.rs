//! Discord interaction payloads and request signing.
//!
//! Discord signs every interaction with Ed25519 over `timestamp || body`.
//! Unsigned or mis-signed requests must be refused before the body is
//! trusted.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};

/// Name of the message context-menu command.
pub const DRAFT_COMMAND: &str = "Generate Draft";

/// Topic used by `/outlines` when none is given.
pub const DEFAULT_OUTLINE_TOPIC: &str = "latest music production trends";

/// Header carrying the hex signature.
pub const SIGNATURE_HEADER: &str = "X-Signature-Ed25519";

/// Header carrying the signed timestamp.
pub const TIMESTAMP_HEADER: &str = "X-Signature-Timestamp";

/// Signature verification failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("public key is not configured")]
    MissingKey,

    #[error("invalid public key: {0}")]
    InvalidKey(String),

    #[error("missing signature headers")]
    MissingHeaders,

    #[error("invalid request signature")]
    Invalid,
}

/// Verifies interaction signatures against the application's public key.
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    key: VerifyingKey,
}

impl SignatureVerifier {
    /// Parse a hex-encoded Ed25519 public key.
    pub fn from_hex(public_key: &str) -> Result<Self, SignatureError> {
        let bytes = hex::decode(public_key.trim())
            .map_err(|e| SignatureError::InvalidKey(e.to_string()))?;
        let bytes: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| SignatureError::InvalidKey(format!("expected 32 bytes, got {}", bytes.len())))?;
        let key = VerifyingKey::from_bytes(&bytes)
            .map_err(|e| SignatureError::InvalidKey(e.to_string()))?;
        Ok(Self { key })
    }

    /// Check `signature` (hex) over `timestamp` followed by `body`.
    pub fn verify(&self, signature: &str, timestamp: &str, body: &[u8]) -> Result<(), SignatureError> {
        let bytes = hex::decode(signature.trim()).map_err(|_| SignatureError::Invalid)?;
        let bytes: [u8; 64] = bytes.as_slice().try_into().map_err(|_| SignatureError::Invalid)?;
        let signature = Signature::from_bytes(&bytes);

        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body);

        self.key.verify(&message, &signature).map_err(|_| SignatureError::Invalid)
    }
}

/// Interaction types Discord sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    Ping,
    ApplicationCommand,
    MessageComponent,
    Other(u8),
}

impl From<u8> for InteractionKind {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Ping,
            2 => Self::ApplicationCommand,
            3 => Self::MessageComponent,
            other => Self::Other(other),
        }
    }
}

/// Inbound interaction request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Interaction {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub data: Option<InteractionData>,
}

/// Command-specific payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InteractionData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub options: Vec<CommandOption>,
    #[serde(default)]
    pub target_id: Option<String>,
    #[serde(default)]
    pub resolved: Option<Resolved>,
}

/// A supplied command option.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandOption {
    pub name: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

/// Entities resolved by Discord for context-menu commands.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Resolved {
    #[serde(default)]
    pub messages: std::collections::HashMap<String, ResolvedMessage>,
}

/// A message the command was invoked on.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResolvedMessage {
    #[serde(default)]
    pub content: String,
}

impl Interaction {
    /// Parsed interaction type.
    pub fn kind(&self) -> InteractionKind {
        InteractionKind::from(self.kind)
    }

    /// Invoked command name, empty when absent.
    pub fn command_name(&self) -> &str {
        self.data.as_ref().map_or("", |d| d.name.as_str())
    }

    /// String value of option `name`, if supplied and non-empty.
    pub fn string_option(&self, name: &str) -> Option<&str> {
        self.data
            .as_ref()?
            .options
            .iter()
            .find(|o| o.name == name)
            .and_then(|o| o.value.as_str())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// Content of the message a context-menu command targeted.
    ///
    /// Prefers the entry matching `target_id`, else any resolved message.
    pub fn target_message(&self) -> Option<&str> {
        let data = self.data.as_ref()?;
        let messages = &data.resolved.as_ref()?.messages;
        data.target_id
            .as_ref()
            .and_then(|id| messages.get(id))
            .or_else(|| messages.values().next())
            .map(|m| m.content.as_str())
    }
}

/// Synchronous reply to an interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

/// Immediate message content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseData {
    pub content: String,
}

impl InteractionResponse {
    /// Handshake reply.
    pub fn pong() -> Self {
        Self { kind: 1, data: None }
    }

    /// Immediate message.
    pub fn message(content: impl Into<String>) -> Self {
        Self { kind: 4, data: Some(ResponseData { content: content.into() }) }
    }

    /// "Thinking…" acknowledgement; the real reply follows as an edit.
    pub fn deferred() -> Self {
        Self { kind: 5, data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    fn keypair() -> (SigningKey, String) {
        let signing = SigningKey::from_bytes(&[7u8; 32]);
        let public = hex::encode(signing.verifying_key().to_bytes());
        (signing, public)
    }

    #[test]
    fn test_valid_signature() {
        let (signing, public) = keypair();
        let body = br#"{"type":1}"#;
        let mut message = b"1700000000".to_vec();
        message.extend_from_slice(body);
        let signature = hex::encode(signing.sign(&message).to_bytes());

        let verifier = SignatureVerifier::from_hex(&public).unwrap();
        assert!(verifier.verify(&signature, "1700000000", body).is_ok());
    }

    #[test]
    fn test_tampered_body_rejected() {
        let (signing, public) = keypair();
        let signature = hex::encode(signing.sign(b"1700000000{\"type\":1}").to_bytes());

        let verifier = SignatureVerifier::from_hex(&public).unwrap();
        assert_eq!(
            verifier.verify(&signature, "1700000000", br#"{"type":2}"#),
            Err(SignatureError::Invalid)
        );
        assert_eq!(verifier.verify("zz", "1", b""), Err(SignatureError::Invalid));
    }

    #[test]
    fn test_bad_public_key() {
        assert!(matches!(SignatureVerifier::from_hex("abc"), Err(SignatureError::InvalidKey(_))));
        assert!(matches!(SignatureVerifier::from_hex("abcd"), Err(SignatureError::InvalidKey(_))));
    }

    #[test]
    fn test_parse_outlines_command() {
        let json = r#"{
            "type": 2,
            "token": "tok",
            "data": {"name": "outlines", "options": [{"name": "topic", "type": 3, "value": " lofi drums "}]}
        }"#;
        let interaction: Interaction = serde_json::from_str(json).unwrap();
        assert_eq!(interaction.kind(), InteractionKind::ApplicationCommand);
        assert_eq!(interaction.command_name(), "outlines");
        assert_eq!(interaction.string_option("topic"), Some("lofi drums"));
        assert_eq!(interaction.string_option("missing"), None);
    }

    #[test]
    fn test_parse_message_command() {
        let json = r#"{
            "type": 2,
            "token": "tok",
            "data": {
                "name": "Generate Draft",
                "type": 3,
                "target_id": "42",
                "resolved": {"messages": {"42": {"id": "42", "content": "Scout intel"}}}
            }
        }"#;
        let interaction: Interaction = serde_json::from_str(json).unwrap();
        assert_eq!(interaction.command_name(), DRAFT_COMMAND);
        assert_eq!(interaction.target_message(), Some("Scout intel"));
    }

    #[test]
    fn test_ping_without_data() {
        let interaction: Interaction = serde_json::from_str(r#"{"type":1}"#).unwrap();
        assert_eq!(interaction.kind(), InteractionKind::Ping);
        assert_eq!(interaction.command_name(), "");
        assert!(interaction.target_message().is_none());
    }

    #[test]
    fn test_response_shapes() {
        assert_eq!(serde_json::to_value(InteractionResponse::pong()).unwrap(), serde_json::json!({"type": 1}));
        assert_eq!(
            serde_json::to_value(InteractionResponse::deferred()).unwrap(),
            serde_json::json!({"type": 5})
        );
        assert_eq!(
            serde_json::to_value(InteractionResponse::message("hi")).unwrap(),
            serde_json::json!({"type": 4, "data": {"content": "hi"}})
        );
    }
}
