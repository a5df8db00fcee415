//! Discord REST integration.
//!
//! Edits deferred interaction responses, posts follow-ups and channel
//! messages, and manages the application's commands.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::{chunk::truncate, DiscordConfig, DISCORD_MESSAGE_LIMIT};

/// Embed title ceiling.
pub const EMBED_TITLE_LIMIT: usize = 256;
/// Embed description ceiling.
pub const EMBED_DESCRIPTION_LIMIT: usize = 4096;
/// Embed field name ceiling.
pub const FIELD_NAME_LIMIT: usize = 256;
/// Embed field value ceiling.
pub const FIELD_VALUE_LIMIT: usize = 1024;
/// Maximum fields per embed.
pub const MAX_FIELDS: usize = 25;

/// Message to send to Discord.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscordMessage {
    /// Card title (rich messages only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Plain content, or the card description for rich messages.
    pub text: String,

    /// Card color (hex color code).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Card fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<MessageField>,
}

/// A field in a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageField {
    /// Field name.
    pub name: String,
    /// Field value.
    pub value: String,
    /// Whether to display inline.
    #[serde(default)]
    pub inline: bool,
}

impl DiscordMessage {
    /// Create a simple text message.
    pub fn text(text: impl Into<String>) -> Self {
        Self { title: None, text: text.into(), color: None, fields: Vec::new() }
    }

    /// Create a card with a title.
    pub fn with_title(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            text: text.into(),
            color: None,
            fields: Vec::new(),
        }
    }

    /// Set the card color.
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Add a field to the card.
    pub fn add_field(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        inline: bool,
    ) -> Self {
        self.fields.push(MessageField { name: name.into(), value: value.into(), inline });
        self
    }

    /// Mark this as a success message.
    pub fn success(mut self) -> Self {
        if self.color.is_none() {
            self.color = Some("#28a745".to_string()); // Green
        }
        self
    }

    /// Whether this renders as plain content rather than a card.
    pub fn is_plain(&self) -> bool {
        self.fields.is_empty() && self.title.is_none() && self.color.is_none()
    }

    /// Build the Discord JSON body, clipped to the platform's ceilings.
    pub fn to_payload(&self) -> serde_json::Value {
        if self.is_plain() {
            return serde_json::json!({
                "content": truncate(&self.text, DISCORD_MESSAGE_LIMIT)
            });
        }

        let mut embed = serde_json::json!({
            "description": truncate(&self.text, EMBED_DESCRIPTION_LIMIT)
        });

        if let Some(ref title) = self.title {
            embed["title"] = serde_json::json!(truncate(title, EMBED_TITLE_LIMIT));
        }

        if let Some(ref color) = self.color {
            // Convert hex color to decimal
            if let Some(decimal) = hex_to_decimal(color) {
                embed["color"] = serde_json::json!(decimal);
            }
        }

        if !self.fields.is_empty() {
            let fields: Vec<serde_json::Value> = self
                .fields
                .iter()
                .take(MAX_FIELDS)
                .map(|f| {
                    serde_json::json!({
                        "name": truncate(&f.name, FIELD_NAME_LIMIT),
                        "value": truncate(&f.value, FIELD_VALUE_LIMIT),
                        "inline": f.inline
                    })
                })
                .collect();
            embed["fields"] = serde_json::json!(fields);
        }

        // Editing a deferred message keeps its "thinking" text unless content is cleared.
        serde_json::json!({
            "content": "",
            "embeds": [embed]
        })
    }
}

/// Convert hex color to decimal (for Discord).
fn hex_to_decimal(hex: &str) -> Option<u32> {
    let hex = hex.trim_start_matches('#');
    u32::from_str_radix(hex, 16).ok()
}

/// Error type for messaging operations.
#[derive(Debug, thiserror::Error)]
pub enum MessagingError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// Discord returned an error.
    #[error("Discord error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for MessagingError {
    fn from(e: reqwest::Error) -> Self {
        // Webhook URLs embed the interaction token.
        Self::Http(e.without_url())
    }
}

/// Result type for messaging operations.
pub type MessagingResult<T> = Result<T, MessagingError>;

/// Outbound side of the messaging platform.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Replace the deferred response for `token`.
    async fn edit_original(&self, token: &str, message: &DiscordMessage) -> MessagingResult<()>;

    /// Append a follow-up message for `token`.
    async fn post_followup(&self, token: &str, message: &DiscordMessage) -> MessagingResult<()>;

    /// Post to the configured channel with bot credentials.
    async fn post_channel(&self, message: &DiscordMessage) -> MessagingResult<()>;
}

/// Kind of application command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// `/name` slash command
    Slash,
    /// Right-click message command
    Message,
}

/// Application command to register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: String,
    pub description: String,
    pub kind: CommandKind,
    /// Optional string options as (name, description).
    pub string_options: Vec<(String, String)>,
}

impl CommandSpec {
    /// A slash command.
    pub fn slash(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind: CommandKind::Slash,
            string_options: Vec::new(),
        }
    }

    /// A message context-menu command.
    pub fn message(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            kind: CommandKind::Message,
            string_options: Vec::new(),
        }
    }

    /// Add an optional string option.
    pub fn with_option(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.string_options.push((name.into(), description.into()));
        self
    }

    /// Registration body.
    pub fn to_payload(&self) -> serde_json::Value {
        match self.kind {
            CommandKind::Slash => {
                let options: Vec<serde_json::Value> = self
                    .string_options
                    .iter()
                    .map(|(name, description)| {
                        serde_json::json!({
                            "name": name,
                            "description": description,
                            "type": 3,
                            "required": false
                        })
                    })
                    .collect();
                serde_json::json!({
                    "name": self.name,
                    "description": self.description,
                    "type": 1,
                    "options": options,
                    "integration_types": [0, 1],
                    "dm_permission": true
                })
            }
            CommandKind::Message => serde_json::json!({
                "name": self.name,
                "type": 3,
                "integration_types": [0, 1],
                "dm_permission": true
            }),
        }
    }
}

/// The commands this bot serves.
pub fn default_commands() -> Vec<CommandSpec> {
    vec![
        CommandSpec::slash("blog", "Pick today's trending topic and turn it into a blog post"),
        CommandSpec::slash("outlines", "Generate 4 blog outline approaches with sentiment analysis")
            .with_option("topic", "Topic for blog outlines"),
        CommandSpec::message(crate::integrations::interactions::DRAFT_COMMAND),
    ]
}

#[derive(Debug, Deserialize)]
struct RegisteredCommand {
    id: String,
    name: String,
}

/// Discord REST client.
pub struct DiscordClient {
    client: reqwest::Client,
    api_base: String,
    application_id: Option<String>,
    bot_token: Option<String>,
    channel_id: Option<String>,
}

impl DiscordClient {
    /// Create a client from configuration.
    pub fn new(config: &DiscordConfig) -> MessagingResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(format!(
                "DiscordBot (https://soundswap.example, {})",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            application_id: config.application_id.clone(),
            bot_token: config.bot_token.clone(),
            channel_id: config.channel_id.clone(),
        })
    }

    fn application_id(&self) -> MessagingResult<&str> {
        self.application_id
            .as_deref()
            .ok_or_else(|| MessagingError::Config("DISCORD_APP_ID not set".to_string()))
    }

    fn bot_auth(&self) -> MessagingResult<String> {
        self.bot_token
            .as_deref()
            .map(|t| format!("Bot {t}"))
            .ok_or_else(|| MessagingError::Config("DISCORD_BOT_TOKEN not set".to_string()))
    }

    fn webhook_url(&self, token: &str) -> MessagingResult<String> {
        Ok(format!("{}/webhooks/{}/{}", self.api_base, self.application_id()?, token))
    }

    fn commands_url(&self) -> MessagingResult<String> {
        Ok(format!("{}/applications/{}/commands", self.api_base, self.application_id()?))
    }

    async fn check(response: reqwest::Response) -> MessagingResult<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            Err(MessagingError::Api { status, message })
        }
    }

    /// Replace the application's commands with `commands`.
    ///
    /// Existing commands are deleted first. Returns each registration's
    /// outcome by name.
    pub async fn register_commands(
        &self,
        commands: &[CommandSpec],
    ) -> MessagingResult<Vec<(String, MessagingResult<()>)>> {
        let url = self.commands_url()?;
        let auth = self.bot_auth()?;

        let existing: Vec<RegisteredCommand> = Self::check(
            self.client.get(&url).header("Authorization", &auth).send().await?,
        )
        .await?
        .json()
        .await?;

        for command in existing {
            let deleted = self
                .client
                .delete(format!("{}/{}", url, command.id))
                .header("Authorization", &auth)
                .send()
                .await;
            match deleted {
                Ok(r) if r.status().is_success() => {
                    tracing::info!(command = %command.name, "Deleted command");
                }
                Ok(r) => {
                    tracing::warn!(command = %command.name, status = %r.status(), "Failed to delete command");
                }
                Err(e) => tracing::warn!(command = %command.name, error = %e, "Failed to delete command"),
            }
        }

        let mut results = Vec::with_capacity(commands.len());
        for command in commands {
            let outcome = match self
                .client
                .post(&url)
                .header("Authorization", &auth)
                .json(&command.to_payload())
                .send()
                .await
            {
                Ok(response) => Self::check(response).await.map(|_| ()),
                Err(e) => Err(e.into()),
            };
            results.push((command.name.clone(), outcome));
        }
        Ok(results)
    }
}

#[async_trait]
impl Messenger for DiscordClient {
    async fn edit_original(&self, token: &str, message: &DiscordMessage) -> MessagingResult<()> {
        let url = format!("{}/messages/@original", self.webhook_url(token)?);
        let response = self.client.patch(url).json(&message.to_payload()).send().await?;
        Self::check(response).await.map(|_| ())
    }

    async fn post_followup(&self, token: &str, message: &DiscordMessage) -> MessagingResult<()> {
        let url = self.webhook_url(token)?;
        let response = self.client.post(url).json(&message.to_payload()).send().await?;
        Self::check(response).await.map(|_| ())
    }

    async fn post_channel(&self, message: &DiscordMessage) -> MessagingResult<()> {
        let channel = self
            .channel_id
            .as_deref()
            .ok_or_else(|| MessagingError::Config("DISCORD_CHANNEL_ID not set".to_string()))?;
        let url = format!("{}/channels/{}/messages", self.api_base, channel);
        let response = self
            .client
            .post(url)
            .header("Authorization", self.bot_auth()?)
            .json(&message.to_payload())
            .send()
            .await?;
        Self::check(response).await.map(|_| ())
    }
}

/// Send without failing the caller: errors are logged and dropped.
///
/// Returns whether the message was delivered.
pub async fn deliver<M: Messenger + ?Sized>(
    messenger: &M,
    target: Delivery<'_>,
    message: &DiscordMessage,
) -> bool {
    let result = match target {
        Delivery::EditOriginal(token) => messenger.edit_original(token, message).await,
        Delivery::Followup(token) => messenger.post_followup(token, message).await,
        Delivery::Channel => messenger.post_channel(message).await,
    };
    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(delivery = target.name(), error = %e, "Discord delivery failed");
            false
        }
    }
}

/// Where a message goes.
#[derive(Debug, Clone, Copy)]
pub enum Delivery<'a> {
    EditOriginal(&'a str),
    Followup(&'a str),
    Channel,
}

impl Delivery<'_> {
    fn name(&self) -> &'static str {
        match self {
            Self::EditOriginal(_) => "edit_original",
            Self::Followup(_) => "followup",
            Self::Channel => "channel",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let msg = DiscordMessage::text("Hello, World!");
        assert_eq!(msg.text, "Hello, World!");
        assert!(msg.title.is_none());
        assert!(msg.is_plain());

        let msg = DiscordMessage::with_title("Title", "Text").success();
        assert_eq!(msg.color, Some("#28a745".to_string()));
        assert!(!msg.is_plain());

        let msg = DiscordMessage::with_title("Title", "Text").color("#5865F2").success();
        assert_eq!(msg.color, Some("#5865F2".to_string()));
    }

    #[test]
    fn test_hex_to_decimal() {
        assert_eq!(hex_to_decimal("#28a745"), Some(2664261));
        assert_eq!(hex_to_decimal("5865F2"), Some(5793266));
        assert_eq!(hex_to_decimal("nope"), None);
    }

    #[test]
    fn test_plain_payload() {
        let payload = DiscordMessage::text("Hello").to_payload();
        assert_eq!(payload["content"], "Hello");
        assert!(payload.get("embeds").is_none());
    }

    #[test]
    fn test_plain_payload_is_clipped() {
        let payload = DiscordMessage::text("x".repeat(2500)).to_payload();
        assert_eq!(payload["content"].as_str().unwrap().len(), DISCORD_MESSAGE_LIMIT);
    }

    #[test]
    fn test_card_payload() {
        let payload = DiscordMessage::with_title("Topics", "Pick one")
            .color("#5865F2")
            .add_field("1️⃣ LOFI", "Trend: 80/100", false)
            .to_payload();

        let embed = &payload["embeds"][0];
        assert_eq!(embed["title"], "Topics");
        assert_eq!(embed["description"], "Pick one");
        assert_eq!(embed["color"], 5793266);
        assert_eq!(embed["fields"][0]["name"], "1️⃣ LOFI");
        assert_eq!(payload["content"], "");
    }

    #[test]
    fn test_card_fields_clipped() {
        let mut msg = DiscordMessage::with_title("t", "d");
        for i in 0..30 {
            msg = msg.add_field(format!("f{i}"), "v".repeat(2000), false);
        }
        let payload = msg.to_payload();
        let fields = payload["embeds"][0]["fields"].as_array().unwrap();
        assert_eq!(fields.len(), MAX_FIELDS);
        assert_eq!(fields[0]["value"].as_str().unwrap().len(), FIELD_VALUE_LIMIT);
    }

    #[test]
    fn test_command_payloads() {
        let commands = default_commands();
        assert_eq!(commands.len(), 3);

        let outlines = commands[1].to_payload();
        assert_eq!(outlines["name"], "outlines");
        assert_eq!(outlines["type"], 1);
        assert_eq!(outlines["options"][0]["name"], "topic");
        assert_eq!(outlines["options"][0]["type"], 3);

        let draft = commands[2].to_payload();
        assert_eq!(draft["type"], 3);
        assert!(draft.get("description").is_none());
    }

    #[test]
    fn test_client_requires_app_id() {
        let client = DiscordClient::new(&DiscordConfig::default()).unwrap();
        assert!(matches!(client.webhook_url("tok"), Err(MessagingError::Config(_))));
        assert!(matches!(client.bot_auth(), Err(MessagingError::Config(_))));
    }
}
