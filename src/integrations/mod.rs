//! External integrations module.
//!
//! Adapters for the services the bot talks to: Discord (inbound
//! interactions, outbound REST), the SerpAPI search provider, and the
//! HTTP surface that receives Discord's requests.

pub mod api;
pub mod discord;
pub mod interactions;
pub mod search;

pub use api::{router, serve, ApiError, ApiResult, ApiState, FollowupRequest, FollowupResponse};
pub use discord::{
    default_commands, CommandSpec, DiscordClient, DiscordMessage, MessageField, MessagingError,
    MessagingResult, Messenger,
};
pub use interactions::{Interaction, InteractionResponse, SignatureError, SignatureVerifier};
pub use search::{
    OrganicResult, SearchError, SearchProvider, SearchResult, SearchResults, SerpApiClient,
};
