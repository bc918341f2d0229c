//! Thin REST client for the endpoints that seed a live chat session.
//!
//! The chat core never calls these itself; a caller fetches the group detail
//! (backlog) and the authenticated profile (identity), then hands both to
//! [`ChatSession::spawn`](crate::chat::ChatSession::spawn) via
//! [`SessionConfig`]. No retries, no caching; a bearer token obtained
//! elsewhere is passed per call.

mod types;

pub use types::{GroupMessages, StudyGroup, UserProfile};

use serde::de::DeserializeOwned;

use crate::chat::{ChatMessage, SessionConfig};
use crate::error::{ChatError, Result};
use crate::ChatConfig;

/// Client for the Learnify REST backend.
#[derive(Clone, Debug)]
pub struct LearnifyApi {
    base_url: String,
    client: reqwest::Client,
}

impl LearnifyApi {
    pub fn new(config: &ChatConfig) -> Self {
        Self {
            base_url: config.api_base_url.clone(),
            client: reqwest::Client::new(),
        }
    }

    /// Fetch the authenticated user's profile (`GET /auth/me`).
    pub async fn fetch_current_user(&self, token: &str) -> Result<UserProfile> {
        let response = self
            .client
            .get(format!("{}/auth/me", self.base_url))
            .bearer_auth(token)
            .send()
            .await?;

        Self::into_json(response).await
    }

    /// Fetch a study group with its chat backlog
    /// (`GET /study-groups/{group_id}`).
    pub async fn fetch_group(&self, group_id: &str) -> Result<StudyGroup> {
        let response = self
            .client
            .get(format!("{}/study-groups/{}", self.base_url, group_id))
            .send()
            .await?;

        Self::into_json(response).await
    }

    /// Fetch a bounded message backlog
    /// (`GET /study-groups/{group_id}/messages?limit=N`). The server defaults
    /// the limit to 50 when none is given.
    pub async fn fetch_group_messages(
        &self,
        group_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<ChatMessage>> {
        let mut request = self.client.get(format!(
            "{}/study-groups/{}/messages",
            self.base_url, group_id
        ));
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }

        let envelope: GroupMessages = Self::into_json(request.send().await?).await?;
        Ok(envelope.messages)
    }

    /// Assemble the construction parameters for a live session: backlog from
    /// the group detail call, identity from the profile call. Without a token
    /// the resulting session is read-only.
    pub async fn seed_session(
        &self,
        group_id: &str,
        token: Option<&str>,
    ) -> Result<SessionConfig> {
        let group = self.fetch_group(group_id).await?;

        let mut session = SessionConfig {
            group_id: group.group_id().unwrap_or(group_id).to_string(),
            initial_messages: group.chat,
            current_user_id: None,
            current_user_name: None,
        };

        if let Some(token) = token {
            let profile = self.fetch_current_user(token).await?;
            session.current_user_id = profile.user_id().map(str::to_string);
            session.current_user_name = profile.display_name().map(str::to_string);
        }

        Ok(session)
    }

    async fn into_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                target: "learnify_chat::api",
                "Request failed with status {}: {}",
                status,
                body
            );
            return Err(ChatError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<T>().await?)
    }
}
