//! HTTP backend over the platform REST API (`/api/v4`)
//!
//! Status mapping:
//! - `404` becomes [`RemoteError::NotFound`]
//! - any other non-2xx becomes [`RemoteError::Rejected`], carrying the
//!   platform's `message` field when the body has one
//!
//! Nothing is retried here; a failed call surfaces immediately.

use crate::error::RemoteError;
use crate::port::RemotePort;
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use taxon_model::{
    CategoryId, ChannelId, ChannelMember, NewChannel, NewSidebarCategory, RemoteChannel,
    RemoteUser, SidebarCategory, TeamId, UserId,
};

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Longest slice of a non-JSON error body kept in a rejection message
const MAX_ERROR_BODY: usize = 200;

/// Connection settings for [`HttpRemote`]
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Server root, e.g. `http://localhost:8065`
    pub server_url: String,
    /// Personal access or bot token
    pub token: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl HttpConfig {
    /// Settings with the default timeout
    #[must_use]
    pub fn new(server_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            token: token.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// With request timeout
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Platform error body
#[derive(Debug, Deserialize)]
struct PlatformError {
    message: String,
}

/// Body of the sidebar categories endpoint
#[derive(Debug, Deserialize)]
struct OrderedCategories {
    categories: Vec<SidebarCategory>,
    #[serde(default)]
    order: Vec<CategoryId>,
}

/// [`RemotePort`] backed by the platform REST API
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: reqwest::Client,
    base_url: Url,
    token: String,
}

impl HttpRemote {
    /// Build a client for the configured server
    ///
    /// # Errors
    /// `RemoteError::Transport` if the server URL is not a valid base URL or
    /// the underlying client cannot be built
    pub fn new(config: HttpConfig) -> Result<Self, RemoteError> {
        let base_url = Url::parse(&config.server_url)
            .map_err(|e| RemoteError::Transport(format!("invalid server url {}: {e}", config.server_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(RemoteError::Transport(format!(
                "invalid server url {}: cannot hold a path",
                config.server_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("taxon/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            token: config.token,
        })
    }

    /// `{server}/api/v4/{segments}` with every segment percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(["api", "v4"]).extend(segments);
        }
        url
    }

    fn categories_endpoint(&self, user_id: &UserId, team_id: &TeamId, rest: &[&str]) -> Url {
        let mut segments = vec![
            "users",
            user_id.as_str(),
            "teams",
            team_id.as_str(),
            "channels",
            "categories",
        ];
        segments.extend_from_slice(rest);
        self.endpoint(&segments)
    }

    /// Send a request and return the raw body of a 2xx response
    async fn execute(
        &self,
        request: RequestBuilder,
        entity: &'static str,
        key: &str,
    ) -> Result<Vec<u8>, RemoteError> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        if status == StatusCode::NOT_FOUND {
            return Err(RemoteError::not_found(entity, key));
        }
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), entity, key, "platform rejected request");
            return Err(rejection(status.as_u16(), &body));
        }

        Ok(body.to_vec())
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        entity: &'static str,
        key: &str,
    ) -> Result<T, RemoteError> {
        let body = self.execute(request, entity, key).await?;
        decode(&body)
    }
}

/// Build a rejection from a platform error body
fn rejection(status: u16, body: &[u8]) -> RemoteError {
    let message = match serde_json::from_slice::<PlatformError>(body) {
        Ok(err) => err.message,
        Err(_) => {
            let text = String::from_utf8_lossy(body);
            text.chars().take(MAX_ERROR_BODY).collect()
        }
    };
    RemoteError::rejected(status, message)
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, RemoteError> {
    serde_json::from_slice(body).map_err(|e| RemoteError::Decode(e.to_string()))
}

/// Arrange categories by the platform's explicit order list.
///
/// Categories missing from the list keep their relative order at the end.
fn arrange(mut categories: Vec<SidebarCategory>, order: &[CategoryId]) -> Vec<SidebarCategory> {
    if order.is_empty() {
        return categories;
    }
    categories.sort_by_key(|c| {
        order
            .iter()
            .position(|id| *id == c.id)
            .unwrap_or(usize::MAX)
    });
    categories
}

#[async_trait::async_trait]
impl RemotePort for HttpRemote {
    async fn get_user(&self, user_id: &UserId) -> Result<RemoteUser, RemoteError> {
        let request = self.client.get(self.endpoint(&["users", user_id.as_str()]));
        self.fetch(request, "user", user_id.as_str()).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<RemoteUser, RemoteError> {
        let request = self
            .client
            .get(self.endpoint(&["users", "username", username]));
        self.fetch(request, "user", username).await
    }

    async fn get_users_in_team(
        &self,
        team_id: &TeamId,
        page: usize,
        per_page: usize,
    ) -> Result<Vec<RemoteUser>, RemoteError> {
        let request = self
            .client
            .get(self.endpoint(&["users"]))
            .query(&[("in_team", team_id.as_str())])
            .query(&[("page", page), ("per_page", per_page)]);
        self.fetch(request, "team", team_id.as_str()).await
    }

    async fn get_public_channels_for_team(
        &self,
        team_id: &TeamId,
        page: usize,
        per_page: usize,
    ) -> Result<Vec<RemoteChannel>, RemoteError> {
        let request = self
            .client
            .get(self.endpoint(&["teams", team_id.as_str(), "channels"]))
            .query(&[("page", page), ("per_page", per_page)]);
        self.fetch(request, "team", team_id.as_str()).await
    }

    async fn get_channel_by_name(
        &self,
        team_id: &TeamId,
        name: &str,
    ) -> Result<RemoteChannel, RemoteError> {
        let request = self
            .client
            .get(self.endpoint(&["teams", team_id.as_str(), "channels", "name", name]));
        self.fetch(request, "channel", name).await
    }

    async fn create_channel(&self, channel: &NewChannel) -> Result<RemoteChannel, RemoteError> {
        let request = self.client.post(self.endpoint(&["channels"])).json(channel);
        self.fetch(request, "team", channel.team_id.as_str()).await
    }

    async fn get_channel_member(
        &self,
        channel_id: &ChannelId,
        user_id: &UserId,
    ) -> Result<ChannelMember, RemoteError> {
        let request = self.client.get(self.endpoint(&[
            "channels",
            channel_id.as_str(),
            "members",
            user_id.as_str(),
        ]));
        self.fetch(request, "channel member", user_id.as_str()).await
    }

    async fn add_channel_member(
        &self,
        channel_id: &ChannelId,
        user_id: &UserId,
    ) -> Result<ChannelMember, RemoteError> {
        let request = self
            .client
            .post(self.endpoint(&["channels", channel_id.as_str(), "members"]))
            .json(&serde_json::json!({ "user_id": user_id }));
        self.fetch(request, "channel", channel_id.as_str()).await
    }

    async fn get_sidebar_categories(
        &self,
        user_id: &UserId,
        team_id: &TeamId,
    ) -> Result<Vec<SidebarCategory>, RemoteError> {
        let request = self
            .client
            .get(self.categories_endpoint(user_id, team_id, &[]));
        let body: OrderedCategories = self.fetch(request, "user", user_id.as_str()).await?;
        Ok(arrange(body.categories, &body.order))
    }

    async fn create_sidebar_category(
        &self,
        user_id: &UserId,
        team_id: &TeamId,
        category: &NewSidebarCategory,
    ) -> Result<SidebarCategory, RemoteError> {
        let request = self
            .client
            .post(self.categories_endpoint(user_id, team_id, &[]))
            .json(category);
        self.fetch(request, "user", user_id.as_str()).await
    }

    async fn update_sidebar_categories(
        &self,
        user_id: &UserId,
        team_id: &TeamId,
        categories: &[SidebarCategory],
    ) -> Result<Vec<SidebarCategory>, RemoteError> {
        let request = self
            .client
            .put(self.categories_endpoint(user_id, team_id, &[]))
            .json(categories);
        self.fetch(request, "user", user_id.as_str()).await
    }

    async fn delete_sidebar_category(
        &self,
        user_id: &UserId,
        team_id: &TeamId,
        category_id: &CategoryId,
    ) -> Result<(), RemoteError> {
        let request = self
            .client
            .delete(self.categories_endpoint(user_id, team_id, &[category_id.as_str()]));
        self.execute(request, "category", category_id.as_str())
            .await
            .map(|_| ())
    }

    async fn set_category_order(
        &self,
        user_id: &UserId,
        team_id: &TeamId,
        order: &[CategoryId],
    ) -> Result<(), RemoteError> {
        let request = self
            .client
            .put(self.categories_endpoint(user_id, team_id, &["order"]))
            .json(order);
        self.execute(request, "user", user_id.as_str())
            .await
            .map(|_| ())
    }
}
