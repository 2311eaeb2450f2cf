//! Remote state retrieval
//!
//! Listings page transparently: pages are requested from 0 upwards until
//! one comes back empty. Any failing page discards everything fetched so far
//! and surfaces as [`ReconcileError::RemoteUnavailable`]; the engine never
//! reconciles against a partial view.

use crate::config::EngineConfig;
use crate::error::ReconcileError;
use std::future::Future;
use taxon_model::{channel_name, RemoteChannel, RemoteUser, SidebarCategory, TeamId, UserId};
use taxon_remote::{RemoteError, RemotePort};

/// Drain a paged listing into one collection
async fn collect_pages<T, F, Fut>(what: &'static str, mut fetch_page: F) -> Result<Vec<T>, ReconcileError>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Vec<T>, RemoteError>>,
{
    let mut items = Vec::new();

    for page in 0.. {
        let batch = fetch_page(page).await.map_err(|source| {
            tracing::error!(what, page, error = %source, "page request failed, discarding partial listing");
            ReconcileError::unavailable(what, source)
        })?;

        if batch.is_empty() {
            break;
        }
        tracing::debug!(what, page, count = batch.len(), "fetched page");
        items.extend(batch);
    }

    Ok(items)
}

/// Reads channels, members and sidebar categories from the platform
#[derive(Clone, Copy)]
pub struct RemoteStateFetcher<'a> {
    port: &'a dyn RemotePort,
    config: &'a EngineConfig,
}

impl<'a> RemoteStateFetcher<'a> {
    /// Create a fetcher over `port`
    #[must_use]
    pub fn new(port: &'a dyn RemotePort, config: &'a EngineConfig) -> Self {
        Self { port, config }
    }

    /// Every public channel of the team, in platform order
    ///
    /// # Errors
    /// `RemoteUnavailable` when any page request fails
    pub async fn list_channels(&self, team_id: &TeamId) -> Result<Vec<RemoteChannel>, ReconcileError> {
        let per_page = self.config.channel_page_size;
        collect_pages("public channels", |page| {
            self.port.get_public_channels_for_team(team_id, page, per_page)
        })
        .await
    }

    /// Every member of the team
    ///
    /// # Errors
    /// `RemoteUnavailable` when any page request fails
    pub async fn list_team_members(&self, team_id: &TeamId) -> Result<Vec<RemoteUser>, ReconcileError> {
        let per_page = self.config.member_page_size;
        collect_pages("team members", |page| {
            self.port.get_users_in_team(team_id, page, per_page)
        })
        .await
    }

    /// The user's sidebar categories in sidebar order
    ///
    /// The platform returns them in a single response.
    ///
    /// # Errors
    /// `RemoteUnavailable` when the request fails
    pub async fn sidebar_categories(
        &self,
        user_id: &UserId,
        team_id: &TeamId,
    ) -> Result<Vec<SidebarCategory>, ReconcileError> {
        let categories = self
            .port
            .get_sidebar_categories(user_id, team_id)
            .await
            .map_err(|source| {
                tracing::error!(user = %user_id, team = %team_id, error = %source, "sidebar category fetch failed");
                ReconcileError::unavailable("sidebar categories", source)
            })?;

        tracing::debug!(user = %user_id, count = categories.len(), "fetched sidebar categories");
        Ok(categories)
    }

    /// Public channels of the team the user is a member of
    ///
    /// Membership is checked channel by channel.
    ///
    /// # Errors
    /// `RemoteUnavailable` when the listing or a membership check fails
    pub async fn subscribed_public_channels(
        &self,
        user_id: &UserId,
        team_id: &TeamId,
    ) -> Result<Vec<RemoteChannel>, ReconcileError> {
        let mut subscribed = Vec::new();

        for channel in self.list_channels(team_id).await? {
            match self.port.get_channel_member(&channel.id, user_id).await {
                Ok(_) => subscribed.push(channel),
                Err(e) if e.is_not_found() => {}
                Err(source) => {
                    return Err(ReconcileError::unavailable("channel membership", source));
                }
            }
        }

        Ok(subscribed)
    }

    /// Look up a channel by display name
    ///
    /// # Errors
    /// The port's error unchanged; `NotFound` when no channel carries the
    /// derived name.
    pub async fn resolve_channel(
        &self,
        team_id: &TeamId,
        display_name: &str,
    ) -> Result<RemoteChannel, RemoteError> {
        self.port
            .get_channel_by_name(team_id, &channel_name(display_name))
            .await
    }
}
