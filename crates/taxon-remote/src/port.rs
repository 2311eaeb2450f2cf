//! Remote port
//!
//! Every platform interaction the engine performs goes through this trait.
//! Implementations may sit on a typed SDK or on raw REST calls; the engine
//! cannot tell the difference.

use crate::error::RemoteError;
use taxon_model::{
    CategoryId, ChannelId, ChannelMember, NewChannel, NewSidebarCategory, RemoteChannel,
    RemoteUser, SidebarCategory, TeamId, UserId,
};

/// Capability set consumed from the chat platform
///
/// Lookups that miss must return [`RemoteError::NotFound`]; callers rely on
/// that to tell "absent" from "unreachable".
#[async_trait::async_trait]
pub trait RemotePort: Send + Sync {
    /// Fetch a user by id
    async fn get_user(&self, user_id: &UserId) -> Result<RemoteUser, RemoteError>;

    /// Fetch a user by username
    async fn get_user_by_username(&self, username: &str) -> Result<RemoteUser, RemoteError>;

    /// One page of team members. An empty page marks the end.
    async fn get_users_in_team(
        &self,
        team_id: &TeamId,
        page: usize,
        per_page: usize,
    ) -> Result<Vec<RemoteUser>, RemoteError>;

    /// One page of the team's public channels. An empty page marks the end.
    async fn get_public_channels_for_team(
        &self,
        team_id: &TeamId,
        page: usize,
        per_page: usize,
    ) -> Result<Vec<RemoteChannel>, RemoteError>;

    /// Fetch a channel by its URL name within a team
    async fn get_channel_by_name(
        &self,
        team_id: &TeamId,
        name: &str,
    ) -> Result<RemoteChannel, RemoteError>;

    /// Create a channel
    async fn create_channel(&self, channel: &NewChannel) -> Result<RemoteChannel, RemoteError>;

    /// Fetch a membership; `NotFound` when the user is not a member
    async fn get_channel_member(
        &self,
        channel_id: &ChannelId,
        user_id: &UserId,
    ) -> Result<ChannelMember, RemoteError>;

    /// Add a user to a channel
    async fn add_channel_member(
        &self,
        channel_id: &ChannelId,
        user_id: &UserId,
    ) -> Result<ChannelMember, RemoteError>;

    /// The user's sidebar categories for a team, in sidebar order
    async fn get_sidebar_categories(
        &self,
        user_id: &UserId,
        team_id: &TeamId,
    ) -> Result<Vec<SidebarCategory>, RemoteError>;

    /// Create a sidebar category
    async fn create_sidebar_category(
        &self,
        user_id: &UserId,
        team_id: &TeamId,
        category: &NewSidebarCategory,
    ) -> Result<SidebarCategory, RemoteError>;

    /// Update several categories in one call; all or nothing
    async fn update_sidebar_categories(
        &self,
        user_id: &UserId,
        team_id: &TeamId,
        categories: &[SidebarCategory],
    ) -> Result<Vec<SidebarCategory>, RemoteError>;

    /// Delete one sidebar category
    async fn delete_sidebar_category(
        &self,
        user_id: &UserId,
        team_id: &TeamId,
        category_id: &CategoryId,
    ) -> Result<(), RemoteError>;

    /// Replace the category order with the given id sequence
    async fn set_category_order(
        &self,
        user_id: &UserId,
        team_id: &TeamId,
        order: &[CategoryId],
    ) -> Result<(), RemoteError>;
}
