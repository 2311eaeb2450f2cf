//! Remote platform entities
//!
//! Field names and enum tags follow the platform's JSON wire format so the
//! same types serve the HTTP backend and in-memory fakes.

use crate::ids::{CategoryId, ChannelId, TeamId, UserId};
use serde::{Deserialize, Serialize};

/// Channel visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelKind {
    /// Public channel, joinable by any team member
    #[serde(rename = "O")]
    Open,
    /// Private channel, invitation only
    #[serde(rename = "P")]
    Private,
}

/// A channel as the platform reports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteChannel {
    /// Platform channel id
    pub id: ChannelId,
    /// Owning team
    pub team_id: TeamId,
    /// URL name, derived from the display name on creation
    pub name: String,
    /// Name shown in the sidebar; the taxonomy refers to channels by it
    pub display_name: String,
    /// Visibility
    #[serde(rename = "type")]
    pub kind: ChannelKind,
}

/// Channel creation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewChannel {
    /// Team to create the channel in
    pub team_id: TeamId,
    /// URL name
    pub name: String,
    /// Name shown in the sidebar
    pub display_name: String,
    /// Visibility
    #[serde(rename = "type")]
    pub kind: ChannelKind,
}

impl NewChannel {
    /// Public channel named after its display name
    #[must_use]
    pub fn open(team_id: TeamId, display_name: impl Into<String>) -> Self {
        let display_name = display_name.into();
        Self {
            team_id,
            name: crate::naming::channel_name(&display_name),
            display_name,
            kind: ChannelKind::Open,
        }
    }
}

/// A platform user. Only `id` drives reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteUser {
    /// Platform user id
    pub id: UserId,
    /// Login name
    pub username: String,
    /// Space separated role names
    #[serde(default)]
    pub roles: String,
}

/// Channel membership record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMember {
    /// Channel the user belongs to
    pub channel_id: ChannelId,
    /// Member
    pub user_id: UserId,
}

/// Sidebar category type
///
/// The three non-custom kinds are created by the platform for every user
/// and can never be deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    /// Created by or for the user
    Custom,
    /// Built-in "Favorites"
    Favorites,
    /// Built-in "Channels", where joined channels land by default
    Channels,
    /// Built-in "Direct Messages"
    DirectMessages,
}

impl CategoryKind {
    /// Built-in platform category
    #[inline]
    #[must_use]
    pub fn is_system(self) -> bool {
        !matches!(self, Self::Custom)
    }
}

/// How the platform sorts channels inside a category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategorySorting {
    /// Platform default for the category type
    #[default]
    #[serde(rename = "")]
    Default,
    /// Order of `channel_ids`
    #[serde(rename = "manual")]
    Manual,
    /// By display name
    #[serde(rename = "alpha")]
    Alphabetical,
    /// Most recent activity first
    #[serde(rename = "recent")]
    Recent,
}

/// A user's sidebar category within one team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidebarCategory {
    /// Platform category id
    pub id: CategoryId,
    /// Owner
    pub user_id: UserId,
    /// Team the sidebar belongs to
    pub team_id: TeamId,
    /// Name shown in the sidebar; matched exactly against declared names
    pub display_name: String,
    /// Custom or built-in
    #[serde(rename = "type")]
    pub kind: CategoryKind,
    /// Position in the sidebar, lower first
    #[serde(default)]
    pub sort_order: i64,
    /// Channel sorting inside the category
    #[serde(default)]
    pub sorting: CategorySorting,
    /// Whether the category is muted
    #[serde(default)]
    pub muted: bool,
    /// Whether the category is collapsed
    #[serde(default)]
    pub collapsed: bool,
    /// Channel ids in sidebar order
    #[serde(default)]
    pub channel_ids: Vec<ChannelId>,
}

impl SidebarCategory {
    /// Whether the category already lists a channel
    #[inline]
    #[must_use]
    pub fn contains_channel(&self, channel_id: &ChannelId) -> bool {
        self.channel_ids.contains(channel_id)
    }

    /// Same category carrying a different channel list
    #[must_use]
    pub fn with_channels(&self, channel_ids: Vec<ChannelId>) -> Self {
        Self {
            channel_ids,
            ..self.clone()
        }
    }
}

/// Sidebar category creation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSidebarCategory {
    /// Owner
    pub user_id: UserId,
    /// Team the sidebar belongs to
    pub team_id: TeamId,
    /// Name shown in the sidebar
    pub display_name: String,
    /// Always `Custom` for categories the engine creates
    #[serde(rename = "type")]
    pub kind: CategoryKind,
    /// Initial channels
    #[serde(default)]
    pub channel_ids: Vec<ChannelId>,
}

impl NewSidebarCategory {
    /// Empty custom category owned by `user_id`
    #[must_use]
    pub fn custom(user_id: UserId, team_id: TeamId, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            team_id,
            display_name: display_name.into(),
            kind: CategoryKind::Custom,
            channel_ids: Vec::new(),
        }
    }
}
