//! In-memory chat platform
//!
//! Models the platform behaviour reconciliation depends on:
//! - categories come back sorted by sort order (ties keep insertion order)
//! - a channel sits in exactly one category per user; listing it in another
//!   category moves it
//! - joining a channel files it under the `Channels` system category
//! - batch category updates are all or nothing
//! - system categories cannot be deleted
//!
//! Faults can be injected per operation, and every mutating call is
//! journaled so tests can assert what the engine actually sent.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use taxon_model::{
    channel_name, CategoryId, CategoryKind, CategorySorting, ChannelId, ChannelKind,
    ChannelMember, NewChannel, NewSidebarCategory, RemoteChannel, RemoteUser, SidebarCategory,
    TeamId, UserId,
};
use taxon_remote::{RemoteError, RemotePort};

/// Injected failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Public channel listing fails at this page
    ChannelPage(usize),
    /// Team member listing fails at this page
    MemberPage(usize),
    /// Every sidebar category fetch fails
    CategoryFetch,
    /// Sidebar category fetches fail once this many have succeeded
    CategoryFetchAfter(usize),
    /// Sidebar category fetches fail for this user only
    CategoryFetchFor(UserId),
    /// Joining the channel with this display name is rejected
    JoinChannel(String),
    /// Creating a category with this display name is rejected
    CreateCategory(String),
    /// Every batch category update is rejected
    UpdateCategories,
    /// Deleting the category with this display name is rejected
    DeleteCategory(String),
    /// Creating the channel with this display name is rejected
    CreateChannel(String),
    /// Looking up the channel with this display name times out
    ChannelLookup(String),
}

/// Journaled mutating call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    AddMember { channel: String, user: UserId },
    CreateChannel { display_name: String },
    CreateCategory { display_name: String },
    /// Display names of the submitted categories, in submission order
    UpdateCategories { display_names: Vec<String> },
    DeleteCategory { display_name: String },
    SetCategoryOrder { ids: Vec<CategoryId> },
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    users: Vec<RemoteUser>,
    channels: Vec<RemoteChannel>,
    members: HashSet<(ChannelId, UserId)>,
    sidebars: HashMap<(UserId, TeamId), Vec<SidebarCategory>>,
    faults: Vec<Fault>,
    category_fetches: usize,
    journal: Vec<Call>,
}

impl Inner {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn has_fault(&self, fault: &Fault) -> bool {
        self.faults.contains(fault)
    }

    fn sidebar(&mut self, user_id: &UserId, team_id: &TeamId) -> &mut Vec<SidebarCategory> {
        let key = (user_id.clone(), team_id.clone());
        if !self.sidebars.contains_key(&key) {
            let defaults = [
                ("Favorites", CategoryKind::Favorites, 0),
                ("Channels", CategoryKind::Channels, 10),
                ("Direct Messages", CategoryKind::DirectMessages, 20),
            ]
            .into_iter()
            .map(|(name, kind, sort_order)| SidebarCategory {
                id: CategoryId::new(self.next_id("cat")),
                user_id: user_id.clone(),
                team_id: team_id.clone(),
                display_name: name.to_string(),
                kind,
                sort_order,
                sorting: CategorySorting::Default,
                muted: false,
                collapsed: false,
                channel_ids: Vec::new(),
            })
            .collect();
            self.sidebars.insert(key.clone(), defaults);
        }
        self.sidebars.entry(key).or_default()
    }

    fn channel(&self, channel_id: &ChannelId) -> Option<&RemoteChannel> {
        self.channels.iter().find(|c| c.id == *channel_id)
    }

    fn display_name(&self, channel_id: &ChannelId) -> String {
        self.channel(channel_id)
            .map_or_else(|| channel_id.to_string(), |c| c.display_name.clone())
    }

    fn join(&mut self, channel_id: &ChannelId, user_id: &UserId) {
        self.members.insert((channel_id.clone(), user_id.clone()));

        let Some(team_id) = self.channel(channel_id).map(|c| c.team_id.clone()) else {
            return;
        };
        let sidebar = self.sidebar(user_id, &team_id);
        if sidebar.iter().any(|c| c.contains_channel(channel_id)) {
            return;
        }
        if let Some(channels) = sidebar.iter_mut().find(|c| c.kind == CategoryKind::Channels) {
            channels.channel_ids.push(channel_id.clone());
        }
    }
}

/// Sort categories the way the platform returns them
fn sorted(categories: &[SidebarCategory]) -> Vec<SidebarCategory> {
    let mut categories = categories.to_vec();
    categories.sort_by_key(|c| c.sort_order);
    categories
}

fn page<T: Clone>(items: &[T], page: usize, per_page: usize) -> Vec<T> {
    items
        .iter()
        .skip(page.saturating_mul(per_page))
        .take(per_page)
        .cloned()
        .collect()
}

/// In-memory platform implementing [`RemotePort`]
#[derive(Debug)]
pub struct FakePlatform {
    team_id: TeamId,
    inner: Mutex<Inner>,
}

impl FakePlatform {
    /// Empty platform hosting one team
    pub fn new(team_id: impl Into<TeamId>) -> Self {
        Self {
            team_id: team_id.into(),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// The hosted team
    pub fn team_id(&self) -> &TeamId {
        &self.team_id
    }

    /// Register a team member with default sidebar categories
    pub fn add_user(&self, username: &str) -> RemoteUser {
        let mut inner = self.inner.lock();
        let user = RemoteUser {
            id: UserId::new(inner.next_id("user")),
            username: username.to_string(),
            roles: "system_user".to_string(),
        };
        inner.sidebar(&user.id, &self.team_id);
        inner.users.push(user.clone());
        user
    }

    /// Create a public channel in the team
    pub fn add_channel(&self, display_name: &str) -> RemoteChannel {
        self.insert_channel(display_name, ChannelKind::Open)
    }

    /// Create a private channel in the team
    pub fn add_private_channel(&self, display_name: &str) -> RemoteChannel {
        self.insert_channel(display_name, ChannelKind::Private)
    }

    fn insert_channel(&self, display_name: &str, kind: ChannelKind) -> RemoteChannel {
        let mut inner = self.inner.lock();
        let channel = RemoteChannel {
            id: ChannelId::new(inner.next_id("ch")),
            team_id: self.team_id.clone(),
            name: channel_name(display_name),
            display_name: display_name.to_string(),
            kind,
        };
        inner.channels.push(channel.clone());
        channel
    }

    /// Make `user_id` a member of a channel without journaling
    pub fn join(&self, channel_id: &ChannelId, user_id: &UserId) {
        self.inner.lock().join(channel_id, user_id);
    }

    /// Create a custom category directly, without journaling
    pub fn add_category(
        &self,
        user_id: &UserId,
        display_name: &str,
        channel_ids: Vec<ChannelId>,
    ) -> SidebarCategory {
        let mut inner = self.inner.lock();
        let id = CategoryId::new(inner.next_id("cat"));
        let sidebar = inner.sidebar(user_id, &self.team_id);
        let sort_order = sidebar.iter().map(|c| c.sort_order).max().unwrap_or(0) + 10;
        for category in sidebar.iter_mut() {
            category.channel_ids.retain(|c| !channel_ids.contains(c));
        }
        let category = SidebarCategory {
            id,
            user_id: user_id.clone(),
            team_id: self.team_id.clone(),
            display_name: display_name.to_string(),
            kind: CategoryKind::Custom,
            sort_order,
            sorting: CategorySorting::Default,
            muted: false,
            collapsed: false,
            channel_ids,
        };
        sidebar.push(category.clone());
        category
    }

    /// Inject a failure
    pub fn inject(&self, fault: Fault) {
        self.inner.lock().faults.push(fault);
    }

    /// Remove every injected failure
    pub fn clear_faults(&self) {
        self.inner.lock().faults.clear();
    }

    /// Journaled mutating calls, oldest first
    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().journal.clone()
    }

    /// Forget journaled calls
    pub fn clear_calls(&self) {
        self.inner.lock().journal.clear();
    }

    /// Number of journaled calls matching `predicate`
    pub fn count_calls(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.inner.lock().journal.iter().filter(|c| predicate(c)).count()
    }

    /// The user's categories as the platform would return them
    pub fn categories(&self, user_id: &UserId) -> Vec<SidebarCategory> {
        let mut inner = self.inner.lock();
        sorted(inner.sidebar(user_id, &self.team_id))
    }

    /// One of the user's categories by display name
    pub fn category(&self, user_id: &UserId, display_name: &str) -> Option<SidebarCategory> {
        self.categories(user_id)
            .into_iter()
            .find(|c| c.display_name == display_name)
    }

    /// Display names of the channels in one of the user's categories
    pub fn category_channel_names(&self, user_id: &UserId, display_name: &str) -> Vec<String> {
        let Some(category) = self.category(user_id, display_name) else {
            return Vec::new();
        };
        let inner = self.inner.lock();
        category
            .channel_ids
            .iter()
            .map(|id| inner.display_name(id))
            .collect()
    }

    /// Whether the user is a member of the channel
    pub fn is_member(&self, channel_id: &ChannelId, user_id: &UserId) -> bool {
        self.inner
            .lock()
            .members
            .contains(&(channel_id.clone(), user_id.clone()))
    }

    /// Look up a channel by display name
    pub fn channel_by_display_name(&self, display_name: &str) -> Option<RemoteChannel> {
        self.inner
            .lock()
            .channels
            .iter()
            .find(|c| c.display_name == display_name)
            .cloned()
    }
}

#[async_trait::async_trait]
impl RemotePort for FakePlatform {
    async fn get_user(&self, user_id: &UserId) -> Result<RemoteUser, RemoteError> {
        self.inner
            .lock()
            .users
            .iter()
            .find(|u| u.id == *user_id)
            .cloned()
            .ok_or_else(|| RemoteError::not_found("user", user_id.as_str()))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<RemoteUser, RemoteError> {
        self.inner
            .lock()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned()
            .ok_or_else(|| RemoteError::not_found("user", username))
    }

    async fn get_users_in_team(
        &self,
        team_id: &TeamId,
        page_index: usize,
        per_page: usize,
    ) -> Result<Vec<RemoteUser>, RemoteError> {
        let inner = self.inner.lock();
        if inner.has_fault(&Fault::MemberPage(page_index)) {
            return Err(RemoteError::Transport("connection reset".into()));
        }
        if *team_id != self.team_id {
            return Ok(Vec::new());
        }
        Ok(page(&inner.users, page_index, per_page))
    }

    async fn get_public_channels_for_team(
        &self,
        team_id: &TeamId,
        page_index: usize,
        per_page: usize,
    ) -> Result<Vec<RemoteChannel>, RemoteError> {
        let inner = self.inner.lock();
        if inner.has_fault(&Fault::ChannelPage(page_index)) {
            return Err(RemoteError::Transport("connection reset".into()));
        }
        let open: Vec<_> = inner
            .channels
            .iter()
            .filter(|c| c.team_id == *team_id && c.kind == ChannelKind::Open)
            .cloned()
            .collect();
        Ok(page(&open, page_index, per_page))
    }

    async fn get_channel_by_name(
        &self,
        team_id: &TeamId,
        name: &str,
    ) -> Result<RemoteChannel, RemoteError> {
        let inner = self.inner.lock();
        let timed_out = inner
            .faults
            .iter()
            .any(|f| matches!(f, Fault::ChannelLookup(display) if channel_name(display) == name));
        if timed_out {
            return Err(RemoteError::Transport("operation timed out".into()));
        }
        inner
            .channels
            .iter()
            .find(|c| c.team_id == *team_id && c.name == name)
            .cloned()
            .ok_or_else(|| RemoteError::not_found("channel", name))
    }

    async fn create_channel(&self, channel: &NewChannel) -> Result<RemoteChannel, RemoteError> {
        let mut inner = self.inner.lock();
        inner.journal.push(Call::CreateChannel {
            display_name: channel.display_name.clone(),
        });
        if inner.has_fault(&Fault::CreateChannel(channel.display_name.clone())) {
            return Err(RemoteError::rejected(500, "channel creation failed"));
        }
        if inner
            .channels
            .iter()
            .any(|c| c.team_id == channel.team_id && c.name == channel.name)
        {
            return Err(RemoteError::rejected(
                400,
                "A channel with that name already exists on the same team.",
            ));
        }
        let created = RemoteChannel {
            id: ChannelId::new(inner.next_id("ch")),
            team_id: channel.team_id.clone(),
            name: channel.name.clone(),
            display_name: channel.display_name.clone(),
            kind: channel.kind,
        };
        inner.channels.push(created.clone());
        Ok(created)
    }

    async fn get_channel_member(
        &self,
        channel_id: &ChannelId,
        user_id: &UserId,
    ) -> Result<ChannelMember, RemoteError> {
        let inner = self.inner.lock();
        if inner
            .members
            .contains(&(channel_id.clone(), user_id.clone()))
        {
            Ok(ChannelMember {
                channel_id: channel_id.clone(),
                user_id: user_id.clone(),
            })
        } else {
            Err(RemoteError::not_found("channel member", user_id.as_str()))
        }
    }

    async fn add_channel_member(
        &self,
        channel_id: &ChannelId,
        user_id: &UserId,
    ) -> Result<ChannelMember, RemoteError> {
        let mut inner = self.inner.lock();
        let display_name = inner.display_name(channel_id);
        inner.journal.push(Call::AddMember {
            channel: display_name.clone(),
            user: user_id.clone(),
        });
        if inner.has_fault(&Fault::JoinChannel(display_name)) {
            return Err(RemoteError::rejected(403, "permission denied"));
        }
        if inner.channel(channel_id).is_none() {
            return Err(RemoteError::not_found("channel", channel_id.as_str()));
        }
        inner.join(channel_id, user_id);
        Ok(ChannelMember {
            channel_id: channel_id.clone(),
            user_id: user_id.clone(),
        })
    }

    async fn get_sidebar_categories(
        &self,
        user_id: &UserId,
        team_id: &TeamId,
    ) -> Result<Vec<SidebarCategory>, RemoteError> {
        let mut inner = self.inner.lock();
        let exhausted = inner
            .faults
            .iter()
            .any(|f| matches!(f, Fault::CategoryFetchAfter(n) if inner.category_fetches >= *n));
        if inner.has_fault(&Fault::CategoryFetch)
            || inner.has_fault(&Fault::CategoryFetchFor(user_id.clone()))
            || exhausted
        {
            return Err(RemoteError::Transport("connection reset".into()));
        }
        inner.category_fetches += 1;
        Ok(sorted(inner.sidebar(user_id, team_id)))
    }

    async fn create_sidebar_category(
        &self,
        user_id: &UserId,
        team_id: &TeamId,
        category: &NewSidebarCategory,
    ) -> Result<SidebarCategory, RemoteError> {
        let mut inner = self.inner.lock();
        inner.journal.push(Call::CreateCategory {
            display_name: category.display_name.clone(),
        });
        if inner.has_fault(&Fault::CreateCategory(category.display_name.clone())) {
            return Err(RemoteError::rejected(400, "invalid category"));
        }
        let id = CategoryId::new(inner.next_id("cat"));
        let sidebar = inner.sidebar(user_id, team_id);
        let sort_order = sidebar.iter().map(|c| c.sort_order).max().unwrap_or(0) + 10;
        for existing in sidebar.iter_mut() {
            existing
                .channel_ids
                .retain(|c| !category.channel_ids.contains(c));
        }
        let created = SidebarCategory {
            id,
            user_id: user_id.clone(),
            team_id: team_id.clone(),
            display_name: category.display_name.clone(),
            kind: CategoryKind::Custom,
            sort_order,
            sorting: CategorySorting::Default,
            muted: false,
            collapsed: false,
            channel_ids: category.channel_ids.clone(),
        };
        sidebar.push(created.clone());
        Ok(created)
    }

    async fn update_sidebar_categories(
        &self,
        user_id: &UserId,
        team_id: &TeamId,
        categories: &[SidebarCategory],
    ) -> Result<Vec<SidebarCategory>, RemoteError> {
        let mut inner = self.inner.lock();
        inner.journal.push(Call::UpdateCategories {
            display_names: categories.iter().map(|c| c.display_name.clone()).collect(),
        });
        if inner.has_fault(&Fault::UpdateCategories) {
            return Err(RemoteError::rejected(500, "update failed"));
        }

        let sidebar = inner.sidebar(user_id, team_id);
        if let Some(unknown) = categories
            .iter()
            .find(|u| !sidebar.iter().any(|c| c.id == u.id))
        {
            return Err(RemoteError::not_found("category", unknown.id.as_str()));
        }

        let updated_ids: HashSet<_> = categories.iter().map(|c| c.id.clone()).collect();
        let moved: HashSet<_> = categories
            .iter()
            .flat_map(|c| c.channel_ids.iter().cloned())
            .collect();

        let mut dropped = Vec::new();
        for existing in sidebar.iter_mut() {
            if let Some(update) = categories.iter().find(|u| u.id == existing.id) {
                dropped.extend(
                    existing
                        .channel_ids
                        .iter()
                        .filter(|c| !update.channel_ids.contains(c))
                        .cloned(),
                );
                existing.display_name = update.display_name.clone();
                existing.sort_order = update.sort_order;
                existing.sorting = update.sorting;
                existing.muted = update.muted;
                existing.collapsed = update.collapsed;
                existing.channel_ids = update.channel_ids.clone();
            } else if !updated_ids.contains(&existing.id) {
                existing.channel_ids.retain(|c| !moved.contains(c));
            }
        }

        // Channels dropped from every category fall back to `Channels`
        dropped.retain(|c| !sidebar.iter().any(|category| category.contains_channel(c)));
        if let Some(channels) = sidebar.iter_mut().find(|c| c.kind == CategoryKind::Channels) {
            channels.channel_ids.extend(dropped);
        }

        Ok(categories.to_vec())
    }

    async fn delete_sidebar_category(
        &self,
        user_id: &UserId,
        team_id: &TeamId,
        category_id: &CategoryId,
    ) -> Result<(), RemoteError> {
        let mut inner = self.inner.lock();
        let target = inner
            .sidebar(user_id, team_id)
            .iter()
            .find(|c| c.id == *category_id)
            .cloned();
        let Some(target) = target else {
            return Err(RemoteError::not_found("category", category_id.as_str()));
        };

        inner.journal.push(Call::DeleteCategory {
            display_name: target.display_name.clone(),
        });
        if inner.has_fault(&Fault::DeleteCategory(target.display_name.clone())) {
            return Err(RemoteError::rejected(500, "delete failed"));
        }
        if target.kind.is_system() {
            return Err(RemoteError::rejected(400, "cannot delete a system category"));
        }

        let sidebar = inner.sidebar(user_id, team_id);
        sidebar.retain(|c| c.id != *category_id);
        if let Some(channels) = sidebar.iter_mut().find(|c| c.kind == CategoryKind::Channels) {
            channels.channel_ids.extend(target.channel_ids);
        }
        Ok(())
    }

    async fn set_category_order(
        &self,
        user_id: &UserId,
        team_id: &TeamId,
        order: &[CategoryId],
    ) -> Result<(), RemoteError> {
        let mut inner = self.inner.lock();
        inner.journal.push(Call::SetCategoryOrder {
            ids: order.to_vec(),
        });
        let sidebar = inner.sidebar(user_id, team_id);
        for (position, id) in order.iter().enumerate() {
            if let Some(category) = sidebar.iter_mut().find(|c| c.id == *id) {
                category.sort_order = i64::try_from(position).unwrap_or(i64::MAX) * 10;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn platform() -> (FakePlatform, RemoteUser) {
        let platform = FakePlatform::new("team-1");
        let user = platform.add_user("boris");
        (platform, user)
    }

    #[test]
    fn new_users_get_system_categories() {
        let (platform, user) = platform();
        let names: Vec<_> = platform
            .categories(&user.id)
            .into_iter()
            .map(|c| c.display_name)
            .collect();
        assert_eq!(names, ["Favorites", "Channels", "Direct Messages"]);
    }

    #[tokio::test]
    async fn joining_files_channel_under_channels() {
        let (platform, user) = platform();
        let channel = platform.add_channel("Kaag Cup");

        platform.add_channel_member(&channel.id, &user.id).await.unwrap();

        assert!(platform.is_member(&channel.id, &user.id));
        assert_eq!(
            platform.category_channel_names(&user.id, "Channels"),
            ["Kaag Cup"]
        );
    }

    #[tokio::test]
    async fn update_moves_channel_between_categories() {
        let (platform, user) = platform();
        let channel = platform.add_channel("Kaag Cup");
        platform.join(&channel.id, &user.id);
        let racing = platform.add_category(&user.id, "Racing", Vec::new());

        platform
            .update_sidebar_categories(
                &user.id,
                platform.team_id(),
                &[racing.with_channels(vec![channel.id.clone()])],
            )
            .await
            .unwrap();

        assert!(platform.category_channel_names(&user.id, "Channels").is_empty());
        assert_eq!(
            platform.category_channel_names(&user.id, "Racing"),
            ["Kaag Cup"]
        );
    }

    #[tokio::test]
    async fn update_with_unknown_category_changes_nothing() {
        let (platform, user) = platform();
        let racing = platform.add_category(&user.id, "Racing", Vec::new());
        let mut ghost = racing.clone();
        ghost.id = CategoryId::new("missing");
        let mut renamed = racing.clone();
        renamed.sort_order = 999;

        let result = platform
            .update_sidebar_categories(&user.id, platform.team_id(), &[renamed, ghost])
            .await;

        assert!(result.unwrap_err().is_not_found());
        assert_eq!(
            platform.category(&user.id, "Racing").unwrap().sort_order,
            racing.sort_order
        );
    }

    #[tokio::test]
    async fn dropped_channel_returns_to_channels() {
        let (platform, user) = platform();
        let laser = platform.add_channel("Laser");
        platform.join(&laser.id, &user.id);
        let fleet = platform.add_category(&user.id, "Fleet", vec![laser.id.clone()]);

        platform
            .update_sidebar_categories(&user.id, platform.team_id(), &[fleet.with_channels(Vec::new())])
            .await
            .unwrap();

        assert!(platform.category_channel_names(&user.id, "Fleet").is_empty());
        assert_eq!(platform.category_channel_names(&user.id, "Channels"), ["Laser"]);
    }

    #[tokio::test]
    async fn system_categories_cannot_be_deleted() {
        let (platform, user) = platform();
        let favorites = platform.category(&user.id, "Favorites").unwrap();

        let result = platform
            .delete_sidebar_category(&user.id, platform.team_id(), &favorites.id)
            .await;

        assert!(matches!(result, Err(RemoteError::Rejected { status: 400, .. })));
    }

    #[tokio::test]
    async fn paging_ends_with_empty_page() {
        let (platform, _) = platform();
        for name in ["a", "b", "c"] {
            platform.add_channel(name);
        }
        let team = platform.team_id().clone();

        assert_eq!(platform.get_public_channels_for_team(&team, 0, 2).await.unwrap().len(), 2);
        assert_eq!(platform.get_public_channels_for_team(&team, 1, 2).await.unwrap().len(), 1);
        assert!(platform.get_public_channels_for_team(&team, 2, 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn private_channels_are_not_listed() {
        let (platform, _) = platform();
        platform.add_private_channel("Committee");
        let team = platform.team_id().clone();

        assert!(platform.get_public_channels_for_team(&team, 0, 10).await.unwrap().is_empty());
    }
}
