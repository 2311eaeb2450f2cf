//! Ordering stage
//!
//! Re-reads the sidebar, then pushes every declared category in one batch
//! with its declared position and its declared channel order. A declared
//! category missing from the sidebar, or a channel lookup failing for any
//! reason other than the channel not existing, aborts the stage before
//! anything is sent: the batch replaces each category's channel list, so a
//! partial one would drop channels and leave sibling positions inconsistent.

use crate::error::ReconcileError;
use crate::report::{OutcomeKind, ReportBuilder, Stage};
use crate::scope::{find_category, Scope};
use taxon_model::{CategoryId, CategorySorting, ChannelId, SidebarCategory};

/// Copy of `category` placed at `sort_order` holding exactly `channel_ids`
#[must_use]
pub fn arrange(category: &SidebarCategory, channel_ids: Vec<ChannelId>, sort_order: i64) -> SidebarCategory {
    SidebarCategory {
        sort_order,
        sorting: CategorySorting::Manual,
        ..category.with_channels(channel_ids)
    }
}

/// Category id sequence with declared categories first, in declared order
///
/// Categories not named in `declared` keep their relative order after
/// the declared ones.
#[must_use]
pub fn positions(categories: &[SidebarCategory], declared: &[&str]) -> Vec<CategoryId> {
    let mut ordered: Vec<CategoryId> = declared
        .iter()
        .filter_map(|name| categories.iter().find(|c| c.display_name == *name))
        .map(|c| c.id.clone())
        .collect();

    for category in categories {
        if !ordered.contains(&category.id) {
            ordered.push(category.id.clone());
        }
    }
    ordered
}

/// Applies declared category positions and channel order
pub struct OrderReconciler<'a> {
    scope: Scope<'a>,
}

impl<'a> OrderReconciler<'a> {
    /// Create the stage
    #[must_use]
    pub fn new(scope: Scope<'a>) -> Self {
        Self { scope }
    }

    /// Push the declared arrangement in one batch, then report the result
    ///
    /// # Errors
    /// - `RemoteUnavailable` when a category fetch fails
    /// - `EntityNotFound` when a declared category is absent; no batch is sent
    /// - `RemoteUnavailable` when a declared channel cannot be looked up;
    ///   no batch is sent. Channels that do not exist are skipped.
    ///
    /// A rejected batch is reported, not returned.
    pub async fn apply_order(&self, report: &mut ReportBuilder) -> Result<(), ReconcileError> {
        let Scope {
            port,
            taxonomy,
            config,
            user_id,
            team_id,
        } = self.scope;
        let fetcher = self.scope.fetcher();

        tracing::info!(user = %user_id, team = %team_id, "applying category order");

        let current = fetcher.sidebar_categories(user_id, team_id).await?;
        let mut batch = Vec::with_capacity(taxonomy.len());

        for (index, declared) in taxonomy.categories().iter().enumerate() {
            let Some(category) = find_category(&current, &declared.name, Stage::Ordering, report) else {
                tracing::error!(category = %declared.name, "declared category missing, nothing reordered");
                let error = ReconcileError::not_found("category", &declared.name);
                report.fail(
                    Stage::Ordering,
                    &declared.name,
                    OutcomeKind::CategoryNotFound,
                    error.clone(),
                    format!("Category not found for reordering: {}", declared.name),
                );
                return Err(error);
            };

            let mut channel_ids = Vec::with_capacity(declared.channels.len());
            for display_name in &declared.channels {
                match fetcher.resolve_channel(team_id, display_name).await {
                    Ok(channel) => channel_ids.push(channel.id),
                    Err(e) if e.is_not_found() => {
                        tracing::debug!(category = %declared.name, channel = %display_name, "skipping missing channel");
                    }
                    Err(e) => {
                        tracing::error!(category = %declared.name, channel = %display_name, error = %e, "channel lookup failed, nothing reordered");
                        let line = format!("Failed to look up channel {display_name}: {e}");
                        let error = ReconcileError::unavailable("channel", e);
                        report.fail(
                            Stage::Ordering,
                            display_name,
                            OutcomeKind::LookupFailed,
                            error.clone(),
                            line,
                        );
                        return Err(error);
                    }
                }
            }

            batch.push(arrange(category, channel_ids, config.sort_order(index)));
        }

        if let Err(e) = port.update_sidebar_categories(user_id, team_id, &batch).await {
            tracing::warn!(user = %user_id, error = %e, "reorder batch rejected");
            let line = format!("Failed to reorder sidebar categories: {e}");
            report.fail(
                Stage::Ordering,
                user_id.as_str(),
                OutcomeKind::ReorderFailed,
                ReconcileError::mutation("reorder categories of", user_id.as_str(), e),
                line,
            );
            return Ok(());
        }
        report.record(
            Stage::Ordering,
            user_id.as_str(),
            OutcomeKind::Reordered,
            "Successfully reordered sidebar categories",
        );

        for category in fetcher.sidebar_categories(user_id, team_id).await? {
            report.line(format!("{} - {}", category.display_name, category.sort_order));
        }

        Ok(())
    }

    /// Move declared categories to the top of the sidebar, in declared order
    ///
    /// Only category positions change; channel lists are left alone.
    ///
    /// # Errors
    /// `RemoteUnavailable` when the categories cannot be fetched
    pub async fn apply_positions(&self, report: &mut ReportBuilder) -> Result<(), ReconcileError> {
        let Scope {
            port,
            taxonomy,
            user_id,
            team_id,
            ..
        } = self.scope;

        let current = self.scope.fetcher().sidebar_categories(user_id, team_id).await?;
        let declared: Vec<&str> = taxonomy.category_names().collect();
        let order = positions(&current, &declared);

        match port.set_category_order(user_id, team_id, &order).await {
            Ok(()) => {
                report.record(
                    Stage::Ordering,
                    user_id.as_str(),
                    OutcomeKind::Reordered,
                    "Successfully set category order",
                );
            }
            Err(e) => {
                tracing::warn!(user = %user_id, error = %e, "category order rejected");
                let line = format!("Failed to set category order: {e}");
                report.fail(
                    Stage::Ordering,
                    user_id.as_str(),
                    OutcomeKind::ReorderFailed,
                    ReconcileError::mutation("set category order of", user_id.as_str(), e),
                    line,
                );
            }
        }
        Ok(())
    }
}
