//! Category creation and population stage
//!
//! Population is additive: declared channels are appended to whatever the
//! remote category already holds, and nothing is ever removed. Each
//! category is pushed back with its own update call.

use crate::error::ReconcileError;
use crate::report::{OutcomeKind, ReportBuilder, Stage};
use crate::scope::{find_category, Scope};
use taxon_model::{Category, NewSidebarCategory, SidebarCategory};

/// Creates missing categories and fills them with their declared channels
pub struct CategoryReconciler<'a> {
    scope: Scope<'a>,
}

impl<'a> CategoryReconciler<'a> {
    /// Create the stage
    #[must_use]
    pub fn new(scope: Scope<'a>) -> Self {
        Self { scope }
    }

    /// Ensure every declared category exists and holds its channels
    ///
    /// # Errors
    /// `RemoteUnavailable` when the user's categories cannot be fetched.
    /// Rejected creates and updates are reported and skipped.
    pub async fn ensure_categorized(&self, report: &mut ReportBuilder) -> Result<(), ReconcileError> {
        let Scope {
            taxonomy,
            user_id,
            team_id,
            ..
        } = self.scope;

        tracing::info!(user = %user_id, team = %team_id, "ensuring sidebar categories");

        let existing = self.scope.fetcher().sidebar_categories(user_id, team_id).await?;

        for declared in taxonomy.categories() {
            let target = match find_category(&existing, &declared.name, Stage::Categorization, report) {
                Some(category) => category.clone(),
                None => match self.create(declared, report).await {
                    Some(created) => created,
                    None => continue,
                },
            };

            self.populate(declared, target, report).await;
        }

        Ok(())
    }

    async fn create(&self, declared: &Category, report: &mut ReportBuilder) -> Option<SidebarCategory> {
        let Scope {
            port,
            user_id,
            team_id,
            ..
        } = self.scope;
        let request = NewSidebarCategory::custom(user_id.clone(), team_id.clone(), &declared.name);

        match port.create_sidebar_category(user_id, team_id, &request).await {
            Ok(created) => {
                tracing::info!(category = %declared.name, id = %created.id, "created sidebar category");
                report.record(
                    Stage::Categorization,
                    &declared.name,
                    OutcomeKind::CategoryCreated,
                    format!("Created sidebar category: {}", declared.name),
                );
                Some(created)
            }
            Err(e) => {
                tracing::warn!(category = %declared.name, error = %e, "category creation rejected");
                let line = format!("Failed to create sidebar category {}: {e}", declared.name);
                report.fail(
                    Stage::Categorization,
                    &declared.name,
                    OutcomeKind::CategoryCreateFailed,
                    ReconcileError::mutation("create category", &declared.name, e),
                    line,
                );
                None
            }
        }
    }

    async fn populate(&self, declared: &Category, target: SidebarCategory, report: &mut ReportBuilder) {
        let Scope {
            port,
            user_id,
            team_id,
            ..
        } = self.scope;
        let fetcher = self.scope.fetcher();
        let name = declared.name.as_str();
        let mut channel_ids = target.channel_ids.clone();

        for display_name in &declared.channels {
            let channel = match fetcher.resolve_channel(team_id, display_name).await {
                Ok(channel) => channel,
                Err(e) if e.is_not_found() => {
                    tracing::warn!(category = name, channel = %display_name, "declared channel does not exist");
                    report.fail(
                        Stage::Categorization,
                        display_name,
                        OutcomeKind::ChannelNotFound,
                        ReconcileError::not_found("channel", display_name),
                        format!("Channel not found: {display_name}"),
                    );
                    continue;
                }
                Err(e) => {
                    tracing::warn!(category = name, channel = %display_name, error = %e, "channel lookup failed");
                    let line = format!("Failed to look up channel {display_name}: {e}");
                    report.fail(
                        Stage::Categorization,
                        display_name,
                        OutcomeKind::LookupFailed,
                        ReconcileError::unavailable("channel", e),
                        line,
                    );
                    continue;
                }
            };

            if channel_ids.contains(&channel.id) {
                report.record(
                    Stage::Categorization,
                    display_name,
                    OutcomeKind::ChannelPresent,
                    format!("Channel {display_name} already in category {name}"),
                );
            } else {
                tracing::debug!(category = name, channel = %display_name, "queued channel");
                channel_ids.push(channel.id);
                report.record(
                    Stage::Categorization,
                    display_name,
                    OutcomeKind::ChannelQueued,
                    format!("Queued channel {display_name} to be added to category {name}"),
                );
            }
        }

        let updated = target.with_channels(channel_ids);
        match port
            .update_sidebar_categories(user_id, team_id, std::slice::from_ref(&updated))
            .await
        {
            Ok(_) => {
                report.record(
                    Stage::Categorization,
                    name,
                    OutcomeKind::CategoryUpdated,
                    format!("Successfully updated sidebar category {name} with all channels"),
                );
            }
            Err(e) => {
                tracing::warn!(category = name, error = %e, "category update rejected");
                let line = format!("Failed to update sidebar category {name}: {e}");
                report.fail(
                    Stage::Categorization,
                    name,
                    OutcomeKind::CategoryUpdateFailed,
                    ReconcileError::mutation("update category", name, e),
                    line,
                );
            }
        }
    }
}
