//! Category cleanup
//!
//! Deletes every non-protected category of a user, one call per category.
//! There is no dry run.

use crate::error::ReconcileError;
use crate::report::{OutcomeKind, ReportBuilder, Stage};
use crate::scope::Scope;

/// Removes custom categories from a user's sidebar
pub struct CategoryPurger<'a> {
    scope: Scope<'a>,
}

impl<'a> CategoryPurger<'a> {
    /// Create the stage
    #[must_use]
    pub fn new(scope: Scope<'a>) -> Self {
        Self { scope }
    }

    /// Delete every category not protected by name or platform type
    ///
    /// # Errors
    /// `RemoteUnavailable` when the categories cannot be fetched. Rejected
    /// deletes are reported and the pass continues.
    pub async fn purge_non_default_categories(&self, report: &mut ReportBuilder) -> Result<(), ReconcileError> {
        let Scope {
            port,
            config,
            user_id,
            team_id,
            ..
        } = self.scope;

        tracing::info!(user = %user_id, team = %team_id, "purging non-default categories");

        let categories = self.scope.fetcher().sidebar_categories(user_id, team_id).await?;

        for category in categories {
            let name = category.display_name.as_str();
            if config.is_protected(name) || category.kind.is_system() {
                tracing::debug!(category = name, "protected, skipping");
                report.note(Stage::Purge, name, OutcomeKind::CategoryProtected);
                continue;
            }

            match port.delete_sidebar_category(user_id, team_id, &category.id).await {
                Ok(()) => {
                    tracing::debug!(category = name, "deleted");
                    report.record(
                        Stage::Purge,
                        name,
                        OutcomeKind::CategoryDeleted,
                        format!("Successfully deleted category: {name}"),
                    );
                }
                Err(e) => {
                    tracing::warn!(category = name, error = %e, "delete rejected");
                    let line = format!("Could not delete **{name}** because **{e}**");
                    report.fail(
                        Stage::Purge,
                        name,
                        OutcomeKind::CategoryDeleteFailed,
                        ReconcileError::mutation("delete category", name, e),
                        line,
                    );
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use pretty_assertions::assert_eq;
    use taxon_model::Taxonomy;
    use taxon_test_utils::{Call, FakePlatform, Fault};

    #[tokio::test]
    async fn deletes_custom_and_keeps_defaults() {
        let platform = FakePlatform::new("team-1");
        let user = platform.add_user("boris");
        platform.add_category(&user.id, "Racing", Vec::new());
        platform.add_category(&user.id, "Fleet", Vec::new());
        platform.inject(Fault::DeleteCategory("Fleet".into()));
        let taxonomy = Taxonomy::new(Vec::new()).unwrap();
        let config = EngineConfig::default();

        let mut report = ReportBuilder::new();
        CategoryPurger::new(Scope {
            port: &platform,
            taxonomy: &taxonomy,
            config: &config,
            user_id: &user.id,
            team_id: platform.team_id(),
        })
        .purge_non_default_categories(&mut report)
        .await
        .unwrap();
        let report = report.build();

        assert_eq!(
            platform.calls(),
            vec![
                Call::DeleteCategory {
                    display_name: "Racing".into()
                },
                Call::DeleteCategory {
                    display_name: "Fleet".into()
                },
            ]
        );
        assert_eq!(report.count(OutcomeKind::CategoryProtected), 3);
        assert_eq!(report.count(OutcomeKind::CategoryDeleteFailed), 1);
        assert!(platform.category(&user.id, "Racing").is_none());
    }

    #[tokio::test]
    async fn system_kinds_survive_empty_protected_list() {
        let platform = FakePlatform::new("team-1");
        let user = platform.add_user("boris");
        let taxonomy = Taxonomy::new(Vec::new()).unwrap();
        let config = EngineConfig::default().with_protected_categories(Vec::<String>::new());

        let mut report = ReportBuilder::new();
        CategoryPurger::new(Scope {
            port: &platform,
            taxonomy: &taxonomy,
            config: &config,
            user_id: &user.id,
            team_id: platform.team_id(),
        })
        .purge_non_default_categories(&mut report)
        .await
        .unwrap();

        assert!(platform.calls().is_empty());
    }
}
