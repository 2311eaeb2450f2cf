//! Per-user run context shared by the stages

use crate::config::EngineConfig;
use crate::fetch::RemoteStateFetcher;
use crate::report::{OutcomeKind, ReportBuilder, Stage};
use taxon_model::{SidebarCategory, Taxonomy, TeamId, UserId};
use taxon_remote::RemotePort;

/// Everything a stage needs to work on one user's sidebar
#[derive(Clone, Copy)]
pub struct Scope<'a> {
    /// Platform access
    pub port: &'a dyn RemotePort,
    /// Declared taxonomy
    pub taxonomy: &'a Taxonomy,
    /// Engine tunables
    pub config: &'a EngineConfig,
    /// User whose sidebar is reconciled
    pub user_id: &'a UserId,
    /// Team the sidebar belongs to
    pub team_id: &'a TeamId,
}

impl<'a> Scope<'a> {
    /// Fetcher over the same port and config
    #[must_use]
    pub fn fetcher(&self) -> RemoteStateFetcher<'a> {
        RemoteStateFetcher::new(self.port, self.config)
    }
}

/// Find the remote category carrying a declared name
///
/// The first match in sidebar order wins. When the name is shared by more
/// than one remote category the ambiguity is logged and recorded.
pub(crate) fn find_category<'c>(
    categories: &'c [SidebarCategory],
    name: &str,
    stage: Stage,
    report: &mut ReportBuilder,
) -> Option<&'c SidebarCategory> {
    let mut matches = categories.iter().filter(|c| c.display_name == name);
    let first = matches.next()?;

    let others = matches.count();
    if others > 0 {
        tracing::warn!(
            category = name,
            duplicates = others + 1,
            chosen = %first.id,
            "several sidebar categories share this name, using the first"
        );
        report.note(stage, name, OutcomeKind::DuplicateCategoryName);
    }

    Some(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxon_model::{CategoryId, CategoryKind, CategorySorting};

    fn category(id: &str, name: &str) -> SidebarCategory {
        SidebarCategory {
            id: CategoryId::new(id),
            user_id: UserId::new("u"),
            team_id: TeamId::new("t"),
            display_name: name.to_string(),
            kind: CategoryKind::Custom,
            sort_order: 0,
            sorting: CategorySorting::Default,
            muted: false,
            collapsed: false,
            channel_ids: Vec::new(),
        }
    }

    #[test]
    fn first_match_wins_and_is_flagged() {
        let categories = vec![
            category("a", "Racing"),
            category("b", "Fleet"),
            category("c", "Racing"),
        ];
        let mut report = ReportBuilder::new();

        let found = find_category(&categories, "Racing", Stage::Ordering, &mut report).unwrap();
        assert_eq!(found.id.as_str(), "a");

        let report = report.build();
        assert_eq!(report.count(OutcomeKind::DuplicateCategoryName), 1);
        assert!(report.lines().is_empty());
    }

    #[test]
    fn unique_name_is_not_flagged() {
        let categories = vec![category("a", "Racing")];
        let mut report = ReportBuilder::new();

        assert!(find_category(&categories, "Racing", Stage::Ordering, &mut report).is_some());
        assert!(find_category(&categories, "Fleet", Stage::Ordering, &mut report).is_none());
        assert!(report.build().outcomes().is_empty());
    }
}
