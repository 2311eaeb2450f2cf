//! Read-only sidebar checks
//!
//! Compares a user's sidebar and memberships against the taxonomy without
//! changing anything. Each check renders as a single line, `.` when clean.

use crate::error::ReconcileError;
use crate::report::{OutcomeKind, ReportBuilder, Stage};
use crate::scope::Scope;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// A subscribed channel filed under the wrong category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Miscategorized {
    /// Channel display name
    pub channel: String,
    /// Declared category
    pub expected: String,
    /// Category the channel currently sits in
    pub actual: String,
}

impl fmt::Display for Miscategorized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (expected: {}, got: {})",
            self.channel, self.expected, self.actual
        )
    }
}

/// Deviations found for one user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditFindings {
    /// Declared categories absent from the sidebar
    pub missing_categories: Vec<String>,
    /// Declared channels the user is not subscribed to
    pub missing_channels: Vec<String>,
    /// Subscribed channels sitting in another category than declared
    pub miscategorized: Vec<Miscategorized>,
}

impl AuditFindings {
    /// Whether every check passed
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.missing_categories.is_empty()
            && self.missing_channels.is_empty()
            && self.miscategorized.is_empty()
    }
}

fn render<T: ToString>(prefix: &str, items: &[T]) -> String {
    if items.is_empty() {
        ".".to_string()
    } else {
        let joined: Vec<String> = items.iter().map(ToString::to_string).collect();
        format!("{prefix}: {}", joined.join(", "))
    }
}

/// Runs the three sidebar checks for one user
pub struct SidebarAuditor<'a> {
    scope: Scope<'a>,
}

impl<'a> SidebarAuditor<'a> {
    /// Create the auditor
    #[must_use]
    pub fn new(scope: Scope<'a>) -> Self {
        Self { scope }
    }

    /// Check categories, subscriptions and categorization
    ///
    /// # Errors
    /// `RemoteUnavailable` when categories, channels or memberships cannot
    /// be fetched.
    pub async fn audit(&self, report: &mut ReportBuilder) -> Result<AuditFindings, ReconcileError> {
        let Scope {
            taxonomy,
            user_id,
            team_id,
            ..
        } = self.scope;
        let fetcher = self.scope.fetcher();

        tracing::info!(user = %user_id, team = %team_id, "auditing sidebar");

        let categories = fetcher.sidebar_categories(user_id, team_id).await?;
        let subscribed = fetcher.subscribed_public_channels(user_id, team_id).await?;

        let present: HashSet<&str> = categories.iter().map(|c| c.display_name.as_str()).collect();
        let missing_categories: Vec<String> = taxonomy
            .category_names()
            .filter(|name| !present.contains(name))
            .map(str::to_string)
            .collect();

        let subscribed_names: HashSet<&str> = subscribed.iter().map(|c| c.display_name.as_str()).collect();
        let mut seen = HashSet::new();
        let missing_channels: Vec<String> = taxonomy
            .channel_names()
            .filter(|name| seen.insert(*name) && !subscribed_names.contains(name))
            .map(str::to_string)
            .collect();

        let names_by_id: HashMap<_, _> = subscribed
            .iter()
            .map(|c| (&c.id, c.display_name.as_str()))
            .collect();
        let mut placed: HashMap<&str, &str> = HashMap::new();
        for category in &categories {
            for channel_id in &category.channel_ids {
                if let Some(name) = names_by_id.get(channel_id) {
                    placed.insert(*name, category.display_name.as_str());
                }
            }
        }

        let miscategorized: Vec<Miscategorized> = subscribed
            .iter()
            .filter_map(|channel| {
                let expected = taxonomy.expected_category(&channel.display_name)?;
                let actual = placed.get(channel.display_name.as_str())?;
                (*actual != expected).then(|| Miscategorized {
                    channel: channel.display_name.clone(),
                    expected: expected.to_string(),
                    actual: (*actual).to_string(),
                })
            })
            .collect();

        let findings = AuditFindings {
            missing_categories,
            missing_channels,
            miscategorized,
        };

        for (item, line, clean) in [
            (
                "categories",
                render("Missing required categories", &findings.missing_categories),
                findings.missing_categories.is_empty(),
            ),
            (
                "channels",
                render("Missing required channels", &findings.missing_channels),
                findings.missing_channels.is_empty(),
            ),
            (
                "categorization",
                render("Wrongly categorized channels", &findings.miscategorized),
                findings.miscategorized.is_empty(),
            ),
        ] {
            let kind = if clean {
                OutcomeKind::CheckPassed
            } else {
                OutcomeKind::CheckFailed
            };
            report.record(Stage::Audit, item, kind, line);
        }

        if !findings.is_clean() {
            tracing::info!(
                user = %user_id,
                missing_categories = findings.missing_categories.len(),
                missing_channels = findings.missing_channels.len(),
                miscategorized = findings.miscategorized.len(),
                "sidebar deviates from taxonomy"
            );
        }

        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use pretty_assertions::assert_eq;
    use taxon_test_utils::{seeded_platform, three_category_taxonomy};

    #[test]
    fn renders_dot_when_clean() {
        assert_eq!(render::<String>("Missing required channels", &[]), ".");
        assert_eq!(
            render("Missing required channels", &["Laser", "Buzz"]),
            "Missing required channels: Laser, Buzz"
        );
    }

    #[tokio::test]
    async fn reports_all_three_deviations() {
        let taxonomy = three_category_taxonomy();
        let platform = seeded_platform(&taxonomy);
        let user = platform.add_user("boris");
        for name in ["Town Square", "Club News", "Laser"] {
            let channel = platform.channel_by_display_name(name).unwrap();
            platform.join(&channel.id, &user.id);
        }
        let filed: Vec<_> = ["Town Square", "Club News", "Laser"]
            .into_iter()
            .map(|name| platform.channel_by_display_name(name).unwrap().id)
            .collect();
        platform.add_category(&user.id, "Club Life", filed);
        let config = EngineConfig::default();

        let mut report = ReportBuilder::new();
        let findings = SidebarAuditor::new(Scope {
            port: &*platform,
            taxonomy: &taxonomy,
            config: &config,
            user_id: &user.id,
            team_id: platform.team_id(),
        })
        .audit(&mut report)
        .await
        .unwrap();

        assert_eq!(findings.missing_categories, ["Racing", "Fleet"]);
        assert_eq!(findings.missing_channels, ["Monday Races", "Kaag Cup", "Wayfarer"]);
        assert_eq!(
            report.build().lines(),
            [
                "Missing required categories: Racing, Fleet",
                "Missing required channels: Monday Races, Kaag Cup, Wayfarer",
                "Wrongly categorized channels: Laser (expected: Fleet, got: Club Life)",
            ]
        );
        assert!(platform.calls().is_empty());
    }
}
