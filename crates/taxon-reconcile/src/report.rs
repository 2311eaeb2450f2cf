//! Run reports
//!
//! A [`Report`] is what every entry point hands back: the human-readable
//! lines in the order events happened, a structured outcome per item, and
//! the error that aborted the run, if any.

use crate::error::ReconcileError;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Pipeline stage an outcome belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// User resolution and remote state retrieval
    Fetch,
    /// Channel membership
    Subscription,
    /// Category creation and population
    Categorization,
    /// Category and channel ordering
    Ordering,
    /// Category deletion
    Purge,
    /// Read-only checks
    Audit,
    /// Channel creation
    Provisioning,
}

/// What happened to one item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// User added to a channel
    Joined,
    /// User already a member
    AlreadyMember,
    /// Declared channel does not exist remotely
    ChannelNotFound,
    /// Channel lookup failed for another reason
    LookupFailed,
    /// Adding the user to a channel was rejected
    JoinFailed,
    /// Category created for the user
    CategoryCreated,
    /// Category creation was rejected
    CategoryCreateFailed,
    /// Channel appended to a category
    ChannelQueued,
    /// Channel already in its category
    ChannelPresent,
    /// Category update accepted
    CategoryUpdated,
    /// Category update rejected
    CategoryUpdateFailed,
    /// Declared category absent from the sidebar
    CategoryNotFound,
    /// Several remote categories share a declared name
    DuplicateCategoryName,
    /// Ordering batch accepted
    Reordered,
    /// Ordering batch rejected
    ReorderFailed,
    /// Category deleted
    CategoryDeleted,
    /// Category deletion rejected
    CategoryDeleteFailed,
    /// Category skipped by purge
    CategoryProtected,
    /// Channel created
    ChannelCreated,
    /// Channel creation rejected
    ChannelCreateFailed,
    /// Audit check passed
    CheckPassed,
    /// Audit check found a deviation
    CheckFailed,
    /// A nested run aborted
    Aborted,
}

impl OutcomeKind {
    /// Whether the outcome records a failure
    #[must_use]
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            Self::ChannelNotFound
                | Self::LookupFailed
                | Self::JoinFailed
                | Self::CategoryCreateFailed
                | Self::CategoryUpdateFailed
                | Self::CategoryNotFound
                | Self::ReorderFailed
                | Self::CategoryDeleteFailed
                | Self::ChannelCreateFailed
                | Self::Aborted
        )
    }
}

/// Structured record of one item's result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// Stage that produced the outcome
    pub stage: Stage,
    /// Channel, category or user the outcome is about
    pub item: String,
    /// What happened
    pub kind: OutcomeKind,
    /// Why the item failed; set for failure kinds only
    #[serde(
        default,
        skip_deserializing,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_error"
    )]
    pub error: Option<ReconcileError>,
}

fn serialize_error<S: Serializer>(error: &Option<ReconcileError>, serializer: S) -> Result<S::Ok, S::Error> {
    match error {
        Some(error) => serializer.collect_str(error),
        None => serializer.serialize_none(),
    }
}

/// Result of one entry point invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    lines: Vec<String>,
    outcomes: Vec<Outcome>,
    aborted: Option<ReconcileError>,
}

impl Report {
    /// Lines joined with newlines
    #[must_use]
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Lines in emission order
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Outcomes in emission order
    #[must_use]
    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    /// Outcomes of one stage
    pub fn outcomes_in(&self, stage: Stage) -> impl Iterator<Item = &Outcome> {
        self.outcomes.iter().filter(move |o| o.stage == stage)
    }

    /// Number of outcomes of one kind
    #[must_use]
    pub fn count(&self, kind: OutcomeKind) -> usize {
        self.outcomes.iter().filter(|o| o.kind == kind).count()
    }

    /// Number of lines equal to `line`
    #[must_use]
    pub fn count_lines(&self, line: &str) -> usize {
        self.lines.iter().filter(|l| *l == line).count()
    }

    /// The error that stopped the run
    #[must_use]
    pub fn aborted(&self) -> Option<&ReconcileError> {
        self.aborted.as_ref()
    }

    /// Whether the run stopped early
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }

    /// Whether anything failed, aborted or not
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.is_aborted() || self.outcomes.iter().any(|o| o.kind.is_failure())
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// Accumulates lines and outcomes across stages
#[derive(Debug, Default)]
pub struct ReportBuilder {
    report: Report,
}

impl ReportBuilder {
    /// Create an empty builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a free-form line
    pub fn line(&mut self, line: impl Into<String>) -> &mut Self {
        self.report.lines.push(line.into());
        self
    }

    /// Append a section header
    pub fn section(&mut self, header: impl fmt::Display) -> &mut Self {
        self.line(header.to_string())
    }

    /// Record an outcome together with its line
    pub fn record(
        &mut self,
        stage: Stage,
        item: impl Into<String>,
        kind: OutcomeKind,
        line: impl Into<String>,
    ) -> &mut Self {
        self.note(stage, item, kind).line(line)
    }

    /// Record a failed item with its cause and line
    ///
    /// The run goes on; use [`ReportBuilder::abort`] for errors that end it.
    pub fn fail(
        &mut self,
        stage: Stage,
        item: impl Into<String>,
        kind: OutcomeKind,
        error: ReconcileError,
        line: impl Into<String>,
    ) -> &mut Self {
        self.report.outcomes.push(Outcome {
            stage,
            item: item.into(),
            kind,
            error: Some(error),
        });
        self.line(line)
    }

    /// Record an outcome that has no line of its own
    pub fn note(&mut self, stage: Stage, item: impl Into<String>, kind: OutcomeKind) -> &mut Self {
        self.report.outcomes.push(Outcome {
            stage,
            item: item.into(),
            kind,
            error: None,
        });
        self
    }

    /// Stop the run with `error`, writing it as the final line
    pub fn abort(&mut self, error: ReconcileError) -> &mut Self {
        self.report.lines.push(format!("Error: {error}"));
        self.report.aborted = Some(error);
        self
    }

    /// Nest another report under a header
    ///
    /// An abort inside `nested` is kept as a line and an `Aborted` outcome
    /// for `item`; it does not abort this report.
    pub fn merge(&mut self, header: impl fmt::Display, item: &str, nested: Report) -> &mut Self {
        self.section(header);
        self.report.lines.extend(nested.lines);
        self.report.outcomes.extend(nested.outcomes);
        if nested.aborted.is_some() {
            self.note(Stage::Fetch, item, OutcomeKind::Aborted);
        }
        self
    }

    /// Finish the report
    #[must_use]
    pub fn build(self) -> Report {
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use taxon_remote::RemoteError;

    #[test]
    fn lines_and_outcomes_keep_order() {
        let mut builder = ReportBuilder::new();
        builder
            .section("Subscriptions")
            .record(
                Stage::Subscription,
                "Kaag Cup",
                OutcomeKind::ChannelNotFound,
                "Channel not found: Kaag Cup",
            )
            .record(
                Stage::Subscription,
                "Laser",
                OutcomeKind::AlreadyMember,
                "User is already a member of channel: Laser",
            );
        let report = builder.build();

        assert_eq!(
            report.text(),
            "Subscriptions\nChannel not found: Kaag Cup\nUser is already a member of channel: Laser"
        );
        assert_eq!(report.count(OutcomeKind::ChannelNotFound), 1);
        assert_eq!(report.outcomes_in(Stage::Subscription).count(), 2);
        assert!(report.has_failures());
        assert!(!report.is_aborted());
    }

    #[test]
    fn abort_is_last_line() {
        let mut builder = ReportBuilder::new();
        builder.line("working");
        builder.abort(ReconcileError::not_found("category", "Racing"));
        let report = builder.build();

        assert!(report.is_aborted());
        assert_eq!(report.lines().last().unwrap(), "Error: category not found: Racing");
    }

    #[test]
    fn merge_contains_nested_abort() {
        let mut nested = ReportBuilder::new();
        nested.abort(ReconcileError::unavailable(
            "sidebar categories",
            RemoteError::Transport("reset".into()),
        ));

        let mut outer = ReportBuilder::new();
        outer.merge("User: **boris**", "boris", nested.build());
        let report = outer.build();

        assert!(!report.is_aborted());
        assert_eq!(report.lines()[0], "User: **boris**");
        assert_eq!(report.count(OutcomeKind::Aborted), 1);
        assert!(report.has_failures());
    }

    #[test]
    fn outcomes_serialize_snake_case() {
        let outcome = Outcome {
            stage: Stage::Ordering,
            item: "Racing".into(),
            kind: OutcomeKind::DuplicateCategoryName,
            error: None,
        };
        let json = serde_json::to_string(&outcome).unwrap();
        assert_eq!(
            json,
            r#"{"stage":"ordering","item":"Racing","kind":"duplicate_category_name"}"#
        );
    }

    #[test]
    fn failures_carry_their_cause() {
        let mut builder = ReportBuilder::new();
        builder.fail(
            Stage::Subscription,
            "Laser",
            OutcomeKind::JoinFailed,
            ReconcileError::mutation("add user to", "Laser", RemoteError::rejected(403, "denied")),
            "Failed to add user to channel: Laser (request rejected with status 403: denied)",
        );
        let report = builder.build();

        let outcome = &report.outcomes()[0];
        assert!(matches!(
            outcome.error,
            Some(ReconcileError::MutationFailed { action: "add user to", .. })
        ));
        assert_eq!(
            serde_json::to_value(outcome).unwrap()["error"],
            "failed to add user to Laser: request rejected with status 403: denied"
        );
        assert!(report.has_failures());
    }
}
