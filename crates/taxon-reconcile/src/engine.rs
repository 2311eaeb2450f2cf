//! Reconciler entry points
//!
//! The engine owns the platform port, the declared taxonomy and its
//! configuration; every entry point returns a [`Report`]. Fatal errors never
//! escape as `Err`: they end the run and are recorded on the report.

use crate::audit::{AuditFindings, SidebarAuditor};
use crate::category::CategoryReconciler;
use crate::config::EngineConfig;
use crate::error::ReconcileError;
use crate::fetch::RemoteStateFetcher;
use crate::order::OrderReconciler;
use crate::provision::ChannelProvisioner;
use crate::purge::CategoryPurger;
use crate::report::{Report, ReportBuilder};
use crate::scope::Scope;
use crate::subscription::SubscriptionReconciler;
use std::fmt;
use std::sync::Arc;
use taxon_model::{RemoteUser, Taxonomy, TeamId, UserId};
use taxon_remote::RemotePort;

/// How a caller names a user
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UserRef {
    /// Platform user id
    Id(UserId),
    /// Username, resolved on each run
    Username(String),
}

impl UserRef {
    /// Reference a user by username
    pub fn username(name: impl Into<String>) -> Self {
        Self::Username(name.into())
    }
}

impl From<UserId> for UserRef {
    fn from(id: UserId) -> Self {
        Self::Id(id)
    }
}

impl fmt::Display for UserRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Username(name) => write!(f, "@{name}"),
        }
    }
}

/// Audit of one user
#[derive(Debug, Clone)]
pub struct UserAudit {
    /// Rendered checks
    pub report: Report,
    /// Structured deviations; `None` when the audit aborted
    pub findings: Option<AuditFindings>,
}

/// Sidebar taxonomy reconciliation engine
///
/// Cheap to clone; the port and taxonomy are shared.
#[derive(Clone)]
pub struct Reconciler {
    port: Arc<dyn RemotePort>,
    taxonomy: Arc<Taxonomy>,
    config: EngineConfig,
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("taxonomy", &self.taxonomy)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Create an engine with default configuration
    pub fn new(port: Arc<dyn RemotePort>, taxonomy: impl Into<Arc<Taxonomy>>) -> Self {
        Self {
            port,
            taxonomy: taxonomy.into(),
            config: EngineConfig::default(),
        }
    }

    /// Replace the configuration
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Declared taxonomy
    #[must_use]
    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// Engine configuration
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn scope<'a>(&'a self, user_id: &'a UserId, team_id: &'a TeamId) -> Scope<'a> {
        Scope {
            port: self.port.as_ref(),
            taxonomy: &self.taxonomy,
            config: &self.config,
            user_id,
            team_id,
        }
    }

    fn fetcher(&self) -> RemoteStateFetcher<'_> {
        RemoteStateFetcher::new(self.port.as_ref(), &self.config)
    }

    async fn resolve_user(&self, user: &UserRef) -> Result<RemoteUser, ReconcileError> {
        let result = match user {
            UserRef::Id(id) => self.port.get_user(id).await,
            UserRef::Username(name) => self.port.get_user_by_username(name).await,
        };

        result.map_err(|e| {
            if e.is_not_found() {
                ReconcileError::not_found("user", user.to_string())
            } else {
                ReconcileError::unavailable("user", e)
            }
        })
    }

    /// Close a run, recording a fatal error if there was one
    fn finish(mut report: ReportBuilder, result: Result<(), ReconcileError>) -> Report {
        if let Err(error) = result {
            tracing::error!(%error, "run aborted");
            report.abort(error);
        }
        report.build()
    }

    /// Bring one user's sidebar in line with the taxonomy
    ///
    /// Joins missing channels, creates and fills categories, then applies
    /// the declared order.
    pub async fn reconcile_user(&self, user: &UserRef, team_id: &TeamId) -> Report {
        let mut report = ReportBuilder::new();
        let result = match self.resolve_user(user).await {
            Ok(resolved) => self.reconcile_resolved(&resolved, team_id, &mut report).await,
            Err(e) => Err(e),
        };
        Self::finish(report, result)
    }

    async fn reconcile_resolved(
        &self,
        user: &RemoteUser,
        team_id: &TeamId,
        report: &mut ReportBuilder,
    ) -> Result<(), ReconcileError> {
        tracing::info!(user = %user.username, team = %team_id, "reconciling user");
        let scope = self.scope(&user.id, team_id);

        SubscriptionReconciler::new(scope).ensure_subscribed(report).await;
        CategoryReconciler::new(scope).ensure_categorized(report).await?;
        OrderReconciler::new(scope).apply_order(report).await
    }

    /// Only join the user to missing declared channels
    pub async fn ensure_subscribed(&self, user: &UserRef, team_id: &TeamId) -> Report {
        let mut report = ReportBuilder::new();
        let result = match self.resolve_user(user).await {
            Ok(resolved) => {
                SubscriptionReconciler::new(self.scope(&resolved.id, team_id))
                    .ensure_subscribed(&mut report)
                    .await;
                Ok(())
            }
            Err(e) => Err(e),
        };
        Self::finish(report, result)
    }

    /// Only create and fill declared categories
    pub async fn ensure_categorized(&self, user: &UserRef, team_id: &TeamId) -> Report {
        let mut report = ReportBuilder::new();
        let result = match self.resolve_user(user).await {
            Ok(resolved) => {
                CategoryReconciler::new(self.scope(&resolved.id, team_id))
                    .ensure_categorized(&mut report)
                    .await
            }
            Err(e) => Err(e),
        };
        Self::finish(report, result)
    }

    /// Only apply the declared category and channel order
    pub async fn apply_order(&self, user: &UserRef, team_id: &TeamId) -> Report {
        let mut report = ReportBuilder::new();
        let result = match self.resolve_user(user).await {
            Ok(resolved) => {
                OrderReconciler::new(self.scope(&resolved.id, team_id))
                    .apply_order(&mut report)
                    .await
            }
            Err(e) => Err(e),
        };
        Self::finish(report, result)
    }

    /// Move declared categories to the top of the sidebar
    pub async fn set_category_order(&self, user: &UserRef, team_id: &TeamId) -> Report {
        let mut report = ReportBuilder::new();
        let result = match self.resolve_user(user).await {
            Ok(resolved) => {
                OrderReconciler::new(self.scope(&resolved.id, team_id))
                    .apply_positions(&mut report)
                    .await
            }
            Err(e) => Err(e),
        };
        Self::finish(report, result)
    }

    /// Delete every non-default category of a user
    pub async fn purge_user(&self, user: &UserRef, team_id: &TeamId) -> Report {
        let mut report = ReportBuilder::new();
        let result = match self.resolve_user(user).await {
            Ok(resolved) => {
                tracing::info!(user = %resolved.username, team = %team_id, "purging user");
                CategoryPurger::new(self.scope(&resolved.id, team_id))
                    .purge_non_default_categories(&mut report)
                    .await
            }
            Err(e) => Err(e),
        };
        Self::finish(report, result)
    }

    /// Reconcile every team member, one after another
    ///
    /// A member whose run aborts is recorded in their section; the next
    /// member is still processed. Only a failed member listing aborts the
    /// team run.
    pub async fn reconcile_team(&self, team_id: &TeamId) -> Report {
        let mut report = ReportBuilder::new();
        let result = self.reconcile_members(team_id, &mut report).await;
        Self::finish(report, result)
    }

    async fn reconcile_members(&self, team_id: &TeamId, report: &mut ReportBuilder) -> Result<(), ReconcileError> {
        let members = self.fetcher().list_team_members(team_id).await?;
        tracing::info!(team = %team_id, members = members.len(), "reconciling team");

        for member in members {
            let mut nested = ReportBuilder::new();
            let result = self.reconcile_resolved(&member, team_id, &mut nested).await;
            if let Err(error) = &result {
                tracing::error!(user = %member.username, %error, "member run aborted, continuing");
            }
            report.merge(
                format!("User: **{}**", member.username),
                &member.username,
                Self::finish(nested, result),
            );
        }
        Ok(())
    }

    /// Check one user's sidebar without changing it
    pub async fn audit_user(&self, user: &UserRef, team_id: &TeamId) -> UserAudit {
        let mut report = ReportBuilder::new();
        let result = match self.resolve_user(user).await {
            Ok(resolved) => {
                report.section(format!("User: **{}**", resolved.username));
                self.audit_resolved(&resolved, team_id, &mut report).await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(findings) => UserAudit {
                report: report.build(),
                findings: Some(findings),
            },
            Err(e) => UserAudit {
                report: Self::finish(report, Err(e)),
                findings: None,
            },
        }
    }

    async fn audit_resolved(
        &self,
        user: &RemoteUser,
        team_id: &TeamId,
        report: &mut ReportBuilder,
    ) -> Result<AuditFindings, ReconcileError> {
        SidebarAuditor::new(self.scope(&user.id, team_id)).audit(report).await
    }

    /// Check every team member's sidebar
    pub async fn audit_team(&self, team_id: &TeamId) -> Report {
        let mut report = ReportBuilder::new();
        let result = self.audit_members(team_id, &mut report).await;
        Self::finish(report, result)
    }

    async fn audit_members(&self, team_id: &TeamId, report: &mut ReportBuilder) -> Result<(), ReconcileError> {
        let members = self.fetcher().list_team_members(team_id).await?;
        tracing::info!(team = %team_id, members = members.len(), "auditing team");

        for member in members {
            let mut nested = ReportBuilder::new();
            let result = self
                .audit_resolved(&member, team_id, &mut nested)
                .await
                .map(|_| ());
            report.merge(
                format!("User: **{}**", member.username),
                &member.username,
                Self::finish(nested, result),
            );
        }
        Ok(())
    }

    /// Create every declared channel in the team
    pub async fn create_default_channels(&self, team_id: &TeamId) -> Report {
        let mut report = ReportBuilder::new();
        ChannelProvisioner::new(self.port.as_ref(), &self.taxonomy)
            .create_default_channels(team_id, &mut report)
            .await;
        report.build()
    }

    /// List the display names of the team's public channels
    pub async fn list_channels(&self, team_id: &TeamId) -> Report {
        let mut report = ReportBuilder::new();
        let result = match self.fetcher().list_channels(team_id).await {
            Ok(channels) => {
                for channel in channels {
                    report.line(channel.display_name);
                }
                Ok(())
            }
            Err(e) => Err(e),
        };
        Self::finish(report, result)
    }
}
