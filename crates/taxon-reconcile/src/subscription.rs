//! Channel membership stage
//!
//! Best effort: every declared channel is visited, and lookup or join
//! failures become report lines without stopping the pass.

use crate::error::ReconcileError;
use crate::report::{OutcomeKind, ReportBuilder, Stage};
use crate::scope::Scope;

/// Makes the user a member of every declared channel
pub struct SubscriptionReconciler<'a> {
    scope: Scope<'a>,
}

impl<'a> SubscriptionReconciler<'a> {
    /// Create the stage
    #[must_use]
    pub fn new(scope: Scope<'a>) -> Self {
        Self { scope }
    }

    /// Join every declared channel the user is missing
    pub async fn ensure_subscribed(&self, report: &mut ReportBuilder) {
        let Scope {
            port,
            taxonomy,
            user_id,
            team_id,
            ..
        } = self.scope;
        let fetcher = self.scope.fetcher();

        tracing::info!(user = %user_id, team = %team_id, "ensuring channel subscriptions");

        for display_name in taxonomy.channel_names() {
            let channel = match fetcher.resolve_channel(team_id, display_name).await {
                Ok(channel) => channel,
                Err(e) if e.is_not_found() => {
                    tracing::warn!(channel = display_name, "declared channel does not exist");
                    report.fail(
                        Stage::Subscription,
                        display_name,
                        OutcomeKind::ChannelNotFound,
                        ReconcileError::not_found("channel", display_name),
                        format!("Channel not found: {display_name}"),
                    );
                    continue;
                }
                Err(e) => {
                    tracing::warn!(channel = display_name, error = %e, "channel lookup failed");
                    let line = format!("Failed to look up channel {display_name}: {e}");
                    report.fail(
                        Stage::Subscription,
                        display_name,
                        OutcomeKind::LookupFailed,
                        ReconcileError::unavailable("channel", e),
                        line,
                    );
                    continue;
                }
            };

            match port.get_channel_member(&channel.id, user_id).await {
                Ok(_) => {
                    tracing::debug!(channel = display_name, "already a member");
                    report.record(
                        Stage::Subscription,
                        display_name,
                        OutcomeKind::AlreadyMember,
                        format!("User is already a member of channel: {display_name}"),
                    );
                }
                Err(miss) => {
                    if !miss.is_not_found() {
                        tracing::debug!(channel = display_name, error = %miss, "membership check failed, joining anyway");
                    }
                    report.line(format!(
                        "User is not a member of {display_name}. Adding to channel..."
                    ));

                    match port.add_channel_member(&channel.id, user_id).await {
                        Ok(_) => {
                            tracing::debug!(channel = display_name, "joined channel");
                            report.record(
                                Stage::Subscription,
                                display_name,
                                OutcomeKind::Joined,
                                format!("Successfully added user to channel: {display_name}"),
                            );
                        }
                        Err(e) => {
                            tracing::warn!(channel = display_name, error = %e, "join rejected");
                            let line = format!("Failed to add user to channel: {display_name} ({e})");
                            report.fail(
                                Stage::Subscription,
                                display_name,
                                OutcomeKind::JoinFailed,
                                ReconcileError::mutation("add user to", display_name, e),
                                line,
                            );
                        }
                    }
                }
            }
        }
    }
}
