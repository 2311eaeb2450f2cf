//! Channel provisioning

use crate::error::ReconcileError;
use crate::report::{OutcomeKind, ReportBuilder, Stage};
use std::collections::HashSet;
use taxon_model::{NewChannel, Taxonomy, TeamId};
use taxon_remote::RemotePort;

/// Creates the declared channels in a team
pub struct ChannelProvisioner<'a> {
    port: &'a dyn RemotePort,
    taxonomy: &'a Taxonomy,
}

impl<'a> ChannelProvisioner<'a> {
    /// Create the provisioner
    #[must_use]
    pub fn new(port: &'a dyn RemotePort, taxonomy: &'a Taxonomy) -> Self {
        Self { port, taxonomy }
    }

    /// Create an open channel for every declared channel name
    ///
    /// Channels declared in several categories are created once. Failures,
    /// including channels that already exist, are reported per channel.
    pub async fn create_default_channels(&self, team_id: &TeamId, report: &mut ReportBuilder) {
        tracing::info!(team = %team_id, "creating declared channels");

        let mut seen = HashSet::new();
        for display_name in self.taxonomy.channel_names() {
            if !seen.insert(display_name) {
                continue;
            }

            let request = NewChannel::open(team_id.clone(), display_name);
            match self.port.create_channel(&request).await {
                Ok(channel) => {
                    tracing::debug!(channel = display_name, id = %channel.id, "created channel");
                    report.record(
                        Stage::Provisioning,
                        display_name,
                        OutcomeKind::ChannelCreated,
                        format!("Created channel: {display_name}"),
                    );
                }
                Err(e) => {
                    tracing::warn!(channel = display_name, error = %e, "channel creation rejected");
                    let line = format!("Failed to create channel {display_name}: {e}");
                    report.fail(
                        Stage::Provisioning,
                        display_name,
                        OutcomeKind::ChannelCreateFailed,
                        ReconcileError::mutation("create channel", display_name, e),
                        line,
                    );
                }
            }
        }
    }
}
