//! Error types for the reconciliation engine
//!
//! Three failure kinds come out of a run:
//! - `RemoteUnavailable`: a fetch failed, the run cannot trust its view
//! - `EntityNotFound`: a lookup missed (tolerated except while ordering)
//! - `MutationFailed`: the platform rejected a change (always tolerated,
//!   kept on the item's report outcome)

use taxon_remote::RemoteError;

/// Main engine error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    /// A fetch of remote state failed
    #[error("unable to retrieve {what}: {source}")]
    RemoteUnavailable {
        /// What was being fetched ("public channels", "team members", ...)
        what: &'static str,
        /// Underlying remote failure
        source: RemoteError,
    },

    /// A user, channel or category could not be found
    #[error("{entity} not found: {name}")]
    EntityNotFound {
        /// Entity kind
        entity: &'static str,
        /// Name or id that missed
        name: String,
    },

    /// The platform rejected a mutation
    #[error("failed to {action} {item}: {source}")]
    MutationFailed {
        /// Attempted action ("add member to", "update category", ...)
        action: &'static str,
        /// Target of the action
        item: String,
        /// Underlying remote failure
        source: RemoteError,
    },
}

impl ReconcileError {
    /// Create a fetch failure
    #[inline]
    pub fn unavailable(what: &'static str, source: RemoteError) -> Self {
        Self::RemoteUnavailable { what, source }
    }

    /// Create a lookup miss
    #[inline]
    pub fn not_found(entity: &'static str, name: impl Into<String>) -> Self {
        Self::EntityNotFound {
            entity,
            name: name.into(),
        }
    }

    /// Create a rejected mutation
    #[inline]
    pub fn mutation(action: &'static str, item: impl Into<String>, source: RemoteError) -> Self {
        Self::MutationFailed {
            action,
            item: item.into(),
            source,
        }
    }

    /// Check if the error aborts a run when raised
    ///
    /// Callers decide whether a lookup miss is raised at all; once raised,
    /// it aborts. Rejected mutations never do.
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::MutationFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        let fetch = ReconcileError::unavailable(
            "team members",
            RemoteError::Transport("connection reset".into()),
        );
        assert!(fetch.is_fatal());

        let rejected = ReconcileError::mutation(
            "update category",
            "Racing",
            RemoteError::rejected(500, "boom"),
        );
        assert!(!rejected.is_fatal());
        assert_eq!(
            rejected.to_string(),
            "failed to update category Racing: request rejected with status 500: boom"
        );

        assert!(ReconcileError::not_found("category", "Racing").is_fatal());
    }

    #[test]
    fn display_carries_context() {
        let err = ReconcileError::not_found("category", "Racing");
        assert_eq!(err.to_string(), "category not found: Racing");

        let err = ReconcileError::unavailable(
            "public channels",
            RemoteError::Transport("connection reset".into()),
        );
        assert_eq!(
            err.to_string(),
            "unable to retrieve public channels: transport error: connection reset"
        );
    }
}
