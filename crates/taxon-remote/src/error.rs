//! Remote call errors

/// Failure of a single remote call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The addressed entity does not exist
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Entity kind ("channel", "user", ...)
        entity: &'static str,
        /// Lookup key that missed
        key: String,
    },

    /// The platform refused the request
    #[error("request rejected with status {status}: {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Platform error message
        message: String,
    },

    /// The request never produced a response
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body could not be decoded
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Create a not-found error
    #[inline]
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    /// Create a rejection error
    #[inline]
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Check if the error is a lookup miss
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
