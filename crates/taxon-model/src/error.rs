//! Taxonomy validation errors

/// Errors raised while assembling a [`Taxonomy`](crate::Taxonomy)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaxonomyError {
    /// Category name declared twice
    #[error("duplicate category: {0}")]
    DuplicateCategory(String),

    /// Channel declared twice inside one category
    #[error("duplicate channel '{channel}' in category '{category}'")]
    DuplicateChannel {
        /// Category holding the duplicate
        category: String,
        /// Repeated channel display name
        channel: String,
    },

    /// Category name is empty or whitespace
    #[error("category name must not be empty")]
    EmptyCategoryName,

    /// Order list names a category with no channel list
    #[error("category '{0}' is ordered but not declared")]
    UndeclaredInOrder(String),

    /// Category has a channel list but is missing from the order list
    #[error("category '{0}' is declared but missing from the order")]
    MissingFromOrder(String),
}
