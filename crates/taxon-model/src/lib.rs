//! Taxon Model
//!
//! Pure data for sidebar taxonomy reconciliation:
//! - The declared taxonomy (ordered categories, each with ordered channels)
//! - Remote platform entities (channels, users, sidebar categories)
//! - Identifier newtypes shared by every other crate
//!
//! Nothing here performs I/O.
//!
//! # Example
//!
//! ```rust
//! use taxon_model::{Category, Taxonomy};
//!
//! let taxonomy = Taxonomy::new(vec![
//!     Category::new("Racing", ["Monday Races", "Kaag Cup"]),
//! ])
//! .unwrap();
//!
//! assert_eq!(taxonomy.category_names().collect::<Vec<_>>(), ["Racing"]);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod entities;
pub mod error;
pub mod ids;
pub mod naming;
pub mod taxonomy;

pub use entities::{
    CategoryKind, CategorySorting, ChannelKind, ChannelMember, NewChannel, NewSidebarCategory,
    RemoteChannel, RemoteUser, SidebarCategory,
};
pub use error::TaxonomyError;
pub use ids::{CategoryId, ChannelId, TeamId, UserId};
pub use naming::channel_name;
pub use taxonomy::{Category, Taxonomy};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
