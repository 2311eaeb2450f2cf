//! Taxon Remote
//!
//! The narrow capability set the reconciliation engine consumes from the
//! chat platform, plus an HTTP implementation of it.
//!
//! # Architecture
//!
//! ```text
//! taxon-reconcile ──> dyn RemotePort ──> HttpRemote ──> {server}/api/v4/...
//!                                   └──> FakePlatform (tests)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use taxon_remote::{HttpConfig, HttpRemote, RemotePort};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let remote = HttpRemote::new(HttpConfig::new("http://localhost:8065", "token"))?;
//! let user = remote.get_user_by_username("boris").await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod http;
pub mod port;

pub use error::RemoteError;
pub use http::{HttpConfig, HttpRemote};
pub use port::RemotePort;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
