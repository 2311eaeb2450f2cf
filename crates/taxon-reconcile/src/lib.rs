//! Taxon Reconcile
//!
//! Drives each member's sidebar toward the declared taxonomy:
//! - Joins the user to every declared channel
//! - Creates missing categories and appends their declared channels
//! - Applies declared category positions and channel order in one batch
//! - Purges, audits and provisions around that pipeline
//!
//! Every run re-reads remote state; nothing is cached between runs.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use taxon_reconcile::{Reconciler, UserRef};
//!
//! let engine = Reconciler::new(port, taxonomy);
//! let report = engine.reconcile_user(&UserRef::username("boris"), &team).await;
//! println!("{}", report.text());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod audit;
pub mod category;
pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod order;
pub mod provision;
pub mod purge;
pub mod report;
pub mod scope;
pub mod subscription;

pub use audit::{AuditFindings, Miscategorized, SidebarAuditor};
pub use category::CategoryReconciler;
pub use config::EngineConfig;
pub use engine::{Reconciler, UserAudit, UserRef};
pub use error::ReconcileError;
pub use fetch::RemoteStateFetcher;
pub use order::OrderReconciler;
pub use provision::ChannelProvisioner;
pub use purge::CategoryPurger;
pub use report::{Outcome, OutcomeKind, Report, ReportBuilder, Stage};
pub use scope::Scope;
pub use subscription::SubscriptionReconciler;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
