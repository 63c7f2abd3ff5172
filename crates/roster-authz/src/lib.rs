//! Rank-based authorization primitives shared by the recordkeeper service.
//!
//! # Purpose
//! Maps the fixed officer rank hierarchy onto numeric levels and decides
//! whether a resolved caller may perform a mutating operation on officer or
//! report records.
//!
//! # How it fits
//! The service resolves a caller identity from a session credential, then asks
//! [`MutationAuthorizer::authorize`] for a decision before touching the store.
//! This crate performs no I/O.
//!
//! # Key invariants
//! - Every [`Rank`] has exactly one level and no two ranks share a level.
//! - Level comparisons are the only authorization signal; there are no roles
//!   or per-record grants.
//! - An unresolved caller is rejected before any rank rule runs.
//!
//! # Examples
//! ```rust
//! use roster_authz::{Mutation, MutationAuthorizer, PermissionEvaluator, Rank, RankLevels};
//!
//! let authorizer = MutationAuthorizer::new(PermissionEvaluator::new(RankLevels::default()));
//! assert!(authorizer.authorize(None, &Mutation::CreateReport).is_err());
//! ```

mod authorizer;
mod errors;
mod evaluator;
mod identity;
mod rank;

pub use authorizer::{ADMIN_THRESHOLD, Mutation, MutationAuthorizer};
pub use errors::{AuthzError, AuthzResult, DenyReason};
pub use evaluator::PermissionEvaluator;
pub use identity::Identity;
pub use rank::{Rank, RankLevels};
