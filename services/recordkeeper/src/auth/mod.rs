//! Caller authentication for the recordkeeper API.
//!
//! # Purpose
//! Resolves the `authorization` header into a [`roster_authz::Identity`]
//! (session tokens checked against the officer table) and hashes officer
//! passwords before they reach the store.
pub mod identity;
pub mod password;
pub mod session;
