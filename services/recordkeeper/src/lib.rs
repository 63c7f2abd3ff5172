//! Recordkeeper service library.
//!
//! Officer roster and incident report backend: rank-based authorization of
//! every mutation, transactional report/officer association sync, and the
//! HTTP surface over both. The binary in `main.rs` only wires these together.
pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod model;
pub mod observability;
pub mod service;
pub mod store;
pub mod sync;
