//! Record store traits and backends.
//!
//! # Purpose
//! Defines the storage contract the record service depends on: officer CRUD,
//! report reads and deletes, paged listings, and an explicit transaction type
//! through which every report write and association change flows.
//!
//! # Key invariants
//! - Phone numbers and report numbers are unique; violations surface as
//!   [`StoreError::Conflict`].
//! - A `(report, officer)` association exists at most once and only while
//!   both records exist; deletes cascade.
//! - Inserting an association for an unknown officer fails with
//!   [`StoreError::Integrity`].
//! - A [`StoreTransaction`] dropped without [`StoreTransaction::commit`]
//!   leaves no trace.
use crate::model::{
    Officer, OfficerSummary, OfficerUpdate, Page, PageRequest, Report, ReportFields, ReportFilter,
    ReportView,
};
use async_trait::async_trait;
use roster_common::ids::{OfficerId, ReportId};
use std::collections::BTreeSet;
use thiserror::Error;

pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("integrity violation: {0}")]
    Integrity(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unexpected(err.into())
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Unexpected(err.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_officer(&self, id: OfficerId) -> StoreResult<Option<Officer>>;
    async fn find_officer_by_phone(&self, phone: &str) -> StoreResult<Option<Officer>>;
    /// Stored credential hash for the officer with `phone`.
    async fn password_hash(&self, phone: &str) -> StoreResult<Option<String>>;
    async fn create_officer(&self, officer: Officer, password_hash: String)
    -> StoreResult<Officer>;
    /// Update the officer currently registered under `phone`.
    async fn update_officer(&self, phone: &str, update: OfficerUpdate) -> StoreResult<Officer>;
    async fn delete_officer(&self, phone: &str) -> StoreResult<()>;
    /// Officers ordered by full name, each with their newest report.
    async fn list_officers(&self, page: PageRequest) -> StoreResult<Page<OfficerSummary>>;

    async fn find_report(&self, report_number: i64) -> StoreResult<Option<Report>>;
    async fn delete_report(&self, report_number: i64) -> StoreResult<()>;
    /// Reports newest first, each with its officers ordered by full name.
    async fn list_reports(
        &self,
        filter: &ReportFilter,
        page: PageRequest,
    ) -> StoreResult<Page<ReportView>>;

    /// Open an atomic unit of work for report writes.
    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>>;

    async fn health_check(&self) -> StoreResult<()>;
    fn is_durable(&self) -> bool;
    fn backend_name(&self) -> &'static str;
}

/// Report writes and association changes inside one atomic unit.
#[async_trait]
pub trait StoreTransaction: Send {
    async fn find_report(&mut self, report_number: i64) -> StoreResult<Option<Report>>;
    async fn insert_report(&mut self, report: Report) -> StoreResult<Report>;
    async fn update_report(&mut self, id: ReportId, fields: ReportFields) -> StoreResult<Report>;
    async fn report_officers(&mut self, id: ReportId) -> StoreResult<BTreeSet<OfficerId>>;
    /// Associate `officers` with the report. An empty set is a no-op.
    async fn insert_report_officers(
        &mut self,
        id: ReportId,
        officers: &BTreeSet<OfficerId>,
    ) -> StoreResult<()>;
    /// Remove the associations for `officers`. An empty set is a no-op.
    async fn delete_report_officers(
        &mut self,
        id: ReportId,
        officers: &BTreeSet<OfficerId>,
    ) -> StoreResult<()>;
    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
