//! Record service: authorization, synchronization and storage in one place.
//!
//! # Purpose
//! Every mutating operation runs the same pipeline: resolve the caller from
//! the credential, let the [`MutationAuthorizer`] decide, then touch the
//! store. Report writes additionally go through [`crate::sync`] inside one
//! store transaction.
//!
//! # Key invariants
//! - An unresolvable caller fails with [`ServiceError::CallerNotFound`]
//!   before any rank rule or store lookup of the target runs.
//! - Store conflicts are reported with the operation's [`ConflictKind`],
//!   never as a generic failure.
//! - While a report transaction is open no other store call is made.
mod officers;
mod reports;

pub use officers::{OfficerChanges, OfficerDraft};
pub use reports::{ReportDraft, ReportRevision};

use crate::auth::identity::IdentityResolver;
use crate::auth::password::PasswordError;
use crate::observability;
use crate::store::{RecordStore, StoreError};
use roster_authz::{AuthzError, DenyReason, Identity, Mutation, MutationAuthorizer};
use std::sync::Arc;
use thiserror::Error;

/// Business conflicts, each with a stable client-facing code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    OfficerAlreadyRegistered,
    OfficerNotFound,
    ReportAlreadyExists,
    ReportNotFound,
}

impl ConflictKind {
    pub fn code(&self) -> &'static str {
        match self {
            ConflictKind::OfficerAlreadyRegistered => "officer_exists",
            ConflictKind::OfficerNotFound => "officer_not_found",
            ConflictKind::ReportAlreadyExists => "report_exists",
            ConflictKind::ReportNotFound => "report_not_found",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ConflictKind::OfficerAlreadyRegistered => "officer already registered",
            ConflictKind::OfficerNotFound => "officer not found",
            ConflictKind::ReportAlreadyExists => "report already exists",
            ConflictKind::ReportNotFound => "report not found",
        }
    }
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("caller not found")]
    CallerNotFound,
    #[error("forbidden: {0}")]
    Forbidden(DenyReason),
    #[error("conflict: {0}")]
    Conflict(ConflictKind),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Credential(#[from] PasswordError),
}

impl From<AuthzError> for ServiceError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::CallerNotFound => ServiceError::CallerNotFound,
            AuthzError::Forbidden(reason) => ServiceError::Forbidden(reason),
            other => ServiceError::Store(StoreError::Unexpected(other.into())),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Map a store error, turning uniqueness and absence into `ConflictKind`s.
fn conflict_or(err: StoreError, on_conflict: ConflictKind, on_missing: ConflictKind) -> ServiceError {
    match err {
        StoreError::Conflict(_) => ServiceError::Conflict(on_conflict),
        StoreError::NotFound(_) => ServiceError::Conflict(on_missing),
        other => ServiceError::Store(other),
    }
}

pub struct RecordService {
    store: Arc<dyn RecordStore>,
    resolver: Arc<dyn IdentityResolver>,
    authorizer: MutationAuthorizer,
}

impl RecordService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        resolver: Arc<dyn IdentityResolver>,
        authorizer: MutationAuthorizer,
    ) -> Self {
        Self {
            store,
            resolver,
            authorizer,
        }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub async fn health_check(&self) -> ServiceResult<()> {
        Ok(self.store.health_check().await?)
    }

    async fn resolve_caller(&self, credential: &str) -> ServiceResult<Identity> {
        self.resolver
            .resolve(credential)
            .await?
            .ok_or(ServiceError::CallerNotFound)
    }

    fn authorize(&self, caller: &Identity, mutation: &Mutation<'_>) -> ServiceResult<()> {
        match self.authorizer.authorize(Some(caller), mutation) {
            Ok(_) => Ok(()),
            Err(AuthzError::Forbidden(reason)) => {
                metrics::counter!(observability::AUTHZ_DENIALS, "reason" => reason.as_str())
                    .increment(1);
                tracing::info!(
                    officer_id = %caller.officer_id,
                    rank = %caller.rank,
                    operation = mutation.name(),
                    reason = reason.as_str(),
                    "mutation denied"
                );
                Err(ServiceError::Forbidden(reason))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Resolve the caller and authorize a mutation that needs no target lookup.
    async fn authorized(&self, credential: &str, mutation: Mutation<'_>) -> ServiceResult<Identity> {
        let caller = self.resolve_caller(credential).await?;
        self.authorize(&caller, &mutation)?;
        Ok(caller)
    }
}
