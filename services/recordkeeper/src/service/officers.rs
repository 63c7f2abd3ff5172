use super::{ConflictKind, RecordService, ServiceError, ServiceResult, conflict_or};
use crate::auth::password::hash_password_blocking;
use crate::model::{Officer, OfficerSummary, OfficerUpdate, Page, PageRequest};
use chrono::Utc;
use roster_authz::{Mutation, Rank};
use roster_common::MaskedPhone;
use roster_common::ids::OfficerId;

/// Fields for registering a new officer.
#[derive(Debug, Clone)]
pub struct OfficerDraft {
    pub full_name: String,
    pub phone: String,
    pub rank: Rank,
    pub password: String,
}

/// Requested changes to an officer record.
#[derive(Debug, Clone)]
pub struct OfficerChanges {
    pub full_name: String,
    pub phone: String,
    pub rank: Option<Rank>,
    pub password: Option<String>,
}

impl RecordService {
    pub async fn list_officers(&self, page: PageRequest) -> ServiceResult<Page<OfficerSummary>> {
        Ok(self.store.list_officers(page).await?)
    }

    pub async fn create_officer(
        &self,
        credential: &str,
        draft: OfficerDraft,
    ) -> ServiceResult<Officer> {
        let caller = self.authorized(credential, Mutation::CreateOfficer).await?;
        if self.store.find_officer_by_phone(&draft.phone).await?.is_some() {
            return Err(ServiceError::Conflict(ConflictKind::OfficerAlreadyRegistered));
        }
        let officer = Officer {
            id: OfficerId::new(),
            full_name: draft.full_name,
            phone: draft.phone,
            rank: draft.rank,
            created_at: Utc::now(),
        };
        let password_hash = hash_password_blocking(draft.password).await?;
        let created = self
            .store
            .create_officer(officer, password_hash)
            .await
            .map_err(|err| {
                conflict_or(
                    err,
                    ConflictKind::OfficerAlreadyRegistered,
                    ConflictKind::OfficerNotFound,
                )
            })?;
        tracing::info!(
            officer_id = %created.id,
            phone = %MaskedPhone(&created.phone),
            rank = %created.rank,
            by = %caller.officer_id,
            "officer registered"
        );
        Ok(created)
    }

    /// Update the officer registered under `target_phone`.
    ///
    /// The target lookup happens after the caller is resolved and before any
    /// rank rule, so a missing target is reported even to callers who could
    /// not have edited it.
    pub async fn update_officer(
        &self,
        credential: &str,
        target_phone: &str,
        changes: OfficerChanges,
    ) -> ServiceResult<Officer> {
        let caller = self.resolve_caller(credential).await?;
        if self.store.find_officer_by_phone(target_phone).await?.is_none() {
            return Err(ServiceError::Conflict(ConflictKind::OfficerNotFound));
        }
        self.authorize(
            &caller,
            &Mutation::UpdateOfficer {
                target_phone,
                rank: changes.rank,
                sets_password: changes.password.is_some(),
            },
        )?;
        let password_changed = changes.password.is_some();
        let password_hash = match changes.password {
            Some(password) => Some(hash_password_blocking(password).await?),
            None => None,
        };
        let update = OfficerUpdate {
            full_name: changes.full_name,
            phone: changes.phone,
            rank: changes.rank,
            password_hash,
        };
        let updated = self
            .store
            .update_officer(target_phone, update)
            .await
            .map_err(|err| {
                conflict_or(
                    err,
                    ConflictKind::OfficerAlreadyRegistered,
                    ConflictKind::OfficerNotFound,
                )
            })?;
        tracing::info!(
            officer_id = %updated.id,
            by = %caller.officer_id,
            password_changed,
            "officer updated"
        );
        Ok(updated)
    }

    pub async fn delete_officer(&self, credential: &str, phone: &str) -> ServiceResult<()> {
        let caller = self.authorized(credential, Mutation::DeleteOfficer).await?;
        self.store.delete_officer(phone).await.map_err(|err| {
            conflict_or(
                err,
                ConflictKind::OfficerNotFound,
                ConflictKind::OfficerNotFound,
            )
        })?;
        tracing::info!(phone = %MaskedPhone(phone), by = %caller.officer_id, "officer deleted");
        Ok(())
    }
}
