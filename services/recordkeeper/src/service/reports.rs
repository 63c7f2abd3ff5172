use super::{ConflictKind, RecordService, ServiceError, ServiceResult, conflict_or};
use crate::model::{Page, PageRequest, Report, ReportFields, ReportFilter, ReportView};
use crate::observability;
use crate::store::StoreError;
use crate::sync;
use chrono::Utc;
use roster_authz::Mutation;
use roster_common::ids::{OfficerId, ReportId};
use std::collections::BTreeSet;

/// Fields for filing a new report.
#[derive(Debug, Clone)]
pub struct ReportDraft {
    pub report_number: i64,
    pub title: String,
    pub description: String,
    pub officers: BTreeSet<OfficerId>,
}

/// Replacement contents for an existing report.
#[derive(Debug, Clone)]
pub struct ReportRevision {
    /// New report number; `None` keeps the current one.
    pub report_number: Option<i64>,
    pub title: String,
    pub description: String,
    pub officers: BTreeSet<OfficerId>,
}

impl RecordService {
    pub async fn list_reports(
        &self,
        filter: &ReportFilter,
        page: PageRequest,
    ) -> ServiceResult<Page<ReportView>> {
        Ok(self.store.list_reports(filter, page).await?)
    }

    /// File a report and its officer associations in one transaction.
    pub async fn create_report(
        &self,
        credential: &str,
        draft: ReportDraft,
    ) -> ServiceResult<Report> {
        let caller = self.authorized(credential, Mutation::CreateReport).await?;
        let already_exists = |err: StoreError| {
            conflict_or(
                err,
                ConflictKind::ReportAlreadyExists,
                ConflictKind::ReportNotFound,
            )
        };

        let mut tx = self.store.begin().await?;
        if tx.find_report(draft.report_number).await?.is_some() {
            return Err(ServiceError::Conflict(ConflictKind::ReportAlreadyExists));
        }
        let report = tx
            .insert_report(Report {
                id: ReportId::new(),
                report_number: draft.report_number,
                title: draft.title,
                description: draft.description,
                created_at: Utc::now(),
            })
            .await
            .map_err(already_exists)?;
        sync::reconcile(tx.as_mut(), report.id, &draft.officers).await?;
        tx.commit().await?;

        metrics::counter!(observability::REPORT_CHANGES, "op" => "created").increment(1);
        tracing::info!(
            report_number = report.report_number,
            officers = draft.officers.len(),
            by = %caller.officer_id,
            "report filed"
        );
        Ok(report)
    }

    /// Revise a report: scalar fields, optional renumbering, and the officer
    /// set, all committed together or not at all.
    pub async fn update_report(
        &self,
        credential: &str,
        report_number: i64,
        revision: ReportRevision,
    ) -> ServiceResult<Report> {
        let caller = self.authorized(credential, Mutation::UpdateReport).await?;

        let mut tx = self.store.begin().await?;
        let Some(current) = tx.find_report(report_number).await? else {
            return Err(ServiceError::Conflict(ConflictKind::ReportNotFound));
        };
        let new_number = revision.report_number.unwrap_or(report_number);
        if new_number != report_number && tx.find_report(new_number).await?.is_some() {
            return Err(ServiceError::Conflict(ConflictKind::ReportAlreadyExists));
        }
        let delta = sync::reconcile(tx.as_mut(), current.id, &revision.officers).await?;
        let updated = tx
            .update_report(
                current.id,
                ReportFields {
                    report_number: new_number,
                    title: revision.title,
                    description: revision.description,
                },
            )
            .await
            .map_err(|err| {
                conflict_or(
                    err,
                    ConflictKind::ReportAlreadyExists,
                    ConflictKind::ReportNotFound,
                )
            })?;
        tx.commit().await?;

        metrics::counter!(observability::REPORT_CHANGES, "op" => "updated").increment(1);
        tracing::info!(
            report_number = updated.report_number,
            previous_number = report_number,
            removed = delta.to_remove.len(),
            added = delta.to_add.len(),
            by = %caller.officer_id,
            "report updated"
        );
        Ok(updated)
    }

    pub async fn delete_report(&self, credential: &str, report_number: i64) -> ServiceResult<()> {
        let caller = self.authorized(credential, Mutation::DeleteReport).await?;
        self.store.delete_report(report_number).await.map_err(|err| {
            conflict_or(
                err,
                ConflictKind::ReportNotFound,
                ConflictKind::ReportNotFound,
            )
        })?;
        tracing::info!(report_number, by = %caller.officer_id, "report deleted");
        Ok(())
    }
}
