//! In-memory implementation of the record store.
//!
//! # Purpose
//! Keeps officers, reports and report/officer associations in process memory
//! for local development and tests. Nothing survives a restart.
//!
//! # Consistency
//! All tables sit behind a single `tokio::sync::Mutex`. A transaction takes
//! the owned guard and edits a working copy of the tables; `commit` swaps the
//! copy in and dropping the transaction discards it. Concurrent writers are
//! serialized, so two creates racing for the same phone or report number see
//! each other's result and one of them fails with a conflict.
//!
//! # Performance characteristics
//! Lookups by phone or report number scan the tables and every transaction
//! clones them. Both are fine for dev-sized data sets.
use super::{RecordStore, StoreError, StoreResult, StoreTransaction};
use crate::model::{
    Officer, OfficerRef, OfficerSummary, OfficerUpdate, Page, PageRequest, Report, ReportDigest,
    ReportFields, ReportFilter, ReportView,
};
use crate::observability;
use async_trait::async_trait;
use roster_common::ids::{OfficerId, ReportId};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Clone)]
struct OfficerRow {
    officer: Officer,
    password_hash: String,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    officers: HashMap<OfficerId, OfficerRow>,
    reports: HashMap<ReportId, Report>,
    /// Association pairs; the set enforces `(report, officer)` uniqueness.
    report_officers: BTreeSet<(ReportId, OfficerId)>,
}

impl Tables {
    fn officer_by_phone(&self, phone: &str) -> Option<&OfficerRow> {
        self.officers.values().find(|row| row.officer.phone == phone)
    }

    fn report_by_number(&self, report_number: i64) -> Option<&Report> {
        self.reports
            .values()
            .find(|report| report.report_number == report_number)
    }

    fn officers_of(&self, report_id: ReportId) -> impl Iterator<Item = OfficerId> + '_ {
        self.report_officers
            .range((report_id, OfficerId::from_uuid(uuid::Uuid::nil()))..)
            .take_while(move |(report, _)| *report == report_id)
            .map(|(_, officer)| *officer)
    }

    fn last_report_of(&self, officer_id: OfficerId) -> Option<ReportDigest> {
        self.report_officers
            .iter()
            .filter(|(_, officer)| *officer == officer_id)
            .filter_map(|(report, _)| self.reports.get(report))
            .max_by_key(|report| (report.created_at, report.report_number))
            .map(ReportDigest::from)
    }

    fn report_view(&self, report: &Report) -> ReportView {
        let mut officers: Vec<OfficerRef> = self
            .officers_of(report.id)
            .filter_map(|id| self.officers.get(&id))
            .map(|row| OfficerRef {
                id: row.officer.id,
                full_name: row.officer.full_name.clone(),
            })
            .collect();
        officers.sort_by(|a, b| a.full_name.cmp(&b.full_name).then(a.id.cmp(&b.id)));
        ReportView::new(report.clone(), officers)
    }
}

/// Process-local record store.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn find_officer(&self, id: OfficerId) -> StoreResult<Option<Officer>> {
        let tables = self.tables.lock().await;
        Ok(tables.officers.get(&id).map(|row| row.officer.clone()))
    }

    async fn find_officer_by_phone(&self, phone: &str) -> StoreResult<Option<Officer>> {
        let tables = self.tables.lock().await;
        Ok(tables.officer_by_phone(phone).map(|row| row.officer.clone()))
    }

    async fn password_hash(&self, phone: &str) -> StoreResult<Option<String>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .officer_by_phone(phone)
            .map(|row| row.password_hash.clone()))
    }

    async fn create_officer(
        &self,
        officer: Officer,
        password_hash: String,
    ) -> StoreResult<Officer> {
        let mut tables = self.tables.lock().await;
        if tables.officer_by_phone(&officer.phone).is_some()
            || tables.officers.contains_key(&officer.id)
        {
            return Err(StoreError::Conflict("officer exists".into()));
        }
        tables.officers.insert(
            officer.id,
            OfficerRow {
                officer: officer.clone(),
                password_hash,
            },
        );
        metrics::counter!(observability::OFFICER_CHANGES, "op" => "created").increment(1);
        Ok(officer)
    }

    async fn update_officer(&self, phone: &str, update: OfficerUpdate) -> StoreResult<Officer> {
        let mut tables = self.tables.lock().await;
        let id = tables
            .officer_by_phone(phone)
            .map(|row| row.officer.id)
            .ok_or_else(|| StoreError::NotFound("officer".into()))?;
        if update.phone != phone && tables.officer_by_phone(&update.phone).is_some() {
            return Err(StoreError::Conflict("phone in use".into()));
        }
        let row = tables
            .officers
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("officer".into()))?;
        row.officer.full_name = update.full_name;
        row.officer.phone = update.phone;
        if let Some(rank) = update.rank {
            row.officer.rank = rank;
        }
        if let Some(hash) = update.password_hash {
            row.password_hash = hash;
        }
        metrics::counter!(observability::OFFICER_CHANGES, "op" => "updated").increment(1);
        Ok(row.officer.clone())
    }

    async fn delete_officer(&self, phone: &str) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        let id = tables
            .officer_by_phone(phone)
            .map(|row| row.officer.id)
            .ok_or_else(|| StoreError::NotFound("officer".into()))?;
        tables.officers.remove(&id);
        tables
            .report_officers
            .retain(|(_, officer)| *officer != id);
        metrics::counter!(observability::OFFICER_CHANGES, "op" => "deleted").increment(1);
        Ok(())
    }

    async fn list_officers(&self, page: PageRequest) -> StoreResult<Page<OfficerSummary>> {
        let tables = self.tables.lock().await;
        let mut officers: Vec<&Officer> = tables.officers.values().map(|row| &row.officer).collect();
        officers.sort_by(|a, b| a.full_name.cmp(&b.full_name).then(a.id.cmp(&b.id)));
        let summaries = officers
            .into_iter()
            .map(|officer| OfficerSummary::new(officer.clone(), tables.last_report_of(officer.id)))
            .collect();
        Ok(Page::from_sorted(summaries, page))
    }

    async fn find_report(&self, report_number: i64) -> StoreResult<Option<Report>> {
        let tables = self.tables.lock().await;
        Ok(tables.report_by_number(report_number).cloned())
    }

    async fn delete_report(&self, report_number: i64) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        let id = tables
            .report_by_number(report_number)
            .map(|report| report.id)
            .ok_or_else(|| StoreError::NotFound("report".into()))?;
        tables.reports.remove(&id);
        tables.report_officers.retain(|(report, _)| *report != id);
        metrics::counter!(observability::REPORT_CHANGES, "op" => "deleted").increment(1);
        Ok(())
    }

    async fn list_reports(
        &self,
        filter: &ReportFilter,
        page: PageRequest,
    ) -> StoreResult<Page<ReportView>> {
        let tables = self.tables.lock().await;
        let mut reports: Vec<&Report> = tables
            .reports
            .values()
            .filter(|report| {
                filter
                    .report_number
                    .is_none_or(|number| report.report_number == number)
            })
            .filter(|report| {
                filter.officer_id.is_none_or(|officer| {
                    tables.report_officers.contains(&(report.id, officer))
                })
            })
            .collect();
        reports.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.report_number.cmp(&a.report_number))
        });
        let views = reports
            .into_iter()
            .map(|report| tables.report_view(report))
            .collect();
        Ok(Page::from_sorted(views, page))
    }

    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, working }))
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Holds the table lock for its whole lifetime and edits a private copy.
struct MemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn find_report(&mut self, report_number: i64) -> StoreResult<Option<Report>> {
        Ok(self.working.report_by_number(report_number).cloned())
    }

    async fn insert_report(&mut self, report: Report) -> StoreResult<Report> {
        if self.working.report_by_number(report.report_number).is_some()
            || self.working.reports.contains_key(&report.id)
        {
            return Err(StoreError::Conflict("report exists".into()));
        }
        self.working.reports.insert(report.id, report.clone());
        Ok(report)
    }

    async fn update_report(&mut self, id: ReportId, fields: ReportFields) -> StoreResult<Report> {
        if self
            .working
            .report_by_number(fields.report_number)
            .is_some_and(|other| other.id != id)
        {
            return Err(StoreError::Conflict("report number in use".into()));
        }
        let report = self
            .working
            .reports
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("report".into()))?;
        report.apply(fields);
        Ok(report.clone())
    }

    async fn report_officers(&mut self, id: ReportId) -> StoreResult<BTreeSet<OfficerId>> {
        Ok(self.working.officers_of(id).collect())
    }

    async fn insert_report_officers(
        &mut self,
        id: ReportId,
        officers: &BTreeSet<OfficerId>,
    ) -> StoreResult<()> {
        if !self.working.reports.contains_key(&id) {
            return Err(StoreError::Integrity(format!("unknown report {id}")));
        }
        if let Some(missing) = officers
            .iter()
            .find(|officer| !self.working.officers.contains_key(officer))
        {
            return Err(StoreError::Integrity(format!("unknown officer {missing}")));
        }
        for officer in officers {
            if !self.working.report_officers.insert((id, *officer)) {
                return Err(StoreError::Conflict("association exists".into()));
            }
        }
        Ok(())
    }

    async fn delete_report_officers(
        &mut self,
        id: ReportId,
        officers: &BTreeSet<OfficerId>,
    ) -> StoreResult<()> {
        for officer in officers {
            self.working.report_officers.remove(&(id, *officer));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTransaction { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
