//! Postgres-backed implementation of the record store.
//!
//! # Data model
//! - `officers`: one row per officer, unique on `phone`.
//! - `reports`: one row per report, unique on `report_number`.
//! - `report_officers`: association rows with a composite primary key and
//!   `ON DELETE CASCADE` foreign keys to both sides.
//!
//! # Consistency / atomicity
//! Report writes go through [`PgStoreTransaction`], a thin wrapper over a
//! `sqlx` transaction. Dropping it without `commit` rolls back, so a failed
//! association insert never leaves a half-applied delta or a scalar update
//! behind. Uniqueness races are settled by the database: the loser sees
//! SQLSTATE 23505 and gets [`StoreError::Conflict`].
//!
//! # Operational notes
//! - Migrations run at startup via `sqlx::migrate!("./migrations")`.
//! - Database URLs may contain credentials; they are never logged.
use super::{RecordStore, StoreError, StoreResult, StoreTransaction};
use crate::config::PostgresConfig;
use crate::model::{
    Officer, OfficerRef, OfficerSummary, OfficerUpdate, Page, PageRequest, Report, ReportDigest,
    ReportFields, ReportFilter, ReportView,
};
use crate::observability;
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use roster_authz::Rank;
use roster_common::ids::{OfficerId, ReportId};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

const OFFICER_COLUMNS: &str = "id, full_name, phone, rank, created_at";
const REPORT_COLUMNS: &str = "id, report_number, title, description, created_at";

/// Durable record store backed by Postgres.
///
/// # Example
/// ```rust,no_run
/// use recordkeeper::config::PostgresConfig;
/// use recordkeeper::store::postgres::PostgresStore;
///
/// async fn open(pg: PostgresConfig) {
///     let _ = PostgresStore::connect(&pg).await;
/// }
/// ```
pub struct PostgresStore {
    pool: PgPool,
}

#[derive(Debug, Clone, FromRow)]
struct DbOfficer {
    id: Uuid,
    full_name: String,
    phone: String,
    rank: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct DbOfficerSummary {
    id: Uuid,
    full_name: String,
    phone: String,
    rank: String,
    created_at: DateTime<Utc>,
    last_report_number: Option<i64>,
    last_report_title: Option<String>,
    last_report_created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow)]
struct DbReport {
    id: Uuid,
    report_number: i64,
    title: String,
    description: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct DbReportOfficer {
    report_id: Uuid,
    officer_id: Uuid,
    full_name: String,
}

impl PostgresStore {
    /// Connect, apply embedded migrations, and return a ready store.
    ///
    /// # Errors
    /// - Connection, pool setup, or migration failures.
    pub async fn connect(pg: &PostgresConfig) -> StoreResult<Self> {
        #[cfg(any(test, feature = "pg-tests"))]
        let _ = Self::connect_without_migrations;
        Self::connect_internal(pg, true).await
    }

    /// Connect without running migrations, for tests that manage the schema.
    #[cfg(any(test, feature = "pg-tests"))]
    pub async fn connect_without_migrations(pg: &PostgresConfig) -> StoreResult<Self> {
        Self::connect_internal(pg, false).await
    }

    async fn connect_internal(pg: &PostgresConfig, run_migrations: bool) -> StoreResult<Self> {
        let connect_options = PgConnectOptions::from_str(&pg.url)?;
        let connect = PgPoolOptions::new()
            .max_connections(pg.max_connections)
            .acquire_timeout(Duration::from_millis(pg.acquire_timeout_ms))
            .connect_with(connect_options);
        let pool = tokio::time::timeout(Duration::from_millis(pg.connect_timeout_ms), connect)
            .await
            .map_err(|_| {
                StoreError::Unexpected(anyhow!(
                    "postgres connect timed out after {}ms",
                    pg.connect_timeout_ms
                ))
            })??;
        if run_migrations {
            sqlx::migrate!("./migrations").run(&pool).await?;
        }
        Ok(Self { pool })
    }
}

#[async_trait]
impl RecordStore for PostgresStore {
    async fn find_officer(&self, id: OfficerId) -> StoreResult<Option<Officer>> {
        let row = sqlx::query_as::<_, DbOfficer>(&format!(
            "SELECT {OFFICER_COLUMNS} FROM officers WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(officer_from_db).transpose()
    }

    async fn find_officer_by_phone(&self, phone: &str) -> StoreResult<Option<Officer>> {
        let row = sqlx::query_as::<_, DbOfficer>(&format!(
            "SELECT {OFFICER_COLUMNS} FROM officers WHERE phone = $1"
        ))
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;
        row.map(officer_from_db).transpose()
    }

    async fn password_hash(&self, phone: &str) -> StoreResult<Option<String>> {
        let hash = sqlx::query_scalar("SELECT password_hash FROM officers WHERE phone = $1")
            .bind(phone)
            .fetch_optional(&self.pool)
            .await?;
        Ok(hash)
    }

    async fn create_officer(
        &self,
        officer: Officer,
        password_hash: String,
    ) -> StoreResult<Officer> {
        let insert = sqlx::query(
            r#"INSERT INTO officers (id, full_name, phone, rank, password_hash, created_at)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(officer.id.as_uuid())
        .bind(&officer.full_name)
        .bind(&officer.phone)
        .bind(officer.rank.as_str())
        .bind(&password_hash)
        .bind(officer.created_at)
        .execute(&self.pool)
        .await;
        if let Err(err) = insert {
            return Err(classify(err, "officer exists"));
        }
        metrics::counter!(observability::OFFICER_CHANGES, "op" => "created").increment(1);
        Ok(officer)
    }

    async fn update_officer(&self, phone: &str, update: OfficerUpdate) -> StoreResult<Officer> {
        let row = sqlx::query_as::<_, DbOfficer>(&format!(
            r#"UPDATE officers
               SET full_name = $2,
                   phone = $3,
                   rank = COALESCE($4, rank),
                   password_hash = COALESCE($5, password_hash)
               WHERE phone = $1
               RETURNING {OFFICER_COLUMNS}"#
        ))
        .bind(phone)
        .bind(&update.full_name)
        .bind(&update.phone)
        .bind(update.rank.map(Rank::as_str))
        .bind(update.password_hash.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| classify(err, "phone in use"))?;
        let row = row.ok_or_else(|| StoreError::NotFound("officer".into()))?;
        metrics::counter!(observability::OFFICER_CHANGES, "op" => "updated").increment(1);
        officer_from_db(row)
    }

    async fn delete_officer(&self, phone: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM officers WHERE phone = $1")
            .bind(phone)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("officer".into()));
        }
        metrics::counter!(observability::OFFICER_CHANGES, "op" => "deleted").increment(1);
        Ok(())
    }

    async fn list_officers(&self, page: PageRequest) -> StoreResult<Page<OfficerSummary>> {
        let (limit, offset) = page_bounds(page)?;
        let rows = sqlx::query_as::<_, DbOfficerSummary>(
            r#"SELECT o.id, o.full_name, o.phone, o.rank, o.created_at,
                      lr.report_number AS last_report_number,
                      lr.title AS last_report_title,
                      lr.created_at AS last_report_created_at
               FROM officers o
               LEFT JOIN LATERAL (
                   SELECT r.report_number, r.title, r.created_at
                   FROM report_officers ro
                   JOIN reports r ON r.id = ro.report_id
                   WHERE ro.officer_id = o.id
                   ORDER BY r.created_at DESC, r.report_number DESC
                   LIMIT 1
               ) lr ON TRUE
               ORDER BY o.full_name, o.id
               LIMIT $1 OFFSET $2"#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM officers")
            .fetch_one(&self.pool)
            .await?;
        let items = rows
            .into_iter()
            .map(summary_from_db)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Page {
            items,
            total_count: total as u64,
        })
    }

    async fn find_report(&self, report_number: i64) -> StoreResult<Option<Report>> {
        let row = sqlx::query_as::<_, DbReport>(&format!(
            "SELECT {REPORT_COLUMNS} FROM reports WHERE report_number = $1"
        ))
        .bind(report_number)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(report_from_db))
    }

    async fn delete_report(&self, report_number: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM reports WHERE report_number = $1")
            .bind(report_number)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("report".into()));
        }
        metrics::counter!(observability::REPORT_CHANGES, "op" => "deleted").increment(1);
        Ok(())
    }

    async fn list_reports(
        &self,
        filter: &ReportFilter,
        page: PageRequest,
    ) -> StoreResult<Page<ReportView>> {
        let (limit, offset) = page_bounds(page)?;
        let officer_filter = filter.officer_id.map(|id| id.as_uuid());
        let rows = sqlx::query_as::<_, DbReport>(&format!(
            r#"SELECT {REPORT_COLUMNS} FROM reports r
               WHERE ($1::BIGINT IS NULL OR r.report_number = $1)
                 AND ($2::UUID IS NULL OR EXISTS (
                     SELECT 1 FROM report_officers ro
                     WHERE ro.report_id = r.id AND ro.officer_id = $2))
               ORDER BY r.created_at DESC, r.report_number DESC
               LIMIT $3 OFFSET $4"#
        ))
        .bind(filter.report_number)
        .bind(officer_filter)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        let total: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM reports r
               WHERE ($1::BIGINT IS NULL OR r.report_number = $1)
                 AND ($2::UUID IS NULL OR EXISTS (
                     SELECT 1 FROM report_officers ro
                     WHERE ro.report_id = r.id AND ro.officer_id = $2))"#,
        )
        .bind(filter.report_number)
        .bind(officer_filter)
        .fetch_one(&self.pool)
        .await?;

        let report_ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let associations = sqlx::query_as::<_, DbReportOfficer>(
            r#"SELECT ro.report_id, ro.officer_id, o.full_name
               FROM report_officers ro
               JOIN officers o ON o.id = ro.officer_id
               WHERE ro.report_id = ANY($1)
               ORDER BY o.full_name, o.id"#,
        )
        .bind(&report_ids)
        .fetch_all(&self.pool)
        .await?;
        let mut officers: HashMap<Uuid, Vec<OfficerRef>> = HashMap::new();
        for row in associations {
            officers.entry(row.report_id).or_default().push(OfficerRef {
                id: OfficerId::from_uuid(row.officer_id),
                full_name: row.full_name,
            });
        }

        let items = rows
            .into_iter()
            .map(|row| {
                let refs = officers.remove(&row.id).unwrap_or_default();
                ReportView::new(report_from_db(row), refs)
            })
            .collect();
        Ok(Page {
            items,
            total_count: total as u64,
        })
    }

    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgStoreTransaction { tx }))
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn is_durable(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

/// Report unit of work on a single pooled connection.
pub struct PgStoreTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PgStoreTransaction {
    async fn find_report(&mut self, report_number: i64) -> StoreResult<Option<Report>> {
        let row = sqlx::query_as::<_, DbReport>(&format!(
            "SELECT {REPORT_COLUMNS} FROM reports WHERE report_number = $1 FOR UPDATE"
        ))
        .bind(report_number)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row.map(report_from_db))
    }

    async fn insert_report(&mut self, report: Report) -> StoreResult<Report> {
        let insert = sqlx::query(
            r#"INSERT INTO reports (id, report_number, title, description, created_at)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(report.id.as_uuid())
        .bind(report.report_number)
        .bind(&report.title)
        .bind(&report.description)
        .bind(report.created_at)
        .execute(&mut *self.tx)
        .await;
        if let Err(err) = insert {
            return Err(classify(err, "report exists"));
        }
        Ok(report)
    }

    async fn update_report(&mut self, id: ReportId, fields: ReportFields) -> StoreResult<Report> {
        let row = sqlx::query_as::<_, DbReport>(&format!(
            r#"UPDATE reports SET report_number = $2, title = $3, description = $4
               WHERE id = $1
               RETURNING {REPORT_COLUMNS}"#
        ))
        .bind(id.as_uuid())
        .bind(fields.report_number)
        .bind(&fields.title)
        .bind(&fields.description)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|err| classify(err, "report number in use"))?;
        row.map(report_from_db)
            .ok_or_else(|| StoreError::NotFound("report".into()))
    }

    async fn report_officers(&mut self, id: ReportId) -> StoreResult<BTreeSet<OfficerId>> {
        let ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT officer_id FROM report_officers WHERE report_id = $1")
                .bind(id.as_uuid())
                .fetch_all(&mut *self.tx)
                .await?;
        Ok(ids.into_iter().map(OfficerId::from_uuid).collect())
    }

    async fn insert_report_officers(
        &mut self,
        id: ReportId,
        officers: &BTreeSet<OfficerId>,
    ) -> StoreResult<()> {
        if officers.is_empty() {
            return Ok(());
        }
        let ids: Vec<Uuid> = officers.iter().map(OfficerId::as_uuid).collect();
        sqlx::query(
            r#"INSERT INTO report_officers (report_id, officer_id)
               SELECT $1, officer_id FROM UNNEST($2::UUID[]) AS officer_id"#,
        )
        .bind(id.as_uuid())
        .bind(&ids)
        .execute(&mut *self.tx)
        .await
        .map_err(|err| classify(err, "association exists"))?;
        Ok(())
    }

    async fn delete_report_officers(
        &mut self,
        id: ReportId,
        officers: &BTreeSet<OfficerId>,
    ) -> StoreResult<()> {
        if officers.is_empty() {
            return Ok(());
        }
        let ids: Vec<Uuid> = officers.iter().map(OfficerId::as_uuid).collect();
        sqlx::query("DELETE FROM report_officers WHERE report_id = $1 AND officer_id = ANY($2)")
            .bind(id.as_uuid())
            .bind(&ids)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

/// `LIMIT` / `OFFSET` as Postgres `BIGINT`s.
fn page_bounds(page: PageRequest) -> StoreResult<(i64, i64)> {
    let limit = i64::try_from(page.limit())
        .map_err(|_| StoreError::Unexpected(anyhow!("page size out of range")))?;
    let offset = i64::try_from(page.offset())
        .map_err(|_| StoreError::Unexpected(anyhow!("page offset out of range")))?;
    Ok((limit, offset))
}

/// Map constraint violations onto store errors; everything else is unexpected.
fn classify(err: sqlx::Error, conflict: &str) -> StoreError {
    if is_unique_violation(&err) {
        return StoreError::Conflict(conflict.into());
    }
    if is_foreign_key_violation(&err) {
        return StoreError::Integrity(err.to_string());
    }
    StoreError::Unexpected(err.into())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    database_code(err).is_some_and(|code| code == "23505")
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    database_code(err).is_some_and(|code| code == "23503")
}

fn database_code(err: &sqlx::Error) -> Option<String> {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.code().map(|code| code.into_owned());
    }
    None
}

fn parse_rank(value: &str) -> StoreResult<Rank> {
    Rank::from_str(value).map_err(|_| StoreError::Unexpected(anyhow!("invalid rank: {value}")))
}

fn officer_from_db(row: DbOfficer) -> StoreResult<Officer> {
    Ok(Officer {
        id: OfficerId::from_uuid(row.id),
        full_name: row.full_name,
        phone: row.phone,
        rank: parse_rank(&row.rank)?,
        created_at: row.created_at,
    })
}

fn summary_from_db(row: DbOfficerSummary) -> StoreResult<OfficerSummary> {
    let last_report = match (
        row.last_report_number,
        row.last_report_title,
        row.last_report_created_at,
    ) {
        (Some(report_number), Some(title), Some(created_at)) => Some(ReportDigest {
            report_number,
            title,
            created_at,
        }),
        _ => None,
    };
    let officer = officer_from_db(DbOfficer {
        id: row.id,
        full_name: row.full_name,
        phone: row.phone,
        rank: row.rank,
        created_at: row.created_at,
    })?;
    Ok(OfficerSummary::new(officer, last_report))
}

fn report_from_db(row: DbReport) -> Report {
    Report {
        id: ReportId::from_uuid(row.id),
        report_number: row.report_number,
        title: row.title,
        description: row.description,
        created_at: row.created_at,
    }
}
