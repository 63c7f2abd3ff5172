//! Officer records and their read-side views.
use super::ReportDigest;
use chrono::{DateTime, Utc};
use roster_authz::Rank;
use roster_common::ids::OfficerId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// An officer as served by the API. The password hash never leaves the store.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Officer {
    #[schema(value_type = String, format = Uuid)]
    pub id: OfficerId,
    pub full_name: String,
    pub phone: String,
    #[serde(rename = "internalRole")]
    #[schema(value_type = String, example = "PILOT")]
    pub rank: Rank,
    pub created_at: DateTime<Utc>,
}

/// Field changes applied to an existing officer.
///
/// `rank` and `password_hash` keep their stored values when `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfficerUpdate {
    pub full_name: String,
    pub phone: String,
    pub rank: Option<Rank>,
    pub password_hash: Option<String>,
}

/// List entry for the officer roster, carrying the officer's newest report.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OfficerSummary {
    #[schema(value_type = String, format = Uuid)]
    pub id: OfficerId,
    pub full_name: String,
    pub phone: String,
    #[serde(rename = "internalRole")]
    #[schema(value_type = String, example = "PILOT")]
    pub rank: Rank,
    pub created_at: DateTime<Utc>,
    pub last_report: Option<ReportDigest>,
}

impl OfficerSummary {
    pub fn new(officer: Officer, last_report: Option<ReportDigest>) -> Self {
        Self {
            id: officer.id,
            full_name: officer.full_name,
            phone: officer.phone,
            rank: officer.rank,
            created_at: officer.created_at,
            last_report,
        }
    }
}

/// Officer reference embedded in report payloads.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OfficerRef {
    #[schema(value_type = String, format = Uuid)]
    pub id: OfficerId,
    pub full_name: String,
}
