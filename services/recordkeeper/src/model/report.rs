//! Report records, report views, and list filters.
use super::OfficerRef;
use chrono::{DateTime, Utc};
use roster_common::ids::{OfficerId, ReportId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[schema(value_type = String, format = Uuid)]
    pub id: ReportId,
    pub report_number: i64,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Scalar fields written by a report update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFields {
    pub report_number: i64,
    pub title: String,
    pub description: String,
}

impl Report {
    pub fn apply(&mut self, fields: ReportFields) {
        self.report_number = fields.report_number;
        self.title = fields.title;
        self.description = fields.description;
    }
}

/// Short form of a report, used as an officer's `lastReport`.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReportDigest {
    pub report_number: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Report> for ReportDigest {
    fn from(report: &Report) -> Self {
        Self {
            report_number: report.report_number,
            title: report.title.clone(),
            created_at: report.created_at,
        }
    }
}

/// A report with its associated officers ordered by full name.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReportView {
    #[schema(value_type = String, format = Uuid)]
    pub id: ReportId,
    pub report_number: i64,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "officersEnvolved")]
    pub officers: Vec<OfficerRef>,
}

impl ReportView {
    pub fn new(report: Report, officers: Vec<OfficerRef>) -> Self {
        Self {
            id: report.id,
            report_number: report.report_number,
            title: report.title,
            description: report.description,
            created_at: report.created_at,
            officers,
        }
    }
}

/// Report list filter. `None` fields do not constrain the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilter {
    pub report_number: Option<i64>,
    pub officer_id: Option<OfficerId>,
}
