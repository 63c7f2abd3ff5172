//! HTTP request and response payloads.
//!
//! Field names follow the public camelCase wire format. Request types carry a
//! `validate` step run at the edge before anything reaches the service layer.
use crate::model::{OfficerRef, OfficerSummary, ReportView};
use crate::service::{OfficerChanges, OfficerDraft, ReportDraft, ReportRevision};
use roster_authz::Rank;
use roster_common::is_phone_number;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const MIN_TEXT_LEN: usize = 4;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub request_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct HealthStatus {
    pub status: String,
    pub storage: String,
    pub durable: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct MutationResponse {
    pub success: bool,
    pub message: String,
}

impl MutationResponse {
    pub fn ok(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OfficerListResponse {
    pub data: Vec<OfficerSummary>,
    pub total_pages: u64,
    pub total_count: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportListResponse {
    pub data: Vec<ReportView>,
    pub total_pages: u64,
    pub total_count: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateOfficerRequest {
    pub full_name: String,
    pub phone: String,
    #[schema(value_type = String, example = "PILOT")]
    pub internal_role: Rank,
    pub password: String,
}

impl CreateOfficerRequest {
    pub fn validate(&self) -> Result<(), String> {
        check_full_name(&self.full_name)?;
        check_phone("phone", &self.phone)?;
        check_min_len("password", &self.password)
    }

    pub fn into_draft(self) -> OfficerDraft {
        OfficerDraft {
            full_name: self.full_name,
            phone: self.phone,
            rank: self.internal_role,
            password: self.password,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOfficerRequest {
    pub full_name: String,
    pub phone: String,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "PILOT")]
    pub internal_role: Option<Rank>,
    #[serde(default)]
    pub password: Option<String>,
}

impl UpdateOfficerRequest {
    pub fn validate(&self) -> Result<(), String> {
        check_full_name(&self.full_name)?;
        check_phone("phone", &self.phone)?;
        match &self.password {
            Some(password) => check_min_len("password", password),
            None => Ok(()),
        }
    }

    pub fn into_changes(self) -> OfficerChanges {
        OfficerChanges {
            full_name: self.full_name,
            phone: self.phone,
            rank: self.internal_role,
            password: self.password,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    pub report_number: i64,
    pub title: String,
    pub description: String,
    #[serde(rename = "officersEnvolved", default)]
    pub officers: Vec<OfficerRef>,
}

impl CreateReportRequest {
    pub fn validate(&self) -> Result<(), String> {
        check_report_number(self.report_number)?;
        check_min_len("title", &self.title)?;
        check_min_len("description", &self.description)
    }

    pub fn into_draft(self) -> ReportDraft {
        ReportDraft {
            report_number: self.report_number,
            title: self.title,
            description: self.description,
            officers: self.officers.into_iter().map(|officer| officer.id).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReportRequest {
    #[serde(default)]
    pub report_number: Option<i64>,
    pub title: String,
    pub description: String,
    #[serde(rename = "officersEnvolved", default)]
    pub officers: Vec<OfficerRef>,
}

impl UpdateReportRequest {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(number) = self.report_number {
            check_report_number(number)?;
        }
        check_min_len("title", &self.title)?;
        check_min_len("description", &self.description)
    }

    pub fn into_revision(self) -> ReportRevision {
        ReportRevision {
            report_number: self.report_number,
            title: self.title,
            description: self.description,
            officers: self.officers.into_iter().map(|officer| officer.id).collect(),
        }
    }
}

pub(crate) fn check_phone(field: &str, value: &str) -> Result<(), String> {
    if is_phone_number(value) {
        Ok(())
    } else {
        Err(format!("{field} must have the form 123-456"))
    }
}

pub(crate) fn check_report_number(value: i64) -> Result<(), String> {
    if value > 0 {
        Ok(())
    } else {
        Err("reportNumber must be positive".to_string())
    }
}

fn check_full_name(value: &str) -> Result<(), String> {
    check_min_len("fullName", value)
}

fn check_min_len(field: &str, value: &str) -> Result<(), String> {
    if value.chars().count() >= MIN_TEXT_LEN {
        Ok(())
    } else {
        Err(format!("{field} must have at least {MIN_TEXT_LEN} characters"))
    }
}
