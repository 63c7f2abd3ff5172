//! OpenAPI document for the recordkeeper API.
use crate::api::{
    officers, reports, system,
    types::{
        CreateOfficerRequest, CreateReportRequest, ErrorResponse, HealthStatus, MutationResponse,
        OfficerListResponse, ReportListResponse, UpdateOfficerRequest, UpdateReportRequest,
    },
};
use crate::model::{OfficerRef, OfficerSummary, ReportDigest, ReportView};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "recordkeeper",
        version = "v1",
        description = "Officer roster and incident report API"
    ),
    paths(
        system::system_health,
        officers::list_officers,
        officers::create_officer,
        officers::update_officer,
        officers::delete_officer,
        reports::list_reports,
        reports::create_report,
        reports::update_report,
        reports::delete_report
    ),
    components(schemas(
        ErrorResponse,
        HealthStatus,
        MutationResponse,
        OfficerListResponse,
        ReportListResponse,
        CreateOfficerRequest,
        UpdateOfficerRequest,
        CreateReportRequest,
        UpdateReportRequest,
        OfficerSummary,
        OfficerRef,
        ReportDigest,
        ReportView
    )),
    tags(
        (name = "system", description = "Health probes"),
        (name = "officers", description = "Officer roster management"),
        (name = "reports", description = "Incident reports and involved officers")
    )
)]
pub struct ApiDoc;
