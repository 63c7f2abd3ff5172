//! Report API handlers.
use crate::api::error::{ApiError, api_validation_error};
use crate::api::types::{
    CreateReportRequest, ErrorResponse, MutationResponse, ReportListResponse, UpdateReportRequest,
    check_report_number,
};
use crate::api::{credential, json_body, page_request, query_param};
use crate::app::AppState;
use crate::model::ReportFilter;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use roster_common::ids::OfficerId;
use std::collections::HashMap;

fn report_filter(params: &HashMap<String, String>) -> Result<ReportFilter, ApiError> {
    let report_number = query_param::<i64>(params, "reportNumber")?;
    if let Some(number) = report_number {
        check_report_number(number).map_err(|msg| api_validation_error(&msg))?;
    }
    let officer_id = match params.get("officerId").map(String::as_str) {
        None | Some("all") => None,
        Some(_) => query_param::<OfficerId>(params, "officerId")?,
    };
    Ok(ReportFilter {
        report_number,
        officer_id,
    })
}

#[utoipa::path(
    get,
    path = "/v1/reports",
    tag = "reports",
    params(
        ("reportNumber" = Option<i64>, Query, description = "Only the report with this number"),
        ("officerId" = Option<String>, Query, description = "Only reports involving this officer; `all` disables the filter"),
        ("currentPage" = Option<u32>, Query, description = "1-based page number"),
        ("itemsPerPage" = Option<u32>, Query, description = "Page size")
    ),
    responses(
        (status = 200, description = "Reports, newest first", body = ReportListResponse),
        (status = 400, description = "Invalid query", body = ErrorResponse)
    )
)]
pub(crate) async fn list_reports(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<AppState>,
) -> Result<Json<ReportListResponse>, ApiError> {
    let filter = report_filter(&params)?;
    let (page, per_page) = page_request(&params, state.default_page_size)?;
    let result = state.service.list_reports(&filter, page).await?;
    Ok(Json(ReportListResponse {
        total_pages: result.total_pages(per_page),
        total_count: result.total_count,
        data: result.items,
    }))
}

#[utoipa::path(
    post,
    path = "/v1/reports",
    tag = "reports",
    request_body = CreateReportRequest,
    responses(
        (status = 201, description = "Report created", body = MutationResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Caller not found", body = ErrorResponse),
        (status = 409, description = "Report number already used", body = ErrorResponse)
    )
)]
pub(crate) async fn create_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CreateReportRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MutationResponse>), ApiError> {
    let credential = credential(&headers)?;
    let request = json_body(body)?;
    request.validate().map_err(|msg| api_validation_error(&msg))?;
    state
        .service
        .create_report(credential, request.into_draft())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(MutationResponse::ok("report created")),
    ))
}

#[utoipa::path(
    patch,
    path = "/v1/reports/{reportNumber}",
    tag = "reports",
    params(
        ("reportNumber" = i64, Path, description = "Current number of the report")
    ),
    request_body = UpdateReportRequest,
    responses(
        (status = 200, description = "Report updated", body = MutationResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Caller not found", body = ErrorResponse),
        (status = 409, description = "Report missing or new number taken", body = ErrorResponse)
    )
)]
pub(crate) async fn update_report(
    Path(report_number): Path<i64>,
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<UpdateReportRequest>, JsonRejection>,
) -> Result<Json<MutationResponse>, ApiError> {
    check_report_number(report_number).map_err(|msg| api_validation_error(&msg))?;
    let credential = credential(&headers)?;
    let request = json_body(body)?;
    request.validate().map_err(|msg| api_validation_error(&msg))?;
    state
        .service
        .update_report(credential, report_number, request.into_revision())
        .await?;
    Ok(Json(MutationResponse::ok("report updated")))
}

#[utoipa::path(
    delete,
    path = "/v1/reports/{reportNumber}",
    tag = "reports",
    params(
        ("reportNumber" = i64, Path, description = "Number of the report to delete")
    ),
    responses(
        (status = 200, description = "Report deleted", body = MutationResponse),
        (status = 403, description = "Caller rank too low", body = ErrorResponse),
        (status = 404, description = "Caller not found", body = ErrorResponse),
        (status = 409, description = "Report not found", body = ErrorResponse)
    )
)]
pub(crate) async fn delete_report(
    Path(report_number): Path<i64>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MutationResponse>, ApiError> {
    check_report_number(report_number).map_err(|msg| api_validation_error(&msg))?;
    let credential = credential(&headers)?;
    state.service.delete_report(credential, report_number).await?;
    Ok(Json(MutationResponse::ok("report deleted")))
}
