//! Officer API handlers.
use crate::api::error::{ApiError, api_validation_error};
use crate::api::types::{
    CreateOfficerRequest, ErrorResponse, MutationResponse, OfficerListResponse,
    UpdateOfficerRequest, check_phone,
};
use crate::api::{credential, json_body, page_request};
use crate::app::AppState;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use std::collections::HashMap;

#[utoipa::path(
    get,
    path = "/v1/officers",
    tag = "officers",
    params(
        ("currentPage" = Option<u32>, Query, description = "1-based page number"),
        ("itemsPerPage" = Option<u32>, Query, description = "Page size")
    ),
    responses(
        (status = 200, description = "Officers ordered by full name", body = OfficerListResponse),
        (status = 400, description = "Invalid paging parameters", body = ErrorResponse)
    )
)]
pub(crate) async fn list_officers(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<AppState>,
) -> Result<Json<OfficerListResponse>, ApiError> {
    let (page, per_page) = page_request(&params, state.default_page_size)?;
    let result = state.service.list_officers(page).await?;
    Ok(Json(OfficerListResponse {
        total_pages: result.total_pages(per_page),
        total_count: result.total_count,
        data: result.items,
    }))
}

#[utoipa::path(
    post,
    path = "/v1/officers",
    tag = "officers",
    request_body = CreateOfficerRequest,
    responses(
        (status = 201, description = "Officer created", body = MutationResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Caller rank too low", body = ErrorResponse),
        (status = 404, description = "Caller not found", body = ErrorResponse),
        (status = 409, description = "Phone already registered", body = ErrorResponse)
    )
)]
pub(crate) async fn create_officer(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CreateOfficerRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MutationResponse>), ApiError> {
    let credential = credential(&headers)?;
    let request = json_body(body)?;
    request.validate().map_err(|msg| api_validation_error(&msg))?;
    state
        .service
        .create_officer(credential, request.into_draft())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(MutationResponse::ok("officer registered")),
    ))
}

#[utoipa::path(
    patch,
    path = "/v1/officers/{phone}",
    tag = "officers",
    params(
        ("phone" = String, Path, description = "Current phone of the officer to update")
    ),
    request_body = UpdateOfficerRequest,
    responses(
        (status = 200, description = "Officer updated", body = MutationResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Update not permitted", body = ErrorResponse),
        (status = 404, description = "Caller not found", body = ErrorResponse),
        (status = 409, description = "Officer not found or phone taken", body = ErrorResponse)
    )
)]
pub(crate) async fn update_officer(
    Path(phone): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<UpdateOfficerRequest>, JsonRejection>,
) -> Result<Json<MutationResponse>, ApiError> {
    check_phone("phone", &phone).map_err(|msg| api_validation_error(&msg))?;
    let credential = credential(&headers)?;
    let request = json_body(body)?;
    request.validate().map_err(|msg| api_validation_error(&msg))?;
    state
        .service
        .update_officer(credential, &phone, request.into_changes())
        .await?;
    Ok(Json(MutationResponse::ok("officer updated")))
}

#[utoipa::path(
    delete,
    path = "/v1/officers/{phone}",
    tag = "officers",
    params(
        ("phone" = String, Path, description = "Phone of the officer to delete")
    ),
    responses(
        (status = 200, description = "Officer deleted", body = MutationResponse),
        (status = 403, description = "Caller rank too low", body = ErrorResponse),
        (status = 404, description = "Caller not found", body = ErrorResponse),
        (status = 409, description = "Officer not found", body = ErrorResponse)
    )
)]
pub(crate) async fn delete_officer(
    Path(phone): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MutationResponse>, ApiError> {
    check_phone("phone", &phone).map_err(|msg| api_validation_error(&msg))?;
    let credential = credential(&headers)?;
    state.service.delete_officer(credential, &phone).await?;
    Ok(Json(MutationResponse::ok("officer deleted")))
}
