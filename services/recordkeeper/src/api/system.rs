//! System endpoints used by probes and operators.
use crate::api::error::ApiError;
use crate::api::types::{ErrorResponse, HealthStatus};
use crate::app::AppState;
use axum::Json;
use axum::extract::State;

#[utoipa::path(
    get,
    path = "/v1/system/health",
    tag = "system",
    responses(
        (status = 200, description = "Service and storage are healthy", body = HealthStatus),
        (status = 500, description = "Storage unavailable", body = ErrorResponse)
    )
)]
/// Probe the record store and report which backend is serving.
pub(crate) async fn system_health(
    State(state): State<AppState>,
) -> Result<Json<HealthStatus>, ApiError> {
    state.service.health_check().await?;
    let store = state.service.store();
    Ok(Json(HealthStatus {
        status: "ok".to_string(),
        storage: store.backend_name().to_string(),
        durable: store.is_durable(),
    }))
}
