//! Router and shared handler state.
use crate::api;
use crate::api::openapi::ApiDoc;
use crate::observability;
use crate::service::RecordService;
use axum::Router;
use axum::routing::{get, patch};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use utoipa::OpenApi;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RecordService>,
    pub default_page_size: u32,
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            let parent = observability::trace_context_from_headers(request.headers());
            let span = tracing::info_span!(
                "http.request",
                method = %request.method(),
                path = %request.uri().path(),
                version = ?request.version()
            );
            span.set_parent(parent);
            span
        });
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/v1/system/health", get(api::system::system_health))
        .route(
            "/v1/officers",
            get(api::officers::list_officers).post(api::officers::create_officer),
        )
        .route(
            "/v1/officers/:phone",
            patch(api::officers::update_officer).delete(api::officers::delete_officer),
        )
        .route(
            "/v1/reports",
            get(api::reports::list_reports).post(api::reports::create_report),
        )
        .route(
            "/v1/reports/:reportNumber",
            patch(api::reports::update_report).delete(api::reports::delete_report),
        )
        .merge(
            utoipa_swagger_ui::SwaggerUi::new("/docs").url("/v1/openapi.json", ApiDoc::openapi()),
        )
        .layer(cors)
        .layer(trace_layer)
        .with_state(state)
}
