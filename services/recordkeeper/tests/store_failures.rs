mod common;

use async_trait::async_trait;
use axum::http::StatusCode;
use common::read_json;
use http_helpers::{authed_request, get};
use recordkeeper::app::{AppState, build_router};
use recordkeeper::auth::identity::SessionResolver;
use recordkeeper::auth::session::SessionKeys;
use recordkeeper::model::{
    Officer, OfficerSummary, OfficerUpdate, Page, PageRequest, Report, ReportFilter, ReportView,
};
use recordkeeper::service::RecordService;
use recordkeeper::store::{RecordStore, StoreError, StoreResult, StoreTransaction};
use roster_authz::{MutationAuthorizer, PermissionEvaluator, RankLevels};
use roster_common::ids::OfficerId;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

struct UnavailableStore;

fn down<T>() -> StoreResult<T> {
    Err(StoreError::Unexpected(anyhow::anyhow!(
        "connection refused: db-internal.example:5432"
    )))
}

#[async_trait]
impl RecordStore for UnavailableStore {
    async fn find_officer(&self, _id: OfficerId) -> StoreResult<Option<Officer>> {
        down()
    }
    async fn find_officer_by_phone(&self, _phone: &str) -> StoreResult<Option<Officer>> {
        down()
    }
    async fn password_hash(&self, _phone: &str) -> StoreResult<Option<String>> {
        down()
    }
    async fn create_officer(&self, _officer: Officer, _hash: String) -> StoreResult<Officer> {
        down()
    }
    async fn update_officer(&self, _phone: &str, _update: OfficerUpdate) -> StoreResult<Officer> {
        down()
    }
    async fn delete_officer(&self, _phone: &str) -> StoreResult<()> {
        down()
    }
    async fn list_officers(&self, _page: PageRequest) -> StoreResult<Page<OfficerSummary>> {
        down()
    }
    async fn find_report(&self, _report_number: i64) -> StoreResult<Option<Report>> {
        down()
    }
    async fn delete_report(&self, _report_number: i64) -> StoreResult<()> {
        down()
    }
    async fn list_reports(
        &self,
        _filter: &ReportFilter,
        _page: PageRequest,
    ) -> StoreResult<Page<ReportView>> {
        down()
    }
    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        down()
    }
    async fn health_check(&self) -> StoreResult<()> {
        down()
    }
    fn is_durable(&self) -> bool {
        true
    }
    fn backend_name(&self) -> &'static str {
        "unavailable"
    }
}

fn app(keys: SessionKeys) -> common::App {
    let store: Arc<dyn RecordStore> = Arc::new(UnavailableStore);
    let resolver = Arc::new(SessionResolver::new(keys, store.clone()));
    let authorizer = MutationAuthorizer::new(PermissionEvaluator::new(RankLevels::default()));
    build_router(AppState {
        service: Arc::new(RecordService::new(store, resolver, authorizer)),
        default_page_size: 20,
    })
    .into_service()
}

#[tokio::test]
async fn storage_outage_is_internal_error_without_details() {
    let keys = SessionKeys::new(b"outage", "recordkeeper");
    let token = keys
        .issue(OfficerId::new(), Duration::from_secs(60))
        .expect("token");
    let app = app(keys);

    for request in [
        get("/v1/system/health"),
        get("/v1/officers"),
        get("/v1/reports"),
        authed_request("DELETE", "/v1/reports/1", &format!("Bearer {token}")),
    ] {
        let response = app.clone().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = read_json(response).await;
        assert_eq!(body["code"], "internal");
        assert!(!body["message"].as_str().expect("message").contains("db-internal"));
    }
}
