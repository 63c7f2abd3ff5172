use chrono::Utc;
use recordkeeper::app::{AppState, build_router};
use recordkeeper::auth::identity::SessionResolver;
use recordkeeper::auth::password::hash_password;
use recordkeeper::auth::session::SessionKeys;
use recordkeeper::model::Officer;
use recordkeeper::service::RecordService;
use recordkeeper::store::RecordStore;
use recordkeeper::store::memory::InMemoryStore;
use roster_authz::{MutationAuthorizer, PermissionEvaluator, Rank, RankLevels};
use roster_common::ids::OfficerId;
use std::sync::Arc;
use std::time::Duration;

pub type App = axum::routing::RouterIntoService<axum::body::Body, ()>;

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

/// In-memory app plus the handles tests need to seed officers and mint tokens.
pub struct TestApp {
    pub app: App,
    pub store: Arc<InMemoryStore>,
    keys: SessionKeys,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_page_size(20)
    }

    pub fn with_page_size(default_page_size: u32) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let keys = SessionKeys::new(b"http-tests", "recordkeeper");
        let resolver = Arc::new(SessionResolver::new(keys.clone(), store.clone()));
        let authorizer = MutationAuthorizer::new(PermissionEvaluator::new(RankLevels::default()));
        let state = AppState {
            service: Arc::new(RecordService::new(store.clone(), resolver, authorizer)),
            default_page_size,
        };
        Self {
            app: build_router(state).into_service(),
            store,
            keys,
        }
    }

    /// Insert an officer directly and return it with a ready `Bearer` header value.
    pub async fn officer(&self, full_name: &str, phone: &str, rank: Rank) -> (Officer, String) {
        let officer = self
            .store
            .create_officer(
                Officer {
                    id: OfficerId::new(),
                    full_name: full_name.to_string(),
                    phone: phone.to_string(),
                    rank,
                    created_at: Utc::now(),
                },
                hash_password("seeded").expect("hash"),
            )
            .await
            .expect("seed officer");
        let token = self
            .keys
            .issue(officer.id, Duration::from_secs(600))
            .expect("issue token");
        (officer, format!("Bearer {token}"))
    }
}
