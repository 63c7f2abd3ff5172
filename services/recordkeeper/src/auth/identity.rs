//! Identity resolution from request credentials.
use crate::auth::session::SessionKeys;
use crate::store::{RecordStore, StoreResult};
use async_trait::async_trait;
use roster_authz::Identity;
use std::sync::Arc;

/// Resolves a credential into the caller's identity, or `None` if the
/// credential does not identify a current officer.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, credential: &str) -> StoreResult<Option<Identity>>;
}

/// Resolves session tokens against the officer table.
pub struct SessionResolver {
    keys: SessionKeys,
    store: Arc<dyn RecordStore>,
}

impl SessionResolver {
    pub fn new(keys: SessionKeys, store: Arc<dyn RecordStore>) -> Self {
        Self { keys, store }
    }
}

#[async_trait]
impl IdentityResolver for SessionResolver {
    async fn resolve(&self, credential: &str) -> StoreResult<Option<Identity>> {
        let token = credential.strip_prefix("Bearer ").unwrap_or(credential).trim();
        let officer_id = match self.keys.verify(token) {
            Ok(id) => id,
            Err(err) => {
                tracing::debug!(error = %err, "session token rejected");
                return Ok(None);
            }
        };
        let identity = self
            .store
            .find_officer(officer_id)
            .await?
            .map(|officer| Identity {
                officer_id: officer.id,
                phone: officer.phone,
                rank: officer.rank,
            });
        if identity.is_none() {
            tracing::debug!(%officer_id, "session token for unknown officer");
        }
        Ok(identity)
    }
}
