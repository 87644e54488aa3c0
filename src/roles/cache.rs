use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::RoleSet;
use crate::database::DatabaseError;
use crate::services::Directory;

struct CachedRoles {
    roles: RoleSet,
    fetched_at: Instant,
}

/// Per-user role sets with a time-to-live, falling back to the directory on a
/// miss. Owned by `AppState`; there is no process-wide instance.
pub struct RoleCache {
    ttl: Duration,
    entries: RwLock<HashMap<Uuid, CachedRoles>>,
}

impl RoleCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn roles_for(&self, user_id: Uuid, directory: &dyn Directory) -> Result<RoleSet, DatabaseError> {
        // Fast path: try read lock
        {
            let entries = self.entries.read().await;
            if let Some(cached) = entries.get(&user_id) {
                if cached.fetched_at.elapsed() < self.ttl {
                    return Ok(cached.roles.clone());
                }
            }
        }

        let roles: RoleSet = directory.roles_for(user_id).await?.into_iter().collect();
        debug!(user_id = %user_id, roles = ?roles.names(), "Role cache refreshed");

        let mut entries = self.entries.write().await;
        entries.insert(
            user_id,
            CachedRoles {
                roles: roles.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(roles)
    }

    pub async fn invalidate(&self, user_id: Uuid) {
        self.entries.write().await.remove(&user_id);
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
