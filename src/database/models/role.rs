use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::roles::Role;

/// One row of `user_roles`. The role column is free text in the table; rows
/// outside the vocabulary are skipped when read.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRoleRow {
    pub user_id: Uuid,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl UserRoleRow {
    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }
}
