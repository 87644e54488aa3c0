use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{Profile, ProfileUpdate, UserRoleRow};
use crate::database::DatabaseError;
use crate::roles::Role;

const PROFILE_COLUMNS: &str = "id, email, full_name, manager_id, language, stripe_customer_id, \
     stripe_subscription_id, subscription_status, created_at, updated_at";

/// User profiles, role assignments and manager pointers.
///
/// This is the seam between the HTTP layer and the user store; handlers and
/// the resolvers only see this trait.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn profile(&self, id: Uuid) -> Result<Option<Profile>, DatabaseError>;

    /// Every profile, for in-memory ancestry walks.
    async fn profiles(&self) -> Result<Vec<Profile>, DatabaseError>;

    async fn profiles_managed_by(&self, manager_id: Uuid) -> Result<Vec<Profile>, DatabaseError>;

    async fn profiles_managed_by_any(&self, manager_ids: &[Uuid]) -> Result<Vec<Profile>, DatabaseError>;

    /// Direct reports of `manager_id` that hold a manager-tier role.
    async fn sub_managers_of(&self, manager_id: Uuid) -> Result<Vec<Profile>, DatabaseError>;

    async fn profile_by_subscription(&self, subscription_id: &str) -> Result<Option<Profile>, DatabaseError>;

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<Profile, DatabaseError>;

    async fn set_manager(&self, id: Uuid, manager_id: Option<Uuid>) -> Result<Profile, DatabaseError>;

    async fn set_subscription_status(&self, id: Uuid, status: Option<&str>) -> Result<(), DatabaseError>;

    async fn roles_for(&self, user_id: Uuid) -> Result<Vec<Role>, DatabaseError>;

    /// Returns false when the role was already held.
    async fn grant_role(&self, user_id: Uuid, role: Role) -> Result<bool, DatabaseError>;

    /// Returns false when the role was not held.
    async fn revoke_role(&self, user_id: Uuid, role: Role) -> Result<bool, DatabaseError>;
}

/// Postgres-backed directory over `profiles` and `user_roles`.
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Directory for PgDirectory {
    async fn profile(&self, id: Uuid) -> Result<Option<Profile>, DatabaseError> {
        let sql = format!("SELECT {} FROM profiles WHERE id = $1", PROFILE_COLUMNS);
        let profile = sqlx::query_as::<_, Profile>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(profile)
    }

    async fn profiles(&self) -> Result<Vec<Profile>, DatabaseError> {
        let sql = format!("SELECT {} FROM profiles ORDER BY full_name NULLS LAST, email", PROFILE_COLUMNS);
        let rows = sqlx::query_as::<_, Profile>(&sql).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn profiles_managed_by(&self, manager_id: Uuid) -> Result<Vec<Profile>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM profiles WHERE manager_id = $1 ORDER BY full_name NULLS LAST, email",
            PROFILE_COLUMNS
        );
        let rows = sqlx::query_as::<_, Profile>(&sql)
            .bind(manager_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn profiles_managed_by_any(&self, manager_ids: &[Uuid]) -> Result<Vec<Profile>, DatabaseError> {
        if manager_ids.is_empty() {
            return Ok(vec![]);
        }
        let sql = format!(
            "SELECT {} FROM profiles WHERE manager_id = ANY($1) ORDER BY full_name NULLS LAST, email",
            PROFILE_COLUMNS
        );
        let rows = sqlx::query_as::<_, Profile>(&sql)
            .bind(manager_ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn sub_managers_of(&self, manager_id: Uuid) -> Result<Vec<Profile>, DatabaseError> {
        let manager_roles: Vec<&str> = Role::ALL
            .iter()
            .filter(|r| r.is_manager())
            .map(|r| r.as_str())
            .collect();

        let sql = format!(
            "SELECT {} FROM profiles p WHERE p.manager_id = $1 \
             AND EXISTS (SELECT 1 FROM user_roles ur WHERE ur.user_id = p.id AND ur.role = ANY($2)) \
             ORDER BY p.full_name NULLS LAST, p.email",
            PROFILE_COLUMNS
                .split(", ")
                .map(|c| format!("p.{}", c))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let rows = sqlx::query_as::<_, Profile>(&sql)
            .bind(manager_id)
            .bind(&manager_roles)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn profile_by_subscription(&self, subscription_id: &str) -> Result<Option<Profile>, DatabaseError> {
        let sql = format!("SELECT {} FROM profiles WHERE stripe_subscription_id = $1", PROFILE_COLUMNS);
        let profile = sqlx::query_as::<_, Profile>(&sql)
            .bind(subscription_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(profile)
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<Profile, DatabaseError> {
        let sql = format!(
            "UPDATE profiles SET \
                full_name = COALESCE($2, full_name), \
                language = COALESCE($3, language), \
                updated_at = now() \
             WHERE id = $1 RETURNING {}",
            PROFILE_COLUMNS
        );
        sqlx::query_as::<_, Profile>(&sql)
            .bind(id)
            .bind(update.full_name.as_deref())
            .bind(update.language.map(|l| l.as_str()))
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("profile {}", id)))
    }

    async fn set_manager(&self, id: Uuid, manager_id: Option<Uuid>) -> Result<Profile, DatabaseError> {
        let sql = format!(
            "UPDATE profiles SET manager_id = $2, updated_at = now() WHERE id = $1 RETURNING {}",
            PROFILE_COLUMNS
        );
        sqlx::query_as::<_, Profile>(&sql)
            .bind(id)
            .bind(manager_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("profile {}", id)))
    }

    async fn set_subscription_status(&self, id: Uuid, status: Option<&str>) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE profiles SET subscription_status = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn roles_for(&self, user_id: Uuid) -> Result<Vec<Role>, DatabaseError> {
        let rows = sqlx::query_as::<_, UserRoleRow>(
            "SELECT user_id, role, created_at FROM user_roles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().filter_map(UserRoleRow::role).collect())
    }

    async fn grant_role(&self, user_id: Uuid, role: Role) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "INSERT INTO user_roles (user_id, role) VALUES ($1, $2) ON CONFLICT (user_id, role) DO NOTHING",
        )
        .bind(user_id)
        .bind(role.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn revoke_role(&self, user_id: Uuid, role: Role) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role = $2")
            .bind(user_id)
            .bind(role.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
