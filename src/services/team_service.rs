use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::ServiceError;
use crate::database::models::{Team, TeamMember, TeamRole};
use crate::database::DatabaseError;
use crate::realtime::{ChangeEvent, ChangeFeed, Table};
use crate::roles::{check_system_admin_role, RoleSet};
use crate::types::ChangeAction;

/// Named teams and their membership rows.
pub struct TeamService {
    pool: PgPool,
    feed: ChangeFeed,
}

impl TeamService {
    pub fn new(pool: PgPool, feed: ChangeFeed) -> Self {
        Self { pool, feed }
    }

    /// Create a team owned by `owner_id`; the owner is enrolled as `owner`.
    pub async fn create_team(&self, owner_id: Uuid, name: &str) -> Result<Team, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::invalid("name", "Team name is required"));
        }

        let mut tx = self.pool.begin().await?;

        let team = sqlx::query_as::<_, Team>(
            "INSERT INTO teams (id, name, manager_id) VALUES ($1, $2, $3) \
             RETURNING id, name, manager_id, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO team_members (team_id, user_id, role) VALUES ($1, $2, $3)")
            .bind(team.id)
            .bind(owner_id)
            .bind(TeamRole::Owner.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(team_id = %team.id, owner_id = %owner_id, "Team created");
        self.feed
            .publish(ChangeEvent::new(Table::Teams, ChangeAction::Insert, team.id).for_team(team.id));
        Ok(team)
    }

    pub async fn team(&self, team_id: Uuid) -> Result<Option<Team>, ServiceError> {
        let team = sqlx::query_as::<_, Team>("SELECT id, name, manager_id, created_at FROM teams WHERE id = $1")
            .bind(team_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(team)
    }

    pub async fn teams_for_user(&self, user_id: Uuid) -> Result<Vec<Team>, ServiceError> {
        let teams = sqlx::query_as::<_, Team>(
            "SELECT t.id, t.name, t.manager_id, t.created_at FROM teams t \
             JOIN team_members m ON m.team_id = t.id \
             WHERE m.user_id = $1 ORDER BY t.name",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(teams)
    }

    pub async fn team_ids_for_user(&self, user_id: Uuid) -> Result<Vec<Uuid>, ServiceError> {
        let ids: Vec<(Uuid,)> = sqlx::query_as("SELECT team_id FROM team_members WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    pub async fn members(&self, team_id: Uuid) -> Result<Vec<TeamMember>, ServiceError> {
        let members = sqlx::query_as::<_, TeamMember>(
            "SELECT team_id, user_id, role, joined_at FROM team_members \
             WHERE team_id = $1 ORDER BY joined_at",
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }

    pub async fn membership(&self, team_id: Uuid, user_id: Uuid) -> Result<Option<TeamMember>, ServiceError> {
        let member = sqlx::query_as::<_, TeamMember>(
            "SELECT team_id, user_id, role, joined_at FROM team_members WHERE team_id = $1 AND user_id = $2",
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(member)
    }

    /// Owners and managers of the team moderate it; so does `system_admin`.
    pub async fn can_moderate(&self, team_id: Uuid, user_id: Uuid, roles: &RoleSet) -> Result<bool, ServiceError> {
        if check_system_admin_role(roles) {
            return Ok(true);
        }
        Ok(self
            .membership(team_id, user_id)
            .await?
            .map_or(false, |m| m.team_role().can_moderate()))
    }

    pub async fn can_view(&self, team_id: Uuid, user_id: Uuid, roles: &RoleSet) -> Result<bool, ServiceError> {
        if check_system_admin_role(roles) {
            return Ok(true);
        }
        Ok(self.membership(team_id, user_id).await?.is_some())
    }

    /// Add or re-role a member. Ownership cannot be granted this way.
    pub async fn add_member(&self, team_id: Uuid, user_id: Uuid, role: TeamRole) -> Result<TeamMember, ServiceError> {
        if role == TeamRole::Owner {
            return Err(ServiceError::invalid("role", "Ownership cannot be assigned"));
        }

        let member = sqlx::query_as::<_, TeamMember>(
            "INSERT INTO team_members (team_id, user_id, role) VALUES ($1, $2, $3) \
             ON CONFLICT (team_id, user_id) DO UPDATE SET role = EXCLUDED.role \
             WHERE team_members.role <> 'owner' \
             RETURNING team_id, user_id, role, joined_at",
        )
        .bind(team_id)
        .bind(user_id)
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_insert(e, "team member"))?
        .ok_or_else(|| ServiceError::Forbidden("The team owner's role cannot be changed".to_string()))?;

        info!(team_id = %team_id, user_id = %user_id, role = role.as_str(), "Team member saved");
        self.feed.publish(
            ChangeEvent::new(Table::TeamMembers, ChangeAction::Insert, format!("{}:{}", team_id, user_id))
                .for_team(team_id)
                .for_user(user_id),
        );
        Ok(member)
    }

    pub async fn remove_member(&self, team_id: Uuid, user_id: Uuid) -> Result<bool, ServiceError> {
        let result = sqlx::query("DELETE FROM team_members WHERE team_id = $1 AND user_id = $2 AND role <> 'owner'")
            .bind(team_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected() > 0;
        if removed {
            info!(team_id = %team_id, user_id = %user_id, "Team member removed");
            self.feed.publish(
                ChangeEvent::new(Table::TeamMembers, ChangeAction::Delete, format!("{}:{}", team_id, user_id))
                    .for_team(team_id)
                    .for_user(user_id),
            );
        }
        Ok(removed)
    }

    pub async fn delete_team(&self, team_id: Uuid) -> Result<bool, ServiceError> {
        let result = sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(team_id)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(team_id = %team_id, "Team deleted");
            self.feed
                .publish(ChangeEvent::new(Table::Teams, ChangeAction::Delete, team_id).for_team(team_id));
        }
        Ok(deleted)
    }
}
