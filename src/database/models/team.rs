use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub manager_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TeamMember {
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub joined_at: DateTime<Utc>,
}

impl TeamMember {
    pub fn team_role(&self) -> TeamRole {
        self.role.parse().unwrap_or(TeamRole::Member)
    }
}

/// Role within a team, separate from the account's permission tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    Owner,
    Manager,
    Member,
}

impl TeamRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamRole::Owner => "owner",
            TeamRole::Manager => "manager",
            TeamRole::Member => "member",
        }
    }

    /// Owners and managers may post bulletins and manage membership.
    pub fn can_moderate(&self) -> bool {
        matches!(self, TeamRole::Owner | TeamRole::Manager)
    }
}

impl FromStr for TeamRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(TeamRole::Owner),
            "manager" => Ok(TeamRole::Manager),
            "member" => Ok(TeamRole::Member),
            other => Err(format!("unknown team role: {}", other)),
        }
    }
}
