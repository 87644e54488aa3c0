//! Best-effort table change notifications.
//!
//! Services publish after a successful write; subscribers receive whatever
//! the broadcast channel still holds. Slow subscribers miss events (lagged)
//! and nothing is deduplicated or reordered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;
use tokio::sync::broadcast;
use tracing::trace;
use uuid::Uuid;

use crate::types::ChangeAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Profiles,
    UserRoles,
    Teams,
    TeamMembers,
    TeamBulletins,
    BulletinReadReceipts,
    DailyMetrics,
    LeadExpenses,
    FormFieldPositions,
    FormSectionPositions,
}

impl Table {
    pub const ALL: [Table; 10] = [
        Table::Profiles,
        Table::UserRoles,
        Table::Teams,
        Table::TeamMembers,
        Table::TeamBulletins,
        Table::BulletinReadReceipts,
        Table::DailyMetrics,
        Table::LeadExpenses,
        Table::FormFieldPositions,
        Table::FormSectionPositions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Profiles => "profiles",
            Table::UserRoles => "user_roles",
            Table::Teams => "teams",
            Table::TeamMembers => "team_members",
            Table::TeamBulletins => "team_bulletins",
            Table::BulletinReadReceipts => "bulletin_read_receipts",
            Table::DailyMetrics => "daily_metrics",
            Table::LeadExpenses => "lead_expenses",
            Table::FormFieldPositions => "form_field_positions",
            Table::FormSectionPositions => "form_section_positions",
        }
    }
}

impl FromStr for Table {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Table::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| format!("unknown table: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: Table,
    pub action: ChangeAction,
    /// Row key as text; composite keys are joined with ':'.
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    pub at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(table: Table, action: ChangeAction, id: impl ToString) -> Self {
        Self {
            table,
            action,
            id: id.to_string(),
            team_id: None,
            user_id: None,
            at: Utc::now(),
        }
    }

    pub fn for_team(mut self, team_id: Uuid) -> Self {
        self.team_id = Some(team_id);
        self
    }

    pub fn for_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

/// Cloneable handle on the broadcast channel.
#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Fire and forget. Having no subscribers is not an error.
    pub fn publish(&self, event: ChangeEvent) {
        trace!(table = event.table.as_str(), action = ?event.action, id = %event.id, "Publishing change");
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Which events one subscriber sees.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Empty means every table.
    pub tables: HashSet<Table>,
    pub viewer_id: Uuid,
    pub team_ids: HashSet<Uuid>,
    pub report_ids: HashSet<Uuid>,
    /// Admins see everything.
    pub unrestricted: bool,
}

impl EventFilter {
    /// Parse `?tables=a,b`. Unknown names are skipped.
    pub fn parse_tables(raw: Option<&str>) -> HashSet<Table> {
        raw.map(|s| s.split(',').filter_map(|t| t.parse().ok()).collect())
            .unwrap_or_default()
    }

    pub fn accepts(&self, event: &ChangeEvent) -> bool {
        if !self.tables.is_empty() && !self.tables.contains(&event.table) {
            return false;
        }
        if self.unrestricted {
            return true;
        }

        let team_visible = event.team_id.map_or(false, |t| self.team_ids.contains(&t));
        let user_visible = event
            .user_id
            .map_or(false, |u| u == self.viewer_id || self.report_ids.contains(&u));

        team_visible || user_visible
    }
}
