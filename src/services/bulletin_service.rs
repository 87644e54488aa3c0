use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::ServiceError;
use crate::database::models::{BulletinReadReceipt, TeamBulletin};
use crate::realtime::{ChangeEvent, ChangeFeed, Table};
use crate::types::ChangeAction;

#[derive(Debug, Clone, Deserialize)]
pub struct NewBulletin {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub pinned: bool,
}

/// A bulletin as seen by one viewer.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct BulletinView {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub bulletin: TeamBulletin,
    pub read: bool,
}

const BULLETIN_COLUMNS: &str = "b.id, b.team_id, b.author_id, b.title, b.body, b.pinned, b.created_at";

pub struct BulletinService {
    pool: PgPool,
    feed: ChangeFeed,
}

impl BulletinService {
    pub fn new(pool: PgPool, feed: ChangeFeed) -> Self {
        Self { pool, feed }
    }

    pub async fn post(&self, team_id: Uuid, author_id: Uuid, new: &NewBulletin) -> Result<TeamBulletin, ServiceError> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(ServiceError::invalid("title", "Title is required"));
        }
        if new.body.trim().is_empty() {
            return Err(ServiceError::invalid("body", "Body is required"));
        }

        let bulletin = sqlx::query_as::<_, TeamBulletin>(
            "INSERT INTO team_bulletins (id, team_id, author_id, title, body, pinned) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, team_id, author_id, title, body, pinned, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(team_id)
        .bind(author_id)
        .bind(title)
        .bind(&new.body)
        .bind(new.pinned)
        .fetch_one(&self.pool)
        .await?;

        info!(bulletin_id = %bulletin.id, team_id = %team_id, author_id = %author_id, "Bulletin posted");
        self.feed.publish(
            ChangeEvent::new(Table::TeamBulletins, ChangeAction::Insert, bulletin.id)
                .for_team(team_id)
                .for_user(author_id),
        );
        Ok(bulletin)
    }

    pub async fn bulletin(&self, bulletin_id: Uuid) -> Result<Option<TeamBulletin>, ServiceError> {
        let sql = format!("SELECT {} FROM team_bulletins b WHERE b.id = $1", BULLETIN_COLUMNS);
        let bulletin = sqlx::query_as::<_, TeamBulletin>(&sql)
            .bind(bulletin_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(bulletin)
    }

    /// Pinned first, then newest first, each flagged read/unread for `viewer_id`.
    pub async fn list(&self, team_id: Uuid, viewer_id: Uuid) -> Result<Vec<BulletinView>, ServiceError> {
        let sql = format!(
            "SELECT {}, (r.user_id IS NOT NULL) AS read \
             FROM team_bulletins b \
             LEFT JOIN bulletin_read_receipts r ON r.bulletin_id = b.id AND r.user_id = $2 \
             WHERE b.team_id = $1 \
             ORDER BY b.pinned DESC, b.created_at DESC",
            BULLETIN_COLUMNS
        );
        let rows = sqlx::query_as::<_, BulletinView>(&sql)
            .bind(team_id)
            .bind(viewer_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Idempotent: a second call keeps the original `read_at`.
    pub async fn mark_read(&self, bulletin_id: Uuid, user_id: Uuid) -> Result<BulletinReadReceipt, ServiceError> {
        let receipt = sqlx::query_as::<_, BulletinReadReceipt>(
            "INSERT INTO bulletin_read_receipts (bulletin_id, user_id) VALUES ($1, $2) \
             ON CONFLICT (bulletin_id, user_id) DO UPDATE SET read_at = bulletin_read_receipts.read_at \
             RETURNING bulletin_id, user_id, read_at",
        )
        .bind(bulletin_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        self.feed.publish(
            ChangeEvent::new(
                Table::BulletinReadReceipts,
                ChangeAction::Insert,
                format!("{}:{}", bulletin_id, user_id),
            )
            .for_user(user_id),
        );
        Ok(receipt)
    }

    /// Unread bulletins across every team the user belongs to.
    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64, ServiceError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM team_bulletins b \
             JOIN team_members m ON m.team_id = b.team_id AND m.user_id = $1 \
             WHERE NOT EXISTS ( \
                 SELECT 1 FROM bulletin_read_receipts r WHERE r.bulletin_id = b.id AND r.user_id = $1 \
             )",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn set_pinned(&self, bulletin_id: Uuid, pinned: bool) -> Result<TeamBulletin, ServiceError> {
        let bulletin = sqlx::query_as::<_, TeamBulletin>(
            "UPDATE team_bulletins SET pinned = $2 WHERE id = $1 \
             RETURNING id, team_id, author_id, title, body, pinned, created_at",
        )
        .bind(bulletin_id)
        .bind(pinned)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Bulletin {} not found", bulletin_id)))?;

        self.feed.publish(
            ChangeEvent::new(Table::TeamBulletins, ChangeAction::Update, bulletin.id).for_team(bulletin.team_id),
        );
        Ok(bulletin)
    }

    pub async fn delete(&self, bulletin: &TeamBulletin) -> Result<bool, ServiceError> {
        let result = sqlx::query("DELETE FROM team_bulletins WHERE id = $1")
            .bind(bulletin.id)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(bulletin_id = %bulletin.id, "Bulletin deleted");
            self.feed.publish(
                ChangeEvent::new(Table::TeamBulletins, ChangeAction::Delete, bulletin.id).for_team(bulletin.team_id),
            );
        }
        Ok(deleted)
    }
}
