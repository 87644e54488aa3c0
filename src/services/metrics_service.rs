use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::ServiceError;
use crate::database::models::DailyMetric;
use crate::metrics::DailyMetricInput;
use crate::realtime::{ChangeEvent, ChangeFeed, Table};
use crate::types::{ChangeAction, DateRange};

const METRIC_COLUMNS: &str = "user_id, metric_date, leads, calls, contacts, scheduled, sits, sales, ap, updated_at";

/// Daily business counters, one row per user per day.
pub struct MetricsService {
    pool: PgPool,
    feed: ChangeFeed,
}

impl MetricsService {
    pub fn new(pool: PgPool, feed: ChangeFeed) -> Self {
        Self { pool, feed }
    }

    /// Insert or overwrite the user's snapshot for the day.
    pub async fn upsert(&self, user_id: Uuid, input: &DailyMetricInput) -> Result<DailyMetric, ServiceError> {
        let errors = input.validate();
        if !errors.is_empty() {
            return Err(ServiceError::Invalid(errors));
        }
        let metric_date = input.metric_date.unwrap_or_else(|| Utc::now().date_naive());

        let sql = format!(
            "INSERT INTO daily_metrics (user_id, metric_date, leads, calls, contacts, scheduled, sits, sales, ap) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (user_id, metric_date) DO UPDATE SET \
                leads = EXCLUDED.leads, calls = EXCLUDED.calls, contacts = EXCLUDED.contacts, \
                scheduled = EXCLUDED.scheduled, sits = EXCLUDED.sits, sales = EXCLUDED.sales, \
                ap = EXCLUDED.ap, updated_at = now() \
             RETURNING {}",
            METRIC_COLUMNS
        );

        let metric = sqlx::query_as::<_, DailyMetric>(&sql)
            .bind(user_id)
            .bind(metric_date)
            .bind(input.leads)
            .bind(input.calls)
            .bind(input.contacts)
            .bind(input.scheduled)
            .bind(input.sits)
            .bind(input.sales)
            .bind(input.ap)
            .fetch_one(&self.pool)
            .await?;

        info!(user_id = %user_id, date = %metric_date, "Daily metrics saved");
        self.feed.publish(
            ChangeEvent::new(Table::DailyMetrics, ChangeAction::Update, format!("{}:{}", user_id, metric_date))
                .for_user(user_id),
        );
        Ok(metric)
    }

    /// Snapshots for any of `user_ids` within the inclusive range, oldest first.
    pub async fn range(&self, user_ids: &[Uuid], range: DateRange) -> Result<Vec<DailyMetric>, ServiceError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {} FROM daily_metrics \
             WHERE user_id = ANY($1) \
               AND ($2::date IS NULL OR metric_date >= $2) \
               AND ($3::date IS NULL OR metric_date <= $3) \
             ORDER BY metric_date, user_id",
            METRIC_COLUMNS
        );
        let rows = sqlx::query_as::<_, DailyMetric>(&sql)
            .bind(user_ids)
            .bind(range.from)
            .bind(range.to)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn delete_day(&self, user_id: Uuid, metric_date: NaiveDate) -> Result<bool, ServiceError> {
        let result = sqlx::query("DELETE FROM daily_metrics WHERE user_id = $1 AND metric_date = $2")
            .bind(user_id)
            .bind(metric_date)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(user_id = %user_id, date = %metric_date, "Daily metrics deleted");
            self.feed.publish(
                ChangeEvent::new(Table::DailyMetrics, ChangeAction::Delete, format!("{}:{}", user_id, metric_date))
                    .for_user(user_id),
            );
        }
        Ok(deleted)
    }
}
