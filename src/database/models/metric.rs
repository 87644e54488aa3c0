use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One user's business counters for one calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct DailyMetric {
    pub user_id: Uuid,
    pub metric_date: NaiveDate,
    pub leads: i32,
    pub calls: i32,
    pub contacts: i32,
    pub scheduled: i32,
    pub sits: i32,
    pub sales: i32,
    /// Annual premium written.
    pub ap: Decimal,
    pub updated_at: DateTime<Utc>,
}
