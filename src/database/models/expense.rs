use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LeadExpense {
    pub id: Uuid,
    pub user_id: Uuid,
    pub expense_date: NaiveDate,
    pub lead_count: i32,
    pub amount: Decimal,
    pub vendor: Option<String>,
    pub created_at: DateTime<Utc>,
}
