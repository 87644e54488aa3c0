use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::ServiceError;
use crate::database::models::LeadExpense;
use crate::realtime::{ChangeEvent, ChangeFeed, Table};
use crate::types::{ChangeAction, DateRange};

#[derive(Debug, Clone, Deserialize)]
pub struct NewExpense {
    pub expense_date: NaiveDate,
    #[serde(default)]
    pub lead_count: i32,
    pub amount: Decimal,
    pub vendor: Option<String>,
}

const EXPENSE_COLUMNS: &str = "id, user_id, expense_date, lead_count, amount, vendor, created_at";

/// Lead purchase records.
pub struct ExpenseService {
    pool: PgPool,
    feed: ChangeFeed,
}

impl ExpenseService {
    pub fn new(pool: PgPool, feed: ChangeFeed) -> Self {
        Self { pool, feed }
    }

    pub async fn record(&self, user_id: Uuid, new: &NewExpense) -> Result<LeadExpense, ServiceError> {
        if new.lead_count < 0 {
            return Err(ServiceError::invalid("lead_count", "must not be negative"));
        }
        if new.amount.is_sign_negative() && !new.amount.is_zero() {
            return Err(ServiceError::invalid("amount", "must not be negative"));
        }

        let sql = format!(
            "INSERT INTO lead_expenses (id, user_id, expense_date, lead_count, amount, vendor) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            EXPENSE_COLUMNS
        );
        let vendor = new.vendor.as_deref().map(str::trim).filter(|v| !v.is_empty());

        let expense = sqlx::query_as::<_, LeadExpense>(&sql)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(new.expense_date)
            .bind(new.lead_count)
            .bind(new.amount)
            .bind(vendor)
            .fetch_one(&self.pool)
            .await?;

        info!(expense_id = %expense.id, user_id = %user_id, "Lead expense recorded");
        self.feed
            .publish(ChangeEvent::new(Table::LeadExpenses, ChangeAction::Insert, expense.id).for_user(user_id));
        Ok(expense)
    }

    pub async fn list(&self, user_id: Uuid, range: DateRange) -> Result<Vec<LeadExpense>, ServiceError> {
        let sql = format!(
            "SELECT {} FROM lead_expenses \
             WHERE user_id = $1 \
               AND ($2::date IS NULL OR expense_date >= $2) \
               AND ($3::date IS NULL OR expense_date <= $3) \
             ORDER BY expense_date DESC, created_at DESC",
            EXPENSE_COLUMNS
        );
        let rows = sqlx::query_as::<_, LeadExpense>(&sql)
            .bind(user_id)
            .bind(range.from)
            .bind(range.to)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Only the owner's own rows are deleted.
    pub async fn delete(&self, user_id: Uuid, expense_id: Uuid) -> Result<bool, ServiceError> {
        let result = sqlx::query("DELETE FROM lead_expenses WHERE id = $1 AND user_id = $2")
            .bind(expense_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            self.feed
                .publish(ChangeEvent::new(Table::LeadExpenses, ChangeAction::Delete, expense_id).for_user(user_id));
        }
        Ok(deleted)
    }
}
