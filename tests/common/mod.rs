#![allow(dead_code)]

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use agencyhub_api::config::DatabaseConfig;
use agencyhub_api::database::models::Profile;
use agencyhub_api::database::DatabaseManager;
use agencyhub_api::roles::RoleSet;

pub fn profile(email: &str, manager_id: Option<Uuid>) -> Profile {
    let now = Utc::now();
    Profile {
        id: Uuid::new_v4(),
        email: email.to_string(),
        full_name: None,
        manager_id,
        language: "en".to_string(),
        stripe_customer_id: None,
        stripe_subscription_id: None,
        subscription_status: None,
        created_at: now,
        updated_at: now,
    }
}

/// Role set from names; unknown names are dropped like stored rows.
pub fn roles(names: &[&str]) -> RoleSet {
    RoleSet::from_names(names.iter().copied())
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// Migrated pool for `DATABASE_URL`, or `None` when no database is configured.
pub async fn database() -> Result<Option<PgPool>> {
    let _ = dotenvy::dotenv();
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping database test");
        return Ok(None);
    };

    let config = DatabaseConfig {
        url,
        max_connections: 4,
        connection_timeout: 10,
        run_migrations: true,
    };
    let db = DatabaseManager::connect(&config).await?;
    db.migrate().await?;
    Ok(Some(db.pool().clone()))
}

/// Stored profile with a unique email. Every other column keeps its default.
pub async fn insert_profile(pool: &PgPool, label: &str) -> Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO profiles (id, email) VALUES ($1, $2)")
        .bind(id)
        .bind(format!("{}+{}@agency.test", label, id.simple()))
        .execute(pool)
        .await?;
    Ok(id)
}
