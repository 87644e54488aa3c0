use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::ServiceError;
use crate::database::models::{FormFieldPosition, FormSectionPosition};
use crate::forms::{FormLayout, LayoutTarget};
use crate::realtime::{ChangeEvent, ChangeFeed, Table};
use crate::types::ChangeAction;

/// Saved per-user ordering of a form's sections and fields.
pub struct FormLayoutService {
    pool: PgPool,
    feed: ChangeFeed,
}

impl FormLayoutService {
    pub fn new(pool: PgPool, feed: ChangeFeed) -> Self {
        Self { pool, feed }
    }

    pub async fn load(&self, user_id: Uuid, form_key: &str) -> Result<FormLayout, ServiceError> {
        let sections = sqlx::query_as::<_, FormSectionPosition>(
            "SELECT user_id, form_key, section_key, position FROM form_section_positions \
             WHERE user_id = $1 AND form_key = $2",
        )
        .bind(user_id)
        .bind(form_key)
        .fetch_all(&self.pool)
        .await?;

        let fields = sqlx::query_as::<_, FormFieldPosition>(
            "SELECT user_id, form_key, field_key, section_key, position FROM form_field_positions \
             WHERE user_id = $1 AND form_key = $2",
        )
        .bind(user_id)
        .bind(form_key)
        .fetch_all(&self.pool)
        .await?;

        Ok(FormLayout::from_rows(sections, fields))
    }

    /// Replace the whole layout in one transaction, renumbering positions in
    /// submitted order.
    pub async fn replace(&self, user_id: Uuid, form_key: &str, layout: &FormLayout) -> Result<FormLayout, ServiceError> {
        layout.validate()?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM form_section_positions WHERE user_id = $1 AND form_key = $2")
            .bind(user_id)
            .bind(form_key)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM form_field_positions WHERE user_id = $1 AND form_key = $2")
            .bind(user_id)
            .bind(form_key)
            .execute(&mut *tx)
            .await?;

        for (section_key, position) in layout.section_rows() {
            sqlx::query(
                "INSERT INTO form_section_positions (user_id, form_key, section_key, position) VALUES ($1, $2, $3, $4)",
            )
            .bind(user_id)
            .bind(form_key)
            .bind(section_key)
            .bind(position)
            .execute(&mut *tx)
            .await?;
        }

        for (field_key, section_key, position) in layout.field_rows() {
            sqlx::query(
                "INSERT INTO form_field_positions (user_id, form_key, field_key, section_key, position) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(user_id)
            .bind(form_key)
            .bind(field_key)
            .bind(section_key)
            .bind(position)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            user_id = %user_id,
            form_key = %form_key,
            sections = layout.sections.len(),
            fields = layout.fields.len(),
            "Form layout saved"
        );
        self.publish_saved(user_id, form_key);
        Ok(layout.clone())
    }

    /// Both position tables are rewritten on every save.
    fn publish_saved(&self, user_id: Uuid, form_key: &str) {
        for table in [Table::FormSectionPositions, Table::FormFieldPositions] {
            self.feed.publish(
                ChangeEvent::new(table, ChangeAction::Update, format!("{}:{}", user_id, form_key)).for_user(user_id),
            );
        }
    }

    pub async fn move_item(
        &self,
        user_id: Uuid,
        form_key: &str,
        target: LayoutTarget,
        from: usize,
        to: usize,
    ) -> Result<FormLayout, ServiceError> {
        let mut layout = self.load(user_id, form_key).await?;
        layout.move_item(target, from, to)?;
        self.replace(user_id, form_key, &layout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::database::DatabaseManager;

    #[tokio::test]
    async fn saving_announces_sections_and_fields() {
        let config = AppConfig::for_tests();
        let db = DatabaseManager::connect_lazy(&config.database).unwrap();
        let feed = ChangeFeed::new(8);
        let mut rx = feed.subscribe();
        let service = FormLayoutService::new(db.pool().clone(), feed);

        let user_id = Uuid::new_v4();
        service.publish_saved(user_id, "client_intake");

        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert_eq!(first.table, Table::FormSectionPositions);
        assert_eq!(second.table, Table::FormFieldPositions);
        for event in [first, second] {
            assert_eq!(event.id, format!("{}:client_intake", user_id));
            assert_eq!(event.user_id, Some(user_id));
        }
        assert!(rx.try_recv().is_err());
    }
}
