use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct FormFieldPosition {
    pub user_id: Uuid,
    pub form_key: String,
    pub field_key: String,
    pub section_key: String,
    pub position: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct FormSectionPosition {
    pub user_id: Uuid,
    pub form_key: String,
    pub section_key: String,
    pub position: i32,
}
