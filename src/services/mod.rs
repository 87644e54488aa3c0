pub mod billing_service;
pub mod bulletin_service;
pub mod directory;
pub mod expense_service;
pub mod form_layout_service;
pub mod metrics_service;
pub mod team_service;

pub use billing_service::{BillingError, BillingProvider, CanceledSubscription, PortalSession, StripeClient};
pub use bulletin_service::{BulletinService, BulletinView, NewBulletin};
pub use directory::{Directory, PgDirectory};
pub use expense_service::{ExpenseService, NewExpense};
pub use form_layout_service::FormLayoutService;
pub use metrics_service::MetricsService;
pub use team_service::TeamService;

use std::collections::HashMap;
use thiserror::Error;

use crate::database::DatabaseError;
use crate::forms::LayoutError;

/// Failures shared by the table services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("invalid input")]
    Invalid(HashMap<String, String>),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Database(DatabaseError::from(err))
    }
}

impl ServiceError {
    pub fn invalid(field: &str, message: &str) -> Self {
        ServiceError::Invalid(HashMap::from([(field.to_string(), message.to_string())]))
    }
}
