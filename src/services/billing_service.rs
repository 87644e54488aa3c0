use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::BillingConfig;

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("billing provider is not configured")]
    NotConfigured,

    #[error("invalid billing API base URL: {0}")]
    InvalidUrl(String),

    #[error("billing provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortalSession {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CanceledSubscription {
    pub id: String,
    pub status: String,
}

/// Hosted payment provider operations used by the billing functions.
#[async_trait]
pub trait BillingProvider: Send + Sync {
    async fn create_portal_session(&self, customer_id: &str, return_url: &str) -> Result<PortalSession, BillingError>;

    async fn cancel_subscription(&self, subscription_id: &str) -> Result<CanceledSubscription, BillingError>;
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

/// Stripe REST client. Requests are form-encoded and authenticated with the
/// secret key as a bearer token.
pub struct StripeClient {
    http: reqwest::Client,
    api_base: url::Url,
    secret_key: String,
}

impl StripeClient {
    pub fn new(config: &BillingConfig) -> Result<Self, BillingError> {
        let api_base = url::Url::parse(&config.stripe_api_base)
            .map_err(|_| BillingError::InvalidUrl(config.stripe_api_base.clone()))?;

        Ok(Self {
            http: reqwest::Client::new(),
            api_base,
            secret_key: config.stripe_secret_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<url::Url, BillingError> {
        self.api_base
            .join(path)
            .map_err(|_| BillingError::InvalidUrl(format!("{}{}", self.api_base, path)))
    }

    /// `/v1/subscriptions/<id>` with the id percent-encoded as one segment.
    fn subscription_endpoint(&self, subscription_id: &str) -> Result<url::Url, BillingError> {
        let mut url = self.endpoint("/v1/subscriptions")?;
        url.path_segments_mut()
            .map_err(|_| BillingError::InvalidUrl(self.api_base.to_string()))?
            .pop_if_empty()
            .push(subscription_id);
        Ok(url)
    }

    fn ensure_configured(&self) -> Result<(), BillingError> {
        if self.secret_key.is_empty() {
            return Err(BillingError::NotConfigured);
        }
        Ok(())
    }

    async fn decode<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> Result<T, BillingError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let message = match response.json::<StripeErrorBody>().await {
            Ok(body) => body.error.message.unwrap_or_else(|| status.to_string()),
            Err(_) => status.to_string(),
        };
        warn!(status = status.as_u16(), message = %message, "Billing provider request failed");
        Err(BillingError::Provider {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl BillingProvider for StripeClient {
    async fn create_portal_session(&self, customer_id: &str, return_url: &str) -> Result<PortalSession, BillingError> {
        self.ensure_configured()?;
        let url = self.endpoint("/v1/billing_portal/sessions")?;

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.secret_key)
            .form(&[("customer", customer_id), ("return_url", return_url)])
            .send()
            .await?;

        let session: PortalSession = Self::decode(response).await?;
        info!(customer_id = %customer_id, session_id = %session.id, "Billing portal session created");
        Ok(session)
    }

    async fn cancel_subscription(&self, subscription_id: &str) -> Result<CanceledSubscription, BillingError> {
        self.ensure_configured()?;
        let url = self.subscription_endpoint(subscription_id)?;

        let response = self.http.delete(url).bearer_auth(&self.secret_key).send().await?;

        let canceled: CanceledSubscription = Self::decode(response).await?;
        info!(subscription_id = %subscription_id, status = %canceled.status, "Subscription canceled");
        Ok(canceled)
    }
}
