use std::collections::HashMap;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use sha2::Sha256;
use tracing::error;
use uuid::Uuid;

use crate::domain::{
    repositories::payment_gateway::PaymentGateway,
    value_objects::{
        billing::{BillingWebhookEvent, GatewaySubscription},
        enums::subscription_statuses::SubscriptionStatus,
    },
};

type HmacSha256 = Hmac<Sha256>;

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";
/// Signed webhooks older than this are rejected as replays.
const WEBHOOK_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Clone)]
pub struct StripeSettings {
    pub secret_key: String,
    pub webhook_secret: String,
    pub price_id: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// Stripe REST client for subscription checkout, built on reqwest.
pub struct StripeClient {
    http: reqwest::Client,
    settings: StripeSettings,
}

#[derive(Debug, Deserialize)]
struct StripeEvent {
    #[serde(rename = "type")]
    type_: String,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct StripeCheckoutSession {
    subscription: Option<String>,
    client_reference_id: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct StripeInvoice {
    subscription: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeSubscription {
    id: String,
    status: String,
    current_period_end: Option<i64>,
    #[serde(default)]
    items: StripeSubscriptionItems,
}

#[derive(Debug, Default, Deserialize)]
struct StripeSubscriptionItems {
    data: Vec<StripeSubscriptionItem>,
}

#[derive(Debug, Deserialize)]
struct StripeSubscriptionItem {
    current_period_end: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorDetails,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetails {
    #[serde(rename = "type")]
    type_: Option<String>,
    code: Option<String>,
    message: Option<String>,
}

impl From<StripeSubscription> for GatewaySubscription {
    fn from(value: StripeSubscription) -> Self {
        // Newer API versions only carry the period on the subscription items.
        let period_end = value.current_period_end.or_else(|| {
            value
                .items
                .data
                .first()
                .and_then(|item| item.current_period_end)
        });

        Self {
            id: value.id,
            status: SubscriptionStatus::from_stripe(&value.status),
            current_period_end: period_end.and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
        }
    }
}

impl StripeClient {
    pub fn new(settings: StripeSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }

    async fn ensure_success(resp: reqwest::Response, action: &str) -> Result<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let request_id = resp
            .headers()
            .get("request-id")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = resp.text().await.unwrap_or_default();
        let details = serde_json::from_str::<StripeErrorEnvelope>(&body)
            .ok()
            .map(|envelope| envelope.error);

        error!(
            status = %status,
            stripe_request_id = ?request_id,
            stripe_error_type = ?details.as_ref().and_then(|d| d.type_.clone()),
            stripe_error_code = ?details.as_ref().and_then(|d| d.code.clone()),
            stripe_error_message = ?details.as_ref().and_then(|d| d.message.clone()),
            action,
            "billing: stripe request failed"
        );

        bail!("Stripe API request failed: {action} (status {status})")
    }

    /// https://stripe.com/docs/webhooks/signatures
    fn verify_webhook_at(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: DateTime<Utc>,
    ) -> Result<BillingWebhookEvent> {
        let mut timestamp = None;
        let mut signatures = Vec::new();
        for part in signature_header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", value)) => timestamp = Some(value.to_string()),
                Some(("v1", value)) => signatures.push(value.to_string()),
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or_else(|| anyhow!("missing timestamp in stripe-signature"))?;
        if signatures.is_empty() {
            bail!("missing v1 in stripe-signature");
        }

        let issued_at: i64 = timestamp.parse().context("invalid stripe-signature timestamp")?;
        if (now.timestamp() - issued_at).abs() > WEBHOOK_TOLERANCE_SECS {
            bail!("stripe-signature timestamp outside tolerance");
        }

        let valid = signatures.iter().any(|signature| {
            let Ok(provided) = hex::decode(signature) else {
                return false;
            };
            let Ok(mut mac) = HmacSha256::new_from_slice(self.settings.webhook_secret.as_bytes())
            else {
                return false;
            };
            mac.update(timestamp.as_bytes());
            mac.update(b".");
            mac.update(payload);
            mac.verify_slice(&provided).is_ok()
        });
        if !valid {
            bail!("invalid webhook signature");
        }

        let event: StripeEvent = serde_json::from_slice(payload).context("invalid event payload")?;
        decode_event(event)
    }
}

fn decode_event(event: StripeEvent) -> Result<BillingWebhookEvent> {
    let object = event.data.object;

    let decoded = match event.type_.as_str() {
        "checkout.session.completed" => {
            let session: StripeCheckoutSession = serde_json::from_value(object)?;
            let user_id = session
                .metadata
                .get("user_id")
                .or(session.client_reference_id.as_ref())
                .and_then(|raw| Uuid::parse_str(raw).ok());

            BillingWebhookEvent::CheckoutCompleted {
                user_id,
                subscription_id: session.subscription,
            }
        }
        "customer.subscription.updated" => {
            let subscription: StripeSubscription = serde_json::from_value(object)?;
            BillingWebhookEvent::SubscriptionUpdated(subscription.into())
        }
        "customer.subscription.deleted" => {
            let subscription: StripeSubscription = serde_json::from_value(object)?;
            BillingWebhookEvent::SubscriptionDeleted {
                subscription_id: subscription.id,
            }
        }
        "invoice.payment_failed" => {
            let invoice: StripeInvoice = serde_json::from_value(object)?;
            BillingWebhookEvent::InvoicePaymentFailed {
                subscription_id: invoice.subscription,
            }
        }
        other => BillingWebhookEvent::Ignored {
            event_type: other.to_string(),
        },
    };

    Ok(decoded)
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn create_customer(&self, user_id: Uuid, email: Option<String>) -> Result<String> {
        // https://stripe.com/docs/api/customers/create
        let mut form = vec![("metadata[user_id]", user_id.to_string())];
        if let Some(email) = email {
            form.push(("email", email));
        }

        let resp = self
            .http
            .post(format!("{STRIPE_API_BASE}/customers"))
            .header(AUTHORIZATION, format!("Bearer {}", self.settings.secret_key))
            .form(&form)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create customer").await?;

        #[derive(Deserialize)]
        struct CustomerResp {
            id: String,
        }

        Ok(resp.json::<CustomerResp>().await?.id)
    }

    async fn create_checkout_session(&self, customer_id: String, user_id: Uuid) -> Result<String> {
        // https://stripe.com/docs/api/checkout/sessions/create
        let user_id = user_id.to_string();
        let form = [
            ("mode", "subscription".to_string()),
            ("customer", customer_id),
            ("line_items[0][price]", self.settings.price_id.clone()),
            ("line_items[0][quantity]", "1".to_string()),
            ("success_url", self.settings.success_url.clone()),
            ("cancel_url", self.settings.cancel_url.clone()),
            ("client_reference_id", user_id.clone()),
            ("metadata[user_id]", user_id.clone()),
            ("subscription_data[metadata][user_id]", user_id),
        ];

        let resp = self
            .http
            .post(format!("{STRIPE_API_BASE}/checkout/sessions"))
            .header(AUTHORIZATION, format!("Bearer {}", self.settings.secret_key))
            .form(&form)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create checkout session").await?;

        #[derive(Deserialize)]
        struct CheckoutResp {
            url: Option<String>,
        }

        resp.json::<CheckoutResp>()
            .await?
            .url
            .ok_or_else(|| anyhow!("Stripe Checkout session URL is missing"))
    }

    async fn retrieve_subscription(&self, subscription_id: String) -> Result<GatewaySubscription> {
        // https://stripe.com/docs/api/subscriptions/retrieve
        let resp = self
            .http
            .get(format!("{STRIPE_API_BASE}/subscriptions/{subscription_id}"))
            .header(AUTHORIZATION, format!("Bearer {}", self.settings.secret_key))
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "retrieve subscription").await?;

        Ok(resp.json::<StripeSubscription>().await?.into())
    }

    fn verify_webhook(&self, payload: &[u8], signature_header: &str) -> Result<BillingWebhookEvent> {
        self.verify_webhook_at(payload, signature_header, Utc::now())
    }
}
