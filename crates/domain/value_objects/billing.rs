use chrono::{DateTime, Utc};
use serde::Serialize;

use uuid::Uuid;

use crate::domain::{
    entities::billing::BillingSubscriptionEntity,
    value_objects::enums::subscription_statuses::SubscriptionStatus,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingSubscriptionDto {
    pub status: String,
    pub current_period_end: Option<DateTime<Utc>>,
}

impl From<BillingSubscriptionEntity> for BillingSubscriptionDto {
    fn from(value: BillingSubscriptionEntity) -> Self {
        Self {
            status: value.status,
            current_period_end: value.current_period_end,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutResponse {
    pub checkout_url: String,
}

/// Subscription state as reported by the payment processor.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewaySubscription {
    pub id: String,
    pub status: SubscriptionStatus,
    pub current_period_end: Option<DateTime<Utc>>,
}

/// Verified billing webhook, reduced to what the subscription sync acts on.
#[derive(Debug, Clone, PartialEq)]
pub enum BillingWebhookEvent {
    CheckoutCompleted {
        user_id: Option<Uuid>,
        subscription_id: Option<String>,
    },
    SubscriptionUpdated(GatewaySubscription),
    SubscriptionDeleted {
        subscription_id: String,
    },
    InvoicePaymentFailed {
        subscription_id: Option<String>,
    },
    Ignored {
        event_type: String,
    },
}
