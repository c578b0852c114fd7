use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Carrier-reported state of one outbound message. Unknown carrier codes are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum DeliveryStatus {
    Queued,
    Accepted,
    Sending,
    Sent,
    Delivered,
    Undelivered,
    Failed,
    Canceled,
    Read,
    Other(String),
}

/// Aggregation bucket a delivery status counts towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryBucket {
    Delivered,
    Failed,
    Pending,
}

impl DeliveryStatus {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "queued" => DeliveryStatus::Queued,
            "accepted" => DeliveryStatus::Accepted,
            "sending" => DeliveryStatus::Sending,
            "sent" => DeliveryStatus::Sent,
            "delivered" => DeliveryStatus::Delivered,
            "undelivered" => DeliveryStatus::Undelivered,
            "failed" => DeliveryStatus::Failed,
            "canceled" => DeliveryStatus::Canceled,
            "read" => DeliveryStatus::Read,
            other => DeliveryStatus::Other(other.to_string()),
        }
    }

    pub fn bucket(&self) -> DeliveryBucket {
        match self {
            DeliveryStatus::Delivered | DeliveryStatus::Read => DeliveryBucket::Delivered,
            DeliveryStatus::Undelivered | DeliveryStatus::Failed | DeliveryStatus::Canceled => {
                DeliveryBucket::Failed
            }
            _ => DeliveryBucket::Pending,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.bucket() == DeliveryBucket::Failed
    }
}

impl Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            DeliveryStatus::Queued => "queued",
            DeliveryStatus::Accepted => "accepted",
            DeliveryStatus::Sending => "sending",
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Undelivered => "undelivered",
            DeliveryStatus::Failed => "failed",
            DeliveryStatus::Canceled => "canceled",
            DeliveryStatus::Read => "read",
            DeliveryStatus::Other(code) => code.as_str(),
        };
        write!(f, "{}", status)
    }
}

impl From<String> for DeliveryStatus {
    fn from(value: String) -> Self {
        DeliveryStatus::parse(&value)
    }
}

impl From<DeliveryStatus> for String {
    fn from(value: DeliveryStatus) -> Self {
        value.to_string()
    }
}
