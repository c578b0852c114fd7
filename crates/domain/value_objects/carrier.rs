use serde::Deserialize;

use crate::domain::value_objects::enums::delivery_statuses::DeliveryStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub to: String,
    pub from: String,
    pub body: String,
    pub media_url: Option<String>,
    pub status_callback: Option<String>,
}

/// What the carrier reported for one send attempt, successful or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierSendResult {
    pub sid: Option<String>,
    pub status: DeliveryStatus,
    pub error_message: Option<String>,
}

impl CarrierSendResult {
    pub fn transport_failure(error_message: String) -> Self {
        Self {
            sid: None,
            status: DeliveryStatus::Failed,
            error_message: Some(error_message),
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.sid.is_some() && !self.status.is_failure()
    }
}

/// Status callback form posted by the carrier.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliveryStatusCallback {
    #[serde(rename = "MessageStatus")]
    pub message_status: Option<String>,
    #[serde(rename = "MessageSid")]
    pub message_sid: Option<String>,
    #[serde(rename = "ErrorCode")]
    pub error_code: Option<String>,
    #[serde(rename = "ErrorMessage")]
    pub error_message: Option<String>,
}

impl DeliveryStatusCallback {
    /// Carrier error detail to store alongside the status, if any.
    pub fn error_detail(&self) -> Option<String> {
        let code = self.error_code.as_deref().map(str::trim).filter(|c| !c.is_empty());
        let message = self
            .error_message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty());

        match (code, message) {
            (Some(code), Some(message)) => Some(format!("{code}: {message}")),
            (Some(code), None) => Some(format!("carrier error {code}")),
            (None, Some(message)) => Some(message.to_string()),
            (None, None) => None,
        }
    }
}

/// Inbound message form posted by the carrier.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundMessageCallback {
    #[serde(rename = "Body")]
    pub body: Option<String>,
    #[serde(rename = "From")]
    pub from: Option<String>,
}
