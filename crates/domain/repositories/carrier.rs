use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::value_objects::carrier::{CarrierSendResult, OutboundMessage};

#[automock]
#[async_trait]
pub trait CarrierClient {
    /// Sends one message. Carrier-side rejections come back as `Ok` with a failed status;
    /// `Err` means the request itself did not complete.
    async fn send_message(&self, message: OutboundMessage) -> Result<CarrierSendResult>;
}
