use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha1::Sha1;
use tracing::{debug, warn};

use crate::domain::{
    repositories::carrier::CarrierClient,
    value_objects::{
        carrier::{CarrierSendResult, OutboundMessage},
        enums::delivery_statuses::DeliveryStatus,
    },
};

type HmacSha1 = Hmac<Sha1>;

pub const DEFAULT_TWILIO_API_BASE_URL: &str = "https://api.twilio.com";

/// Programmable Messaging client built on reqwest.
pub struct TwilioClient {
    http: reqwest::Client,
    api_base_url: String,
    account_sid: String,
    auth_token: String,
}

#[derive(Debug, Deserialize)]
struct TwilioMessageResponse {
    sid: String,
    status: Option<String>,
    error_code: Option<i64>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TwilioErrorResponse {
    code: Option<i64>,
    message: Option<String>,
}

impl TwilioClient {
    pub fn new(api_base_url: String, account_sid: String, auth_token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            account_sid,
            auth_token,
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base_url, self.account_sid
        )
    }
}

#[async_trait]
impl CarrierClient for TwilioClient {
    async fn send_message(&self, message: OutboundMessage) -> Result<CarrierSendResult> {
        // https://www.twilio.com/docs/messaging/api/message-resource#create-a-message-resource
        let mut form: Vec<(&str, String)> = vec![
            ("To", message.to.clone()),
            ("From", message.from),
            ("Body", message.body),
        ];
        if let Some(media_url) = message.media_url {
            form.push(("MediaUrl", media_url));
        }
        if let Some(status_callback) = message.status_callback {
            form.push(("StatusCallback", status_callback));
        }

        let resp = self
            .http
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
            .send()
            .await
            .context("twilio request failed")?;

        let status = resp.status();
        let body = resp.text().await.context("failed to read twilio response")?;

        if !status.is_success() {
            let detail = serde_json::from_str::<TwilioErrorResponse>(&body).ok();
            let error_message = match detail {
                Some(TwilioErrorResponse {
                    code: Some(code),
                    message: Some(text),
                }) => format!("{code}: {text}"),
                Some(TwilioErrorResponse {
                    message: Some(text),
                    ..
                }) => text,
                _ => format!("carrier rejected message with status {status}"),
            };

            warn!(
                http_status = %status,
                to = %message.to,
                error = %error_message,
                "twilio: message rejected"
            );
            return Ok(CarrierSendResult::transport_failure(error_message));
        }

        let parsed: TwilioMessageResponse =
            serde_json::from_str(&body).context("unexpected twilio response body")?;
        debug!(sid = %parsed.sid, status = ?parsed.status, "twilio: message accepted");

        let error_message = match (parsed.error_code, parsed.error_message) {
            (Some(code), Some(text)) => Some(format!("{code}: {text}")),
            (None, Some(text)) => Some(text),
            (Some(code), None) => Some(format!("carrier error {code}")),
            (None, None) => None,
        };

        Ok(CarrierSendResult {
            sid: Some(parsed.sid),
            status: parsed
                .status
                .as_deref()
                .map(DeliveryStatus::parse)
                .unwrap_or(DeliveryStatus::Queued),
            error_message,
        })
    }
}

fn signing_mac(auth_token: &str, url: &str, params: &[(String, String)]) -> Result<HmacSha1> {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort();

    let mut mac = HmacSha1::new_from_slice(auth_token.as_bytes())?;
    mac.update(url.as_bytes());
    for (key, value) in sorted {
        mac.update(key.as_bytes());
        mac.update(value.as_bytes());
    }
    Ok(mac)
}

/// Computes `X-Twilio-Signature` for a form-encoded webhook: base64 HMAC-SHA1 of the full
/// request URL followed by every parameter name and value, sorted by name.
pub fn twilio_signature(auth_token: &str, url: &str, params: &[(String, String)]) -> Result<String> {
    let mac = signing_mac(auth_token, url, params)?;
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Checks a webhook request against its `X-Twilio-Signature` header.
pub fn verify_twilio_signature(
    auth_token: &str,
    url: &str,
    params: &[(String, String)],
    signature_header: &str,
) -> Result<()> {
    let provided = STANDARD
        .decode(signature_header.trim())
        .context("signature is not valid base64")?;

    signing_mac(auth_token, url, params)?
        .verify_slice(&provided)
        .map_err(|_| anyhow::anyhow!("invalid twilio signature"))
}
