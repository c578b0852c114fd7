use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    entities::campaigns::{CampaignEntity, InsertCampaignEntity},
    value_objects::enums::{campaign_statuses::CampaignStatus, processing_statuses::ProcessingStatus},
};

pub const MAX_MESSAGE_CHARS: usize = 160;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CampaignMessageError {
    #[error("message is required")]
    Empty,
    #[error("message must be at most 160 characters (got {0})")]
    TooLong(usize),
}

/// A single-segment SMS body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignMessage(String);

impl CampaignMessage {
    pub fn parse(raw: &str) -> Result<Self, CampaignMessageError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CampaignMessageError::Empty);
        }

        let chars = trimmed.chars().count();
        if chars > MAX_MESSAGE_CHARS {
            return Err(CampaignMessageError::TooLong(chars));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampaignModel {
    pub name: String,
    pub message: String,
    pub media_url: Option<String>,
    pub group_id: Uuid,
}

impl CreateCampaignModel {
    pub fn to_entity(&self, user_id: Uuid, message: CampaignMessage) -> InsertCampaignEntity {
        let now = Utc::now();
        InsertCampaignEntity {
            user_id,
            name: self.name.trim().to_string(),
            message: message.into_inner(),
            media_url: self
                .media_url
                .as_deref()
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(str::to_string),
            group_id: self.group_id,
            status: CampaignStatus::Draft.to_string(),
            processing_status: ProcessingStatus::Pending.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleCampaignModel {
    pub scheduled_for: Option<DateTime<Utc>>,
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignDto {
    pub id: Uuid,
    pub name: String,
    pub message: String,
    pub media_url: Option<String>,
    pub group_id: Uuid,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub timezone: Option<String>,
    pub status: String,
    pub processing_status: String,
    pub error_message: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<CampaignEntity> for CampaignDto {
    fn from(value: CampaignEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            message: value.message,
            media_url: value.media_url,
            group_id: value.group_id,
            scheduled_for: value.scheduled_for,
            timezone: value.timezone,
            status: value.status,
            processing_status: value.processing_status,
            error_message: value.error_message,
            sent_at: value.sent_at,
            created_at: value.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_single_segment_messages() {
        let message = CampaignMessage::parse("  Flash sale today only!  ").unwrap();
        assert_eq!(message.as_str(), "Flash sale today only!");

        let exactly_160 = "a".repeat(MAX_MESSAGE_CHARS);
        assert!(CampaignMessage::parse(&exactly_160).is_ok());
    }

    #[test]
    fn rejects_empty_and_oversized_messages() {
        assert_eq!(CampaignMessage::parse("   "), Err(CampaignMessageError::Empty));
        assert_eq!(
            CampaignMessage::parse(&"b".repeat(161)),
            Err(CampaignMessageError::TooLong(161))
        );
    }

    #[test]
    fn counts_characters_not_bytes() {
        let emoji = "🎉".repeat(MAX_MESSAGE_CHARS);
        assert!(CampaignMessage::parse(&emoji).is_ok());
    }

    #[test]
    fn new_campaigns_start_as_pending_drafts() {
        let model = CreateCampaignModel {
            name: " Spring promo ".to_string(),
            message: "hello".to_string(),
            media_url: Some("  ".to_string()),
            group_id: Uuid::new_v4(),
        };
        let user_id = Uuid::new_v4();
        let entity = model.to_entity(user_id, CampaignMessage::parse("hello").unwrap());

        assert_eq!(entity.user_id, user_id);
        assert_eq!(entity.name, "Spring promo");
        assert_eq!(entity.media_url, None);
        assert_eq!(entity.status, "draft");
        assert_eq!(entity.processing_status, "pending");
    }
}
