use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::campaigns;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable, PartialEq)]
#[diesel(table_name = campaigns)]
pub struct CampaignEntity {
    pub id: Uuid,
    pub user_id: Uuid,
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
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = campaigns)]
pub struct InsertCampaignEntity {
    pub user_id: Uuid,
    pub name: String,
    pub message: String,
    pub media_url: Option<String>,
    pub group_id: Uuid,
    pub status: String,
    pub processing_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
