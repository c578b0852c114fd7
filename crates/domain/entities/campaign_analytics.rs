use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::campaign_analytics;

#[derive(Debug, Clone, Selectable, Queryable, PartialEq)]
#[diesel(table_name = campaign_analytics)]
pub struct CampaignAnalyticsEntity {
    pub campaign_id: Uuid,
    pub total_count: i32,
    pub delivered_count: i32,
    pub failed_count: i32,
    pub pending_count: i32,
    pub delivery_rate: f64,
    pub open_rate: f64,
    pub click_rate: f64,
    pub cost_minor: i64,
    pub revenue_minor: i64,
    pub reconciled_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Counter columns written after every adjustment. `reconciled_at` is only set by a
/// full recomputation and left untouched when `None`.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = campaign_analytics)]
pub struct CampaignAnalyticsCountersChangeset {
    pub total_count: i32,
    pub delivered_count: i32,
    pub failed_count: i32,
    pub pending_count: i32,
    pub delivery_rate: f64,
    pub reconciled_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}
