pub mod campaign_statuses;
pub mod delivery_statuses;
pub mod processing_statuses;
pub mod subscription_statuses;
