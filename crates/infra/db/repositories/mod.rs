pub mod billing;
pub mod campaign_analytics;
pub mod campaign_dispatch;
pub mod campaigns;
pub mod contacts;
pub mod delivery_tracking;
