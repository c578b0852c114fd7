pub mod billing;
pub mod campaign_analytics;
pub mod campaign_dispatch;
pub mod campaigns;
pub mod carrier;
pub mod contacts;
pub mod delivery_tracking;
pub mod payment_gateway;
pub mod storage;
