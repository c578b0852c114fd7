pub mod billing;
pub mod campaign_analytics;
pub mod campaigns;
pub mod contacts;
pub mod message_logs;
