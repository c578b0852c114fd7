pub mod delivery_webhook;
pub mod dispatch_campaign;
pub mod opt_out;
pub mod process_scheduled_campaigns;
pub mod reconcile_analytics;
