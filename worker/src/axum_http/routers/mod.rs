pub mod analytics;
pub mod campaigns;
pub mod twilio_webhooks;
