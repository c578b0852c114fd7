pub mod billing;
pub mod campaigns;
pub mod media;
