pub mod billing;
pub mod campaigns;
pub mod carrier;
pub mod delivery_counters;
pub mod enums;
pub mod opt_out;
