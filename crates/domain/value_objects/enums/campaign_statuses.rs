use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    #[default]
    Draft,
    Scheduled,
    Processing,
    Sent,
    PartiallyFailed,
    Error,
}

impl Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            CampaignStatus::Draft => "draft",
            CampaignStatus::Scheduled => "scheduled",
            CampaignStatus::Processing => "processing",
            CampaignStatus::Sent => "sent",
            CampaignStatus::PartiallyFailed => "partially_failed",
            CampaignStatus::Error => "error",
        };
        write!(f, "{}", status)
    }
}

impl CampaignStatus {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(CampaignStatus::Draft),
            "scheduled" => Some(CampaignStatus::Scheduled),
            "processing" => Some(CampaignStatus::Processing),
            "sent" => Some(CampaignStatus::Sent),
            "partially_failed" => Some(CampaignStatus::PartiallyFailed),
            "error" => Some(CampaignStatus::Error),
            _ => None,
        }
    }

    /// Statuses a campaign may be (re)scheduled or sent from.
    pub fn is_dispatchable(&self) -> bool {
        matches!(self, CampaignStatus::Draft | CampaignStatus::Scheduled)
    }

    /// Outcome of a finished fan-out, given how many sends were accepted by the carrier.
    pub fn from_dispatch_outcome(accepted: usize, failed: usize) -> Self {
        match (accepted, failed) {
            (_, 0) => CampaignStatus::Sent,
            (0, _) => CampaignStatus::Error,
            _ => CampaignStatus::PartiallyFailed,
        }
    }
}
