use std::{sync::Arc, time::Duration};

use anyhow::Result;
use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::usecases::process_scheduled_campaigns::ProcessScheduledCampaignsUseCase;

/// In-process stand-in for the external cron trigger. Claims make overlapping runs harmless.
pub async fn run(scheduler: Arc<ProcessScheduledCampaignsUseCase>, interval_secs: u64) -> Result<()> {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(interval_secs, "scheduler loop: started");

    loop {
        ticker.tick().await;
        match scheduler.run(Utc::now(), None).await {
            Ok(summary) if summary.processed > 0 => info!(
                processed = summary.processed,
                sent = summary.sent,
                partially_failed = summary.partially_failed,
                failed = summary.failed,
                "scheduler loop: run finished"
            ),
            Ok(_) => {}
            Err(err) => error!(error = ?err, "scheduler loop: run failed"),
        }
    }
}
