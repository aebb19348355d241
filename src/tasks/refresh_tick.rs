//! Display refresh background task

use std::{sync::Weak, time::Duration};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error};

use crate::state::Stopwatch;

/// Background task that recomputes a running stopwatch's duration on every
/// tick. Ends once the stopwatch stops or is dropped.
pub async fn refresh_tick_task(stopwatch: Weak<Stopwatch>, period: Duration) {
    let mut interval = interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;

        let Some(stopwatch) = stopwatch.upgrade() else {
            debug!("Stopwatch dropped, ending refresh tick");
            break;
        };

        match stopwatch.refresh() {
            Ok(true) => {}
            Ok(false) => {
                debug!("Stopwatch {} no longer running, ending refresh tick", stopwatch.id());
                break;
            }
            Err(e) => {
                error!("Refresh tick failed: {}", e);
                break;
            }
        }
    }
}
