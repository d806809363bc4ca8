use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::utils::clock::Clock;

use super::{Dashboard, FetchStatus};

/// Reloads the dashboard on a fixed interval until cancelled.
pub struct AutoRefresh {
    dashboard: Arc<Dashboard>,
    interval: Duration,
    shutdown: CancellationToken,
    clock: Arc<dyn Clock>,
}

impl AutoRefresh {
    pub fn new(
        dashboard: Arc<Dashboard>,
        interval: Duration,
        shutdown: CancellationToken,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            dashboard,
            interval,
            shutdown,
            clock,
        }
    }

    /// Runs the refresh loop. `on_refresh` is called after every reload with its outcome.
    /// Returns the number of reloads done.
    pub async fn run(self, mut on_refresh: impl FnMut(&Dashboard, FetchStatus)) -> usize {
        let mut refresh_point = self.clock.instant();
        let mut refreshes = 0;
        loop {
            refresh_point += self.interval;

            let status = self.dashboard.reload().await;
            refreshes += 1;
            debug!("Refresh {refreshes} finished with {status:?}");
            on_refresh(&self.dashboard, status);

            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("Stopping auto refresh after {refreshes} refreshes");
                    return refreshes;
                }
                _ = self.clock.sleep_until(refresh_point) => ()
            }
        }
    }
}
