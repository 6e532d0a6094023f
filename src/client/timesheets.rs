//! Latest-request-wins loader for the timesheet table.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::client::api::{ApiClient, ApiError};
use crate::dto::timesheet::TimesheetRow;
use crate::forms::timesheet::TimesheetFilterQuery;
use crate::pagination::Paginated;

pub const FETCH_DEBOUNCE: Duration = Duration::from_millis(100);
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Debounced timesheet fetches. A fetch started later, or a call to
/// [`TimesheetFeed::cancel`], drops any fetch still in flight together with
/// its HTTP request; the dropped fetch resolves to [`ApiError::Canceled`].
#[derive(Debug, Clone)]
pub struct TimesheetFeed {
    api: ApiClient,
    generation: Arc<watch::Sender<u64>>,
    debounce: Duration,
    timeout: Duration,
}

impl TimesheetFeed {
    pub fn new(api: ApiClient) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            api,
            generation: Arc::new(generation),
            debounce: FETCH_DEBOUNCE,
            timeout: FETCH_TIMEOUT,
        }
    }

    pub fn with_timings(mut self, debounce: Duration, timeout: Duration) -> Self {
        self.debounce = debounce;
        self.timeout = timeout;
        self
    }

    fn advance(&self) -> u64 {
        let mut ticket = 0;
        self.generation.send_modify(|current| {
            *current += 1;
            ticket = *current;
        });
        ticket
    }

    pub async fn fetch(
        &self,
        query: &TimesheetFilterQuery,
    ) -> Result<Paginated<TimesheetRow>, ApiError> {
        let ticket = self.advance();
        let mut superseded = self.generation.subscribe();

        let request = async {
            tokio::time::sleep(self.debounce).await;
            tokio::time::timeout(self.timeout, self.api.list_timesheets(query))
                .await
                .map_err(|_| ApiError::Transport("request timed out".to_string()))?
        };

        tokio::select! {
            biased;
            _ = superseded.wait_for(|current| *current != ticket) => {
                log::debug!("Timesheet fetch {ticket} canceled");
                Err(ApiError::Canceled)
            }
            result = request => result,
        }
    }

    /// Aborts whatever fetch is in flight.
    pub fn cancel(&self) {
        self.advance();
    }
}
