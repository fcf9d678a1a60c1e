use crate::config::{CollectionConfig, MAX_PAGE_SIZE};
use crate::error::MastodonError;
use crate::mastodon::{MastodonApi, Status, StatusesQuery};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{debug, error, info};

/// Result of a history collection run
#[derive(Debug, Clone)]
pub struct CollectedHistory {
    /// Statuses in fetch order, newest first
    pub statuses: Vec<Status>,
    /// Error that ended the run early, `None` when the history was exhausted
    pub stopped_by: Option<MastodonError>,
}

impl CollectedHistory {
    pub fn is_complete(&self) -> bool {
        self.stopped_by.is_none()
    }
}

/// Walks an account's statuses page by page, newest to oldest
pub struct HistoryCollector<'a, C: MastodonApi> {
    client: &'a C,
    page_size: u32,
    page_delay: Duration,
    exclude_reblogs: bool,
    exclude_replies: bool,
    progress: ProgressBar,
}

impl<'a, C: MastodonApi> HistoryCollector<'a, C> {
    /// Create a collector with the given pagination settings
    pub fn new(client: &'a C, config: &CollectionConfig) -> Self {
        Self {
            client,
            page_size: config.page_size.clamp(1, MAX_PAGE_SIZE),
            page_delay: config.page_delay(),
            exclude_reblogs: config.exclude_reblogs,
            exclude_replies: config.exclude_replies,
            progress: ProgressBar::hidden(),
        }
    }

    /// Override the pause between page requests
    pub fn with_page_delay(mut self, page_delay: Duration) -> Self {
        self.page_delay = page_delay;
        self
    }

    /// Show a terminal spinner with the running post count
    pub fn with_spinner(mut self) -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            spinner.set_style(style);
        }
        spinner.enable_steady_tick(Duration::from_millis(120));
        self.progress = spinner;
        self
    }

    /// Fetch the whole history of `account_id`.
    ///
    /// A failing page request ends the walk and the statuses gathered so
    /// far are returned; use [`collect_with_outcome`](Self::collect_with_outcome)
    /// to find out whether that happened.
    pub async fn collect(&self, account_id: &str) -> Vec<Status> {
        self.collect_with_outcome(account_id).await.statuses
    }

    pub async fn collect_with_outcome(&self, account_id: &str) -> CollectedHistory {
        let mut statuses: Vec<Status> = Vec::new();
        let mut max_id: Option<String> = None;

        let stopped_by = loop {
            let query = StatusesQuery {
                limit: self.page_size,
                exclude_reblogs: self.exclude_reblogs,
                exclude_replies: self.exclude_replies,
                max_id: max_id.clone(),
            };

            let page = match self.client.account_statuses(account_id, &query).await {
                Ok(page) => page,
                Err(e) => {
                    error!("Error fetching statuses: {}", e);
                    if let Some(body) = e.response_body() {
                        error!("API response: {}", body);
                    }
                    break Some(e);
                }
            };

            let Some(oldest) = page.last() else {
                debug!("Received empty page, history exhausted");
                break None;
            };
            max_id = Some(oldest.id.clone());
            statuses.extend(page);

            info!("Fetched {} posts so far...", statuses.len());
            self.progress
                .set_message(format!("Fetched {} posts so far...", statuses.len()));

            if !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }
        };

        self.progress.finish_and_clear();

        CollectedHistory {
            statuses,
            stopped_by,
        }
    }
}
