use crate::config::{MastodonConfig, MAX_PAGE_SIZE};
use crate::error::MastodonError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Mastodon status as returned by the REST API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub visibility: String,
    #[serde(default)]
    pub favourites_count: u64,
    #[serde(default)]
    pub reblogs_count: u64,
    #[serde(default)]
    pub replies_count: u64,
}

/// Mastodon account information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub username: String,
    pub acct: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub followers_count: u64,
    #[serde(default)]
    pub statuses_count: u64,
    #[serde(default)]
    pub url: String,
}

/// Parameters for one page of `GET /api/v1/accounts/:id/statuses`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusesQuery {
    pub limit: u32,
    pub exclude_reblogs: bool,
    pub exclude_replies: bool,
    pub max_id: Option<String>,
}

impl StatusesQuery {
    /// Query for the newest page; `limit` is capped at the API maximum
    pub fn first_page(limit: u32) -> Self {
        Self {
            limit: limit.clamp(1, MAX_PAGE_SIZE),
            exclude_reblogs: true,
            exclude_replies: true,
            max_id: None,
        }
    }

    fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("limit", self.limit.min(MAX_PAGE_SIZE).to_string()),
            ("exclude_reblogs", self.exclude_reblogs.to_string()),
            ("exclude_replies", self.exclude_replies.to_string()),
        ];
        if let Some(max_id) = &self.max_id {
            pairs.push(("max_id", max_id.clone()));
        }
        pairs
    }
}

/// Trait for the Mastodon REST operations the collector depends on
#[allow(async_fn_in_trait)] // Internal trait for dependency injection in tests
pub trait MastodonApi {
    async fn verify_credentials(&mut self) -> Result<Account, MastodonError>;
    async fn account_statuses(
        &self,
        account_id: &str,
        query: &StatusesQuery,
    ) -> Result<Vec<Status>, MastodonError>;
}

/// Mastodon REST client
#[derive(Clone)]
pub struct MastodonClient {
    config: MastodonConfig,
    http_client: reqwest::Client,
    authenticated_account_id: Option<String>,
}

impl MastodonClient {
    /// Create a new Mastodon client
    pub fn new(config: MastodonConfig) -> Result<Self, MastodonError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(format!("tootstats/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MastodonError::ClientSetup(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
            authenticated_account_id: None,
        })
    }

    /// Account id stored by the last successful `verify_credentials`
    pub fn authenticated_account_id(&self) -> Option<&str> {
        self.authenticated_account_id.as_deref()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.instance_url.trim_end_matches('/'), path)
    }

    /// Send an authorized GET and decode the JSON body
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&'static str, String)],
    ) -> Result<T, MastodonError> {
        let response = self
            .http_client
            .get(url)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.access_token),
            )
            .query(query)
            .send()
            .await
            .map_err(|e| MastodonError::Network(format!("Request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MastodonError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| MastodonError::Network(format!("Failed to read response body: {e}")))?;

        serde_json::from_str(&body).map_err(|e| {
            MastodonError::InvalidResponse(format!("Failed to parse response from {url}: {e}"))
        })
    }
}

impl MastodonApi for MastodonClient {
    /// Verify user credentials and store the account id
    async fn verify_credentials(&mut self) -> Result<Account, MastodonError> {
        let url = self.endpoint("/api/v1/accounts/verify_credentials");
        let account: Account = self.get_json(&url, &[]).await?;

        self.authenticated_account_id = Some(account.id.clone());

        info!(
            "Credentials verified for user: {} (@{})",
            account.display_name, account.acct
        );
        Ok(account)
    }

    async fn account_statuses(
        &self,
        account_id: &str,
        query: &StatusesQuery,
    ) -> Result<Vec<Status>, MastodonError> {
        let url = self.endpoint(&format!("/api/v1/accounts/{account_id}/statuses"));
        debug!(
            "Fetching statuses page: account={}, limit={}, max_id={:?}",
            account_id, query.limit, query.max_id
        );

        let statuses: Vec<Status> = self.get_json(&url, &query.to_query_pairs()).await?;

        debug!("Received {} statuses", statuses.len());
        Ok(statuses)
    }
}
