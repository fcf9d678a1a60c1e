use crate::history::CollectedHistory;
use crate::mastodon::{Account, Status};
use serde::Serialize;

/// Summed engagement counters over a set of statuses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngagementTotals {
    pub favourites: u64,
    pub reblogs: u64,
    pub replies: u64,
}

/// Per-post engagement averages
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EngagementAverages {
    pub favourites: f64,
    pub reblogs: f64,
    pub replies: f64,
}

impl EngagementTotals {
    pub fn from_statuses(statuses: &[Status]) -> Self {
        statuses.iter().fold(Self::default(), |acc, status| Self {
            favourites: acc.favourites.saturating_add(status.favourites_count),
            reblogs: acc.reblogs.saturating_add(status.reblogs_count),
            replies: acc.replies.saturating_add(status.replies_count),
        })
    }

    /// Divide the totals by `count`; `None` when there is nothing to divide by
    pub fn averages(&self, count: usize) -> Option<EngagementAverages> {
        if count == 0 {
            return None;
        }
        let count = count as f64;
        Some(EngagementAverages {
            favourites: self.favourites as f64 / count,
            reblogs: self.reblogs as f64 / count,
            replies: self.replies as f64 / count,
        })
    }
}

/// Everything the final report shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountStats {
    pub username: String,
    pub followers_count: u64,
    pub posts_analyzed: usize,
    pub totals: EngagementTotals,
    pub averages: Option<EngagementAverages>,
    /// False when collection stopped on a fetch error
    pub complete: bool,
}

impl AccountStats {
    pub fn from_history(account: &Account, history: &CollectedHistory) -> Self {
        let totals = EngagementTotals::from_statuses(&history.statuses);
        Self {
            username: account.username.clone(),
            followers_count: account.followers_count,
            posts_analyzed: history.statuses.len(),
            totals,
            averages: totals.averages(history.statuses.len()),
            complete: history.is_complete(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MastodonError;
    use chrono::Utc;

    fn status_with_counts(id: &str, favourites: u64, reblogs: u64, replies: u64) -> Status {
        Status {
            id: id.to_string(),
            created_at: Utc::now(),
            url: None,
            visibility: "public".to_string(),
            favourites_count: favourites,
            reblogs_count: reblogs,
            replies_count: replies,
        }
    }

    fn test_account() -> Account {
        Account {
            id: "42".to_string(),
            username: "testuser".to_string(),
            acct: "testuser".to_string(),
            display_name: "Test User".to_string(),
            followers_count: 321,
            statuses_count: 2,
            url: "https://mastodon.social/@testuser".to_string(),
        }
    }

    #[test]
    fn test_totals_are_exact_sums() {
        let statuses = vec![
            status_with_counts("2", 1, 0, 2),
            status_with_counts("1", 3, 1, 0),
        ];
        let totals = EngagementTotals::from_statuses(&statuses);
        assert_eq!(
            totals,
            EngagementTotals {
                favourites: 4,
                reblogs: 1,
                replies: 2,
            }
        );
    }

    #[test]
    fn test_averages() {
        let totals = EngagementTotals {
            favourites: 4,
            reblogs: 1,
            replies: 2,
        };
        let averages = totals.averages(2).unwrap();
        assert_eq!(averages.favourites, 2.0);
        assert_eq!(averages.reblogs, 0.5);
        assert_eq!(averages.replies, 1.0);
    }

    #[test]
    fn test_averages_undefined_for_zero_posts() {
        let totals = EngagementTotals::from_statuses(&[]);
        assert_eq!(totals, EngagementTotals::default());
        assert!(totals.averages(0).is_none());
    }

    #[test]
    fn test_totals_saturate_instead_of_overflowing() {
        let statuses = vec![
            status_with_counts("2", u64::MAX, 0, 0),
            status_with_counts("1", 1, 0, 0),
        ];
        assert_eq!(EngagementTotals::from_statuses(&statuses).favourites, u64::MAX);
    }

    #[test]
    fn test_account_stats_from_complete_history() {
        let history = CollectedHistory {
            statuses: vec![
                status_with_counts("2", 1, 0, 2),
                status_with_counts("1", 3, 1, 0),
            ],
            stopped_by: None,
        };

        let stats = AccountStats::from_history(&test_account(), &history);
        assert_eq!(stats.username, "testuser");
        assert_eq!(stats.followers_count, 321);
        assert_eq!(stats.posts_analyzed, 2);
        assert_eq!(stats.totals.favourites, 4);
        assert!(stats.averages.is_some());
        assert!(stats.complete);
    }

    #[test]
    fn test_account_stats_from_interrupted_empty_history() {
        let history = CollectedHistory {
            statuses: Vec::new(),
            stopped_by: Some(MastodonError::Network("timed out".to_string())),
        };

        let stats = AccountStats::from_history(&test_account(), &history);
        assert_eq!(stats.posts_analyzed, 0);
        assert!(stats.averages.is_none());
        assert!(!stats.complete);
    }
}
