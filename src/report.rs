use crate::error::TootstatsError;
use crate::stats::AccountStats;
use clap::ValueEnum;
use std::fmt::Write;

/// Output format of the final report
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn render(stats: &AccountStats, format: OutputFormat) -> Result<String, TootstatsError> {
    match format {
        OutputFormat::Text => Ok(render_text(stats)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(stats)?),
    }
}

fn format_average(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{value:.2}"),
        None => "n/a".to_string(),
    }
}

/// Human readable report, one metric per line
pub fn render_text(stats: &AccountStats) -> String {
    let mut out = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(out, "Total Account Statistics");
    let _ = writeln!(out, "=======================");
    let _ = writeln!(out, "Account: {}", stats.username);
    let _ = writeln!(out, "Total Followers: {}", stats.followers_count);
    let _ = writeln!(out, "Total Posts Analyzed: {}", stats.posts_analyzed);
    if !stats.complete {
        let _ = writeln!(
            out,
            "Note: collection stopped early, figures cover a partial history"
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Lifetime Engagement Metrics");
    let _ = writeln!(out, "=========================");
    let _ = writeln!(out, "Total Likes: {}", stats.totals.favourites);
    let _ = writeln!(out, "Total Reblogs: {}", stats.totals.reblogs);
    let _ = writeln!(out, "Total Replies: {}", stats.totals.replies);

    let _ = writeln!(out);
    let _ = writeln!(out, "Average Engagement Per Post");
    let _ = writeln!(out, "==========================");
    let averages = stats.averages;
    let _ = writeln!(
        out,
        "Average Likes: {}",
        format_average(averages.map(|a| a.favourites))
    );
    let _ = writeln!(
        out,
        "Average Reblogs: {}",
        format_average(averages.map(|a| a.reblogs))
    );
    let _ = writeln!(
        out,
        "Average Replies: {}",
        format_average(averages.map(|a| a.replies))
    );

    out
}
