use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::{self, EnvFilter};

use tootstats::config::Config;
use tootstats::error::TootstatsError;
use tootstats::history::HistoryCollector;
use tootstats::mastodon::{MastodonApi, MastodonClient};
use tootstats::report::{self, OutputFormat};
use tootstats::stats::AccountStats;

#[derive(Parser)]
#[command(name = "tootstats")]
#[command(about = "Collects the full post history of a Mastodon account and reports engagement statistics")]
#[command(version)]
struct Cli {
    /// Path to configuration file (can also be set via TOOTSTATS_CONFIG env var)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Enable verbose logging (equivalent to --log-level debug)
    #[arg(short, long)]
    verbose: bool,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Pause between page requests in milliseconds
    #[arg(long, value_name = "MS")]
    page_delay_ms: Option<u64>,

    /// Do not show the progress spinner
    #[arg(long)]
    no_progress: bool,
}

impl Cli {
    /// Get config path from CLI arg or TOOTSTATS_CONFIG environment variable
    fn config_path(&self) -> Option<PathBuf> {
        self.config
            .clone()
            .or_else(|| std::env::var("TOOTSTATS_CONFIG").ok().map(PathBuf::from))
    }
}

/// Initialize logging on stderr so the report on stdout stays clean
fn init_logging(config: &Config, cli: &Cli) -> Result<(), TootstatsError> {
    let log_level = if cli.verbose {
        "debug"
    } else if let Some(ref level) = cli.log_level {
        level.as_str()
    } else {
        config.log_level()
    };

    let _level = match log_level.to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => {
            return Err(TootstatsError::InvalidData(format!(
                "Invalid log level: {log_level}. Valid levels are: error, warn, info, debug, trace"
            )));
        }
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| TootstatsError::InvalidData(format!("Failed to create log filter: {e}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();

    debug!("Logging initialized with level: {}", log_level);
    Ok(())
}

/// Log a fatal error with as much detail as the error carries
fn report_error(error: &TootstatsError) {
    match error {
        TootstatsError::Config(_) => {
            error!("{}", error);
            error!("Set MASTODON_SERVER and MASTODON_TOKEN or provide a tootstats.toml");
        }
        TootstatsError::Mastodon(mastodon_error) => {
            error!("Error: {}", mastodon_error);
            if let Some(body) = mastodon_error.response_body() {
                error!("API response: {}", body);
            }
        }
        _ => {
            error!("Error: {}", error);
            debug!("Error details: {:?}", error);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), TootstatsError> {
    let cli = Cli::parse();

    // A missing .env is fine, the variables may come from the environment
    let _ = dotenvy::dotenv();

    let config = match Config::load(cli.config_path()) {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt().with_writer(std::io::stderr).init();
            let error = TootstatsError::Config(e);
            report_error(&error);
            return Err(error);
        }
    };

    if let Err(e) = init_logging(&config, &cli) {
        eprintln!("Failed to initialize logging: {e}");
        return Err(e);
    }

    info!("Starting Mastodon statistics collection");
    info!("Mastodon instance: {}", config.mastodon.instance_url);
    debug!(
        "Page size: {}, page delay: {}ms",
        config.collection.page_size, config.collection.page_delay_ms
    );

    match run(config, &cli).await {
        Ok(output) => {
            println!("{output}");
            Ok(())
        }
        Err(e) => {
            report_error(&e);
            Err(e)
        }
    }
}

/// Verify the account, walk its history and render the report
async fn run(config: Config, cli: &Cli) -> Result<String, TootstatsError> {
    let mut client = MastodonClient::new(config.mastodon.clone())?;

    info!("Fetching account statistics...");
    let account = client.verify_credentials().await?;

    info!("Fetching all posts (this may take a while)...");
    let mut collector = HistoryCollector::new(&client, &config.collection);
    if let Some(delay_ms) = cli.page_delay_ms {
        collector = collector.with_page_delay(Duration::from_millis(delay_ms));
    }
    if !cli.no_progress && cli.format == OutputFormat::Text {
        collector = collector.with_spinner();
    }

    let history = collector.collect_with_outcome(&account.id).await;
    if let Some(ref e) = history.stopped_by {
        warn!(
            "Collection stopped early after {} posts: {}",
            history.statuses.len(),
            e
        );
    } else {
        info!("Collected {} posts", history.statuses.len());
    }

    let stats = AccountStats::from_history(&account, &history);
    report::render(&stats, cli.format)
}
