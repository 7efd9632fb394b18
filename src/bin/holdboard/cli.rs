//! Command-line interface definition.

use clap::{Parser, ValueEnum};
use holdboard::config::{AppConfig, CheckMode};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Public holder leaderboard with Reddit account verification.
#[derive(Parser, Debug)]
#[command(name = "holdboard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Address to listen on.
    #[arg(long, short, env = "HOLDBOARD_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// JSON file entries are persisted to.
    #[arg(long, env = "HOLDBOARD_DATA_FILE")]
    pub data_file: Option<PathBuf>,

    /// Enable the development audit endpoint.
    #[arg(long, env = "HOLDBOARD_DEV_MODE")]
    pub dev_mode: bool,

    /// Reddit OAuth client id.
    #[arg(long, env = "REDDIT_CLIENT_ID", hide_env_values = true)]
    pub reddit_client_id: Option<String>,

    /// Reddit OAuth client secret.
    #[arg(long, env = "REDDIT_CLIENT_SECRET", hide_env_values = true)]
    pub reddit_client_secret: Option<String>,

    /// How inconclusive Reddit checks are treated on submission.
    #[arg(long, value_enum, env = "REDDIT_CHECK_MODE")]
    pub check_mode: Option<CliCheckMode>,

    /// User-Agent sent to Reddit.
    #[arg(long, env = "REDDIT_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Ticker whose price drives the losers list.
    #[arg(long, env = "HOLDBOARD_EMITEN")]
    pub emiten: Option<String>,

    /// Disable market price scraping.
    #[arg(long, env = "HOLDBOARD_NO_MARKET")]
    pub no_market: bool,

    /// Log level.
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, env = "HOLDBOARD_LOG_JSON")]
    pub log_json: bool,

    /// Path to configuration file.
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

/// Check mode CLI enum.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliCheckMode {
    /// Reject submissions that cannot be verified.
    Strict,
    /// Accept them with a warning.
    Soft,
}

impl Cli {
    /// Convert CLI arguments into an `AppConfig`.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file is specified but cannot be loaded.
    pub fn into_config(self) -> color_eyre::Result<AppConfig> {
        let mut config = if let Some(ref path) = self.config {
            AppConfig::from_file(path)?
        } else {
            AppConfig::default()
        };

        if let Some(listen) = self.listen {
            config.listen = listen;
        }
        if self.data_file.is_some() {
            config.data_file = self.data_file;
        }
        config.dev_mode |= self.dev_mode;
        config.log_level = self.log_level;

        if self.reddit_client_id.is_some() {
            config.reddit.client_id = self.reddit_client_id;
        }
        if self.reddit_client_secret.is_some() {
            config.reddit.client_secret = self.reddit_client_secret;
        }
        if let Some(mode) = self.check_mode {
            config.reddit.check_mode = mode.into();
        }
        if let Some(user_agent) = self.user_agent {
            config.reddit.user_agent = user_agent;
        }

        if let Some(emiten) = self.emiten {
            config.market.emiten = emiten;
        }
        config.market.disabled |= self.no_market;

        Ok(config)
    }
}

impl From<CliCheckMode> for CheckMode {
    fn from(m: CliCheckMode) -> Self {
        match m {
            CliCheckMode::Strict => Self::Strict,
            CliCheckMode::Soft => Self::Soft,
        }
    }
}
