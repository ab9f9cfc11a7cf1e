use anyhow::{bail, Context, Result};
use forkgres_models::SizingPolicy;
use forkgres_orchestrations::client::DEFAULT_API_URL;
use forkgres_orchestrations::PollConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Settings shared by both phases. Loading never fails so the cleanup
/// phase can always run.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    /// Where outputs are appended; stdout when unset
    pub output_file: Option<PathBuf>,
    /// Hand-off file between the fork and cleanup invocations
    pub state_file: PathBuf,
    /// Optional directory for a log file
    pub log_dir: Option<PathBuf>,
}

/// Settings only the fork phase reads
#[derive(Debug, Clone, PartialEq)]
pub struct ForkSettings {
    pub poll: PollConfig,
    pub sizing_policy: SizingPolicy,
}

impl Config {
    /// Expects `.env` to have been loaded already
    pub fn load() -> Self {
        Self::from_lookup(env_var)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = non_blank(lookup);

        let home = var("HOME").unwrap_or_else(|| ".".to_string());
        let state_file = var("FORKGRES_STATE_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(home).join(".forkgres").join("cleanup.state"));

        Self {
            api_url: var("FORKGRES_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            output_file: var("FORKGRES_OUTPUT_FILE")
                .or_else(|| var("GITHUB_OUTPUT"))
                .map(PathBuf::from),
            state_file,
            log_dir: var("FORKGRES_LOG_DIR").map(PathBuf::from),
        }
    }
}

impl ForkSettings {
    pub fn load() -> Result<Self> {
        Self::from_lookup(env_var)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = non_blank(lookup);

        let defaults = PollConfig::default();
        let poll = PollConfig {
            timeout: seconds(&var, "FORKGRES_TIMEOUT_SECS", defaults.timeout)?,
            interval: seconds(&var, "FORKGRES_POLL_INTERVAL_SECS", defaults.interval)?,
            log_interval: seconds(&var, "FORKGRES_LOG_INTERVAL_SECS", defaults.log_interval)?,
        };
        if poll.interval.is_zero() {
            bail!("FORKGRES_POLL_INTERVAL_SECS must be at least 1");
        }

        let sizing_policy = match var("FORKGRES_SIZING_POLICY") {
            Some(value) => value
                .parse()
                .context("FORKGRES_SIZING_POLICY must be 'strict' or 'passthrough'")?,
            None => SizingPolicy::default(),
        };

        Ok(Self { poll, sizing_policy })
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn non_blank(lookup: impl Fn(&str) -> Option<String>) -> impl Fn(&str) -> Option<String> {
    move |key| lookup(key).filter(|v| !v.trim().is_empty())
}

fn seconds(var: &impl Fn(&str) -> Option<String>, key: &str, default: Duration) -> Result<Duration> {
    match var(key) {
        Some(value) => {
            let secs: u64 = value
                .trim()
                .parse()
                .with_context(|| format!("{} must be a whole number of seconds", key))?;
            Ok(Duration::from_secs(secs))
        }
        None => Ok(default),
    }
}
