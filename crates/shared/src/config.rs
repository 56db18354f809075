use anyhow::{Context, Result, anyhow, bail};
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::pipeline::Settings;
use crate::raindrop;

#[derive(Debug, Clone)]
pub struct Config {
    pub raindrop_api_token: String,
    pub raindrop_collection: String,
    pub remarkable_folder: String,
    pub batch_size: usize,
    pub processed_log: PathBuf,
    pub network_probe_host: String,
    pub network_poll: Duration,
    pub network_wait_max: Duration,
    pub retry_cooldown: Duration,
    pub ca_bundle: Option<PathBuf>,
}

impl Config {
    /// Read the whole configuration surface once, before any network
    /// activity. Missing or malformed required settings fail here.
    pub fn from_env() -> Result<Self> {
        Self::try_load_dotenv();

        let raindrop_api_token = env::var("RAINDROP_API_TOKEN").context(
            "RAINDROP_API_TOKEN not found.\n\n\
            To fix this, create ~/.config/push-articles/.env with:\n  \
            RAINDROP_API_TOKEN=your_token_here\n\n\
            Get your Raindrop.io API token from: https://app.raindrop.io/settings/integrations",
        )?;

        let raindrop_collection =
            env::var("RAINDROP_COLLECTION").unwrap_or_else(|_| "0".to_string());
        let remarkable_folder =
            env::var("REMARKABLE_FOLDER").unwrap_or_else(|_| "/Articles".to_string());

        let batch_size: usize = parse_var("BATCH_SIZE", 25)?;
        if batch_size == 0 {
            bail!("BATCH_SIZE must be at least 1");
        }
        let batch_size = batch_size.min(raindrop::MAX_PAGE_SIZE);

        let processed_log = match env::var("PROCESSED_LOG") {
            Ok(p) => PathBuf::from(p),
            Err(_) => default_processed_log()?,
        };

        let network_probe_host =
            env::var("NETWORK_PROBE_HOST").unwrap_or_else(|_| "api.raindrop.io".to_string());
        let network_poll = Duration::from_secs(parse_var("NETWORK_POLL_SECS", 5)?);
        let network_wait_max = Duration::from_secs(parse_var("NETWORK_WAIT_SECS", 60)?);
        let retry_cooldown = Duration::from_secs(parse_var("RETRY_COOLDOWN_SECS", 300)?);

        if network_poll.is_zero() {
            bail!("NETWORK_POLL_SECS must be at least 1");
        }
        if network_poll > network_wait_max {
            bail!("NETWORK_POLL_SECS must not exceed NETWORK_WAIT_SECS");
        }

        let ca_bundle = env::var("CA_BUNDLE").ok().map(PathBuf::from);
        if let Some(path) = &ca_bundle {
            if !path.exists() {
                bail!("CA_BUNDLE points at {}, which does not exist", path.display());
            }
        }

        Ok(Self {
            raindrop_api_token,
            raindrop_collection,
            remarkable_folder,
            batch_size,
            processed_log,
            network_probe_host,
            network_poll,
            network_wait_max,
            retry_cooldown,
            ca_bundle,
        })
    }

    /// The subset of configuration the orchestrator needs.
    pub fn settings(&self) -> Settings {
        Settings {
            batch_size: self.batch_size,
            folder: self.remarkable_folder.clone(),
            processed_log: self.processed_log.clone(),
            probe_host: self.network_probe_host.clone(),
            network_poll: self.network_poll,
            network_wait_max: self.network_wait_max,
            retry_cooldown: self.retry_cooldown,
        }
    }

    fn try_load_dotenv() {
        // Try locations in order of preference:

        // 1. Current directory (for development)
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/push-articles/.env (standard config location)
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("push-articles").join(".env");
            if config_path.exists() && dotenvy::from_path(&config_path).is_ok() {
                return;
            }
        }

        // 3. ~/.env (home directory)
        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".env");
            if home_path.exists() {
                let _ = dotenvy::from_path(&home_path);
            }
        }

        // If none found, that's okay - environment variables might be set system-wide
    }
}

fn default_processed_log() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .context("Could not determine local data directory")?
        .join("push-articles");
    Ok(data_dir.join("processed.json"))
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{key} has invalid value {raw:?}: {e}")),
        Err(_) => Ok(default),
    }
}
