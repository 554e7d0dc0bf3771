//! Names, sizing constants and environment configuration.

use std::env;
use std::time::Duration;

use log::LevelFilter;

use crate::error::{Error, Result};

/// Number of candidate records the shared ring holds.
pub const BUFFER_CAPACITY: usize = 32;

/// Maximum number of edges in one candidate record.
pub const RECORD_CAPACITY: usize = 8;

/// Fewest edges a generator accepts on its command line.
pub const MIN_EDGES: usize = 3;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

const ENV_NAMESPACE: &str = "FAS_NAMESPACE";
const ENV_POLL_MS: &str = "FAS_POLL_MS";
const ENV_LOG: &str = "FAS_LOG";
const ENV_SEED: &str = "FAS_SEED";

/// System-namespace names of the shared segment and the three semaphores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpcNames {
    pub shm: String,
    pub free_slots: String,
    pub used_slots: String,
    pub mutex: String,
}

impl Default for IpcNames {
    fn default() -> Self {
        Self {
            shm: "fas_shm".to_owned(),
            free_slots: "fas_free_slots".to_owned(),
            used_slots: "fas_used_slots".to_owned(),
            mutex: "fas_mutex".to_owned(),
        }
    }
}

impl IpcNames {
    /// A name set isolated from the default one, so independent runs don't collide.
    pub fn with_namespace(namespace: &str) -> Self {
        Self {
            shm: format!("fas_{namespace}_shm"),
            free_slots: format!("fas_{namespace}_free_slots"),
            used_slots: format!("fas_{namespace}_used_slots"),
            mutex: format!("fas_{namespace}_mutex"),
        }
    }
}

/// Process configuration shared by both binaries.
#[derive(Debug, Clone)]
pub struct Config {
    pub names: IpcNames,
    /// Upper bound on a single semaphore wait before the stop condition is re-checked.
    pub poll_interval: Duration,
    pub log_level: LevelFilter,
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            names: IpcNames::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            log_level: LevelFilter::Info,
            seed: None,
        }
    }
}

impl Config {
    /// Read `FAS_NAMESPACE`, `FAS_POLL_MS`, `FAS_LOG` and `FAS_SEED`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(ns) = lookup(ENV_NAMESPACE) {
            if ns.is_empty() || !ns.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(Error::Config(format!(
                    "{ENV_NAMESPACE} must be non-empty [A-Za-z0-9_], got `{ns}`"
                )));
            }
            config.names = IpcNames::with_namespace(&ns);
        }

        if let Some(ms) = lookup(ENV_POLL_MS) {
            let ms: u64 = ms
                .parse()
                .map_err(|_| Error::Config(format!("{ENV_POLL_MS} must be an integer, got `{ms}`")))?;
            if ms == 0 {
                return Err(Error::Config(format!("{ENV_POLL_MS} must be positive")));
            }
            config.poll_interval = Duration::from_millis(ms);
        }

        if let Some(level) = lookup(ENV_LOG) {
            config.log_level = level
                .parse()
                .map_err(|_| Error::Config(format!("{ENV_LOG}: unknown level `{level}`")))?;
        }

        if let Some(seed) = lookup(ENV_SEED) {
            config.seed = Some(
                seed.parse()
                    .map_err(|_| Error::Config(format!("{ENV_SEED} must be a u64, got `{seed}`")))?,
            );
        }

        Ok(config)
    }
}
