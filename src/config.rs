//! Configuration management
//!
//! Settings are layered: built-in defaults, then an optional INI file
//! (`~/.vvscript.cfg`), then the `VVCLI_ENDPOINT` environment variable,
//! then command line flags applied by the binary.
//!
//! ```ini
//! [service]
//! endpoint = 127.0.0.1:50021
//! timeout_secs = 60
//!
//! [pipeline]
//! max_concurrency = 4
//! default_speaker = ずんだもん:ノーマル
//! ```

use crate::script::DEFAULT_SPEAKER;
use crate::{Result, VvError};
use ini::Ini;
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the engine address
pub const ENDPOINT_ENV: &str = "VVCLI_ENDPOINT";

/// Engine address used when nothing else is configured
pub const DEFAULT_ENDPOINT: &str = "127.0.0.1:50021";

/// Upper bound on in-flight synthesis requests
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Resolved application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Config file consulted, whether or not it existed
    path: PathBuf,

    /// Engine base URL, always with a scheme and without trailing slash
    endpoint: String,

    /// Maximum concurrent synthesis requests (at least 1)
    max_concurrency: usize,

    /// Timeout applied to every HTTP request
    request_timeout: Duration,

    /// Speaker for lines before the first directive
    default_speaker: String,
}

impl Config {
    /// Load from `~/.vvscript.cfg` and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load from a specific file and the environment
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        config.apply_env_endpoint(std::env::var(ENDPOINT_ENV).ok())?;
        Ok(config)
    }

    /// Load from a file only, ignoring the environment
    ///
    /// A missing file yields the defaults; the file is never created.
    pub fn load_file(path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", path);

        let ini = if path.exists() {
            Ini::load_from_file(path)
                .map_err(|e| VvError::Config(format!("Failed to load {:?}: {}", path, e)))?
        } else {
            debug!("Config file not found, using defaults");
            Ini::new()
        };

        Self::from_ini(&ini, path.to_path_buf())
    }

    /// Resolve settings from parsed INI contents
    fn from_ini(ini: &Ini, path: PathBuf) -> Result<Self> {
        let endpoint = normalize_endpoint(&get_string(ini, "service", "endpoint", DEFAULT_ENDPOINT))?;
        let timeout_secs = get_parsed(ini, "service", "timeout_secs", DEFAULT_TIMEOUT_SECS)?;
        let max_concurrency = get_parsed(ini, "pipeline", "max_concurrency", DEFAULT_MAX_CONCURRENCY)?;
        let default_speaker = get_string(ini, "pipeline", "default_speaker", DEFAULT_SPEAKER);

        let mut config = Self {
            path,
            endpoint,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            default_speaker,
        };
        config.set_max_concurrency(max_concurrency)?;
        config.set_request_timeout(Duration::from_secs(timeout_secs))?;
        Ok(config)
    }

    /// Apply the value of [`ENDPOINT_ENV`], if set and non-empty
    pub fn apply_env_endpoint(&mut self, value: Option<String>) -> Result<()> {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            info!("Endpoint overridden by {}", ENDPOINT_ENV);
            self.set_endpoint(&value)?;
        }
        Ok(())
    }

    /// Default config file path (~/.vvscript.cfg)
    fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".vvscript.cfg")
    }

    /// Expose the config file path for display
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn set_endpoint(&mut self, endpoint: &str) -> Result<()> {
        self.endpoint = normalize_endpoint(endpoint)?;
        Ok(())
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn set_max_concurrency(&mut self, n: usize) -> Result<()> {
        if n == 0 {
            return Err(VvError::Config("max_concurrency must be at least 1".into()));
        }
        self.max_concurrency = n;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn set_request_timeout(&mut self, timeout: Duration) -> Result<()> {
        if timeout.is_zero() {
            return Err(VvError::Config("timeout must be greater than zero".into()));
        }
        self.request_timeout = timeout;
        Ok(())
    }

    pub fn default_speaker(&self) -> &str {
        &self.default_speaker
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: Self::config_path(),
            endpoint: format!("http://{}", DEFAULT_ENDPOINT),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            default_speaker: DEFAULT_SPEAKER.to_string(),
        }
    }
}

/// Get a string value from config
fn get_string(ini: &Ini, section: &str, key: &str, default: &str) -> String {
    ini.get_from(Some(section), key)
        .map(str::trim)
        .unwrap_or(default)
        .to_string()
}

/// Get a parsed value from config, rejecting values that do not parse
fn get_parsed<T: std::str::FromStr>(ini: &Ini, section: &str, key: &str, default: T) -> Result<T> {
    match ini.get_from(Some(section), key) {
        Some(raw) => raw.trim().parse().map_err(|_| {
            VvError::Config(format!("Invalid value for [{}] {}: '{}'", section, key, raw))
        }),
        None => Ok(default),
    }
}

/// Turn `host:port` or a full URL into a base URL usable for requests
///
/// Adds `http://` when no scheme is given and strips trailing slashes.
pub fn normalize_endpoint(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(VvError::Config("endpoint must not be empty".into()));
    }

    if trimmed.contains("://") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("http://{}", trimmed))
    }
}
