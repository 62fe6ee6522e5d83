use crate::api::notify::DEFAULT_NOTIFICATION_PREFIX;
use crate::api::{ApiVersion, CallerIdentity, ClientSettings, NoCallerIdentity, StaticCallerId};
use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const ENV_HOST: &str = "DYNAMICS_HOST";
pub const ENV_ACCESS_TOKEN: &str = "DYNAMICS_ACCESS_TOKEN";
pub const ENV_CALLER_ID: &str = "DYNAMICS_CALLER_ID";
pub const ENV_TIMEOUT_SECS: &str = "DYNAMICS_TIMEOUT_SECS";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Organization URL, e.g. `https://contoso.crm4.dynamics.com`
    pub host: Option<String>,
    pub access_token: Option<String>,
    /// systemuserid used for elevated requests
    pub caller_id: Option<String>,
    #[serde(default)]
    pub settings: Settings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_notification_prefix")]
    pub notification_prefix: String,
    /// Ask the server for its version before the first request
    #[serde(default = "default_discover_version")]
    pub discover_version: bool,
    #[serde(default)]
    pub api_version: ApiVersion,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_notification_prefix() -> String {
    DEFAULT_NOTIFICATION_PREFIX.to_string()
}

fn default_discover_version() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            notification_prefix: default_notification_prefix(),
            discover_version: default_discover_version(),
            api_version: ApiVersion::default(),
        }
    }
}

impl Config {
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "linux") {
            // Use XDG config directory on Linux
            dirs::config_dir()
                .context("Failed to get XDG config directory")?
                .join("dynamics-webapi")
        } else {
            // Use home directory with dot prefix on Windows/Mac
            dirs::home_dir()
                .context("Failed to get home directory")?
                .join(".dynamics-webapi")
        };

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;
            info!("Created config directory: {:?}", config_dir);
        }

        Ok(config_dir.join("config.toml"))
    }

    /// Load the config file, then apply environment overrides (including a `.env` file)
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let config = Self::load_from(&Self::get_config_path()?)?;
        config.with_env_overrides()
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        debug!("Loading config from: {:?}", config_path);

        if !config_path.exists() {
            info!("Config file doesn't exist, using defaults");
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        debug!("Saving config to: {:?}", config_path);

        let config_content =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(config_path, config_content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        info!("Config saved successfully");
        Ok(())
    }

    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(host) = lookup(ENV_HOST) {
            self.host = Some(host);
        }
        if let Some(token) = lookup(ENV_ACCESS_TOKEN) {
            self.access_token = Some(token);
        }
        if let Some(caller_id) = lookup(ENV_CALLER_ID) {
            self.caller_id = Some(caller_id);
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT_SECS) {
            self.settings.timeout_secs = timeout
                .parse()
                .with_context(|| format!("{} must be a number of seconds, got '{}'", ENV_TIMEOUT_SECS, timeout))?;
        }
        Ok(self)
    }

    /// Settings for building a request client; fails when no host is configured
    pub fn client_settings(&self) -> Result<ClientSettings> {
        let host = self
            .host
            .as_deref()
            .filter(|h| !h.trim().is_empty())
            .with_context(|| format!("No host configured. Set {} or run 'dynamics-webapi config set host <url>'", ENV_HOST))?;

        let mut settings = ClientSettings::new(host)
            .timeout(Duration::from_secs(self.settings.timeout_secs))
            .initial_version(self.settings.api_version);
        if let Some(token) = &self.access_token {
            settings = settings.access_token(token.clone());
        }
        Ok(settings)
    }

    pub fn caller_identity(&self) -> Arc<dyn CallerIdentity> {
        match &self.caller_id {
            Some(id) => Arc::new(StaticCallerId::new(id.clone())),
            None => Arc::new(NoCallerIdentity),
        }
    }

    pub fn get(&self, name: &str) -> Result<String> {
        let value = match name {
            "host" => self.host.clone().unwrap_or_default(),
            "access_token" => self.access_token.as_ref().map(|_| "********".to_string()).unwrap_or_default(),
            "caller_id" => self.caller_id.clone().unwrap_or_default(),
            "timeout_secs" => self.settings.timeout_secs.to_string(),
            "notification_prefix" => self.settings.notification_prefix.clone(),
            "discover_version" => self.settings.discover_version.to_string(),
            "api_version" => self.settings.api_version.to_string(),
            other => anyhow::bail!("Unknown setting '{}'", other),
        };
        Ok(value)
    }

    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        info!("Updating setting {}", name);
        match name {
            "host" => self.host = Some(value.trim_end_matches('/').to_string()),
            "access_token" => self.access_token = Some(value.to_string()),
            "caller_id" => self.caller_id = Some(value.to_string()),
            "timeout_secs" => {
                self.settings.timeout_secs = value
                    .parse()
                    .with_context(|| format!("timeout_secs must be a number, got '{}'", value))?
            }
            "notification_prefix" => self.settings.notification_prefix = value.to_string(),
            "discover_version" => {
                self.settings.discover_version = value
                    .parse()
                    .with_context(|| format!("discover_version must be true or false, got '{}'", value))?
            }
            "api_version" => {
                self.settings.api_version = ApiVersion::parse_dotted(value)
                    .with_context(|| format!("api_version must look like 9.2, got '{}'", value))?
            }
            other => anyhow::bail!("Unknown setting '{}'", other),
        }
        Ok(())
    }

    /// Names accepted by [`Config::get`] and [`Config::set`]
    pub fn setting_names() -> &'static [&'static str] {
        &[
            "host",
            "access_token",
            "caller_id",
            "timeout_secs",
            "notification_prefix",
            "discover_version",
            "api_version",
        ]
    }
}
