//! Connection settings. Read from a TOML file, command line flags win over file values.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use serde::Deserialize;
use tracing::debug;

use crate::client::{headers::AuthContext, DEFAULT_PLUGIN_ID};

pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PresenceConfig {
    pub server_url: Option<String>,
    pub plugin_id: String,
    pub token: Option<String>,
    pub csrf_token: Option<String>,
    pub cookie: Option<String>,
    pub extra_headers: BTreeMap<String, String>,
    pub cooldown_secs: u64,
    pub poll_interval_ms: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            plugin_id: DEFAULT_PLUGIN_ID.into(),
            token: None,
            csrf_token: None,
            cookie: None,
            extra_headers: BTreeMap::new(),
            cooldown_secs: 60,
            poll_interval_ms: 1_000,
        }
    }
}

#[derive(Args, Debug, Default, Clone)]
pub struct ConnectionArgs {
    #[arg(
        long,
        help = "Path to a TOML config file. Defaults to config.toml in the application directory"
    )]
    pub config: Option<PathBuf>,
    #[arg(long, help = "Base url of the chat server, for example https://chat.example.com")]
    pub server_url: Option<String>,
    #[arg(
        long,
        env = "ACTIVITY_PING_TOKEN",
        hide_env_values = true,
        help = "Session or personal access token"
    )]
    pub token: Option<String>,
    #[arg(long, help = "Id of the server plugin receiving the pings")]
    pub plugin_id: Option<String>,
}

impl PresenceConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: PresenceConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Loads the explicitly requested file, or `config.toml` in `app_dir` when it exists, then
    /// applies command line overrides.
    pub fn resolve(args: &ConnectionArgs, app_dir: &Path) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => {
                let default_path = app_dir.join(CONFIG_FILE_NAME);
                if default_path.is_file() {
                    Self::load(&default_path)?
                } else {
                    debug!("No config file at {}, using defaults", default_path.display());
                    Self::default()
                }
            }
        };
        config.apply(args);
        config.validate()?;
        Ok(config)
    }

    pub fn apply(&mut self, args: &ConnectionArgs) {
        if let Some(server_url) = &args.server_url {
            self.server_url = Some(server_url.clone());
        }
        if let Some(token) = &args.token {
            self.token = Some(token.clone());
        }
        if let Some(plugin_id) = &args.plugin_id {
            self.plugin_id = plugin_id.clone();
        }
    }

    fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            bail!("poll_interval_ms must be greater than 0");
        }
        if self.plugin_id.is_empty() {
            bail!("plugin_id can't be empty");
        }
        Ok(())
    }

    pub fn server_url(&self) -> Result<&str> {
        self.server_url
            .as_deref()
            .ok_or_else(|| anyhow!("No server url, pass --server-url or set it in the config"))
    }

    pub fn auth(&self) -> AuthContext {
        AuthContext {
            token: self.token.clone(),
            csrf_token: self.csrf_token.clone(),
            cookie: self.cookie.clone(),
            extra_headers: self.extra_headers.clone(),
        }
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
