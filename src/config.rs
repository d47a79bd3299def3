// File: ./src/config.rs
// Handles configuration loading, saving, and defaults.
use crate::client::DEFAULT_API_URL;
use crate::client::core::DEFAULT_TIMEOUT_SECS;
use crate::context::AppContext;
use crate::model::{DateZone, PriorityColumn, RowOptions, Team, User};
use crate::storage::LocalStorage;
use crate::vault::DEFAULT_NOTE_PREFIX;
use anyhow::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_note_prefix() -> String {
    DEFAULT_NOTE_PREFIX.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// ClickUp personal API token. Empty when signed out.
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub teams: Vec<Team>,
    /// List used by `create` and `sync` when none is given.
    #[serde(default)]
    pub default_list: Option<String>,
    /// Vault directory; the data dir's `vault` folder when unset.
    #[serde(default)]
    pub vault_path: Option<PathBuf>,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_note_prefix")]
    pub note_prefix: String,
    #[serde(default)]
    pub priority_column: PriorityColumn,
    #[serde(default)]
    pub date_zone: DateZone,
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: String::new(),
            team_id: None,
            user: None,
            teams: Vec::new(),
            default_list: None,
            vault_path: None,
            // Match the serde defaults
            api_url: default_api_url(),
            note_prefix: default_note_prefix(),
            priority_column: PriorityColumn::default(),
            date_zone: DateZone::default(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load the configuration from disk using an explicit context.
    /// Returns a contextualized error if reading or parsing fails.
    pub fn load(ctx: &dyn AppContext) -> Result<Self> {
        let path = ctx.get_config_file_path()?;

        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found"));
        }

        let contents = fs::read_to_string(&path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| {
            anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e)
        })?;

        Ok(config)
    }

    /// Like `load`, but a missing file yields the defaults.
    pub fn load_or_default(ctx: &dyn AppContext) -> Result<Self> {
        match Self::load(ctx) {
            Ok(c) => Ok(c),
            Err(e) if Self::is_missing_config_error(&e) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Detects whether an error means the config file was missing, either
    /// from our own message or an underlying IO NotFound in the chain.
    pub fn is_missing_config_error(err: &Error) -> bool {
        if err.to_string().contains("Config file not found") {
            return true;
        }

        for cause in err.chain() {
            if let Some(io_err) = cause.downcast_ref::<std::io::Error>()
                && io_err.kind() == std::io::ErrorKind::NotFound
            {
                return true;
            }
        }

        false
    }

    /// Save configuration using an explicit context.
    pub fn save(&self, ctx: &dyn AppContext) -> Result<()> {
        let path = ctx.get_config_file_path()?;
        LocalStorage::with_lock(&path, || {
            let toml_str = toml::to_string_pretty(self)?;
            LocalStorage::atomic_write(&path, toml_str)?;
            Ok(())
        })?;
        Ok(())
    }

    pub fn get_path_string(ctx: &dyn AppContext) -> Result<String> {
        let path = ctx.get_config_file_path()?;
        Ok(path.to_string_lossy().to_string())
    }

    pub fn is_signed_in(&self) -> bool {
        !self.token.is_empty()
    }

    pub fn row_options(&self) -> RowOptions {
        RowOptions {
            priority: self.priority_column,
            zone: self.date_zone,
        }
    }

    /// Configured vault directory, or the context's default.
    pub fn vault_dir(&self, ctx: &dyn AppContext) -> Result<PathBuf> {
        match &self.vault_path {
            Some(p) => Ok(p.clone()),
            None => ctx.get_default_vault_dir(),
        }
    }

    /// Forgets the token and everything fetched with it.
    pub fn clear_user(&mut self) {
        self.token.clear();
        self.user = None;
        self.teams.clear();
        self.team_id = None;
    }
}
