//! Configuration file handling for haulboard.
//!
//! The configuration file is stored at `$HAULBOARD_HOME/config.json` and contains the dashboard
//! API URL, the timezone used to cut records into days, the request timeout and the paths of the
//! secrets (the maps API key and the session token).

use crate::model::DayZone;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const APP_NAME: &str = "haulboard";
const CONFIG_VERSION: u8 = 1;
const REQUEST_TIMEOUT_SECS: u64 = 15;
const SECRETS: &str = ".secrets";
const MAPS_KEY: &str = "maps_api_key";
const TOKEN_JSON: &str = "token.json";
const CONFIG_JSON: &str = "config.json";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$HAULBOARD_HOME` and from there it loads `$HAULBOARD_HOME/config.json`. It provides
/// paths to other items that are either configurable or are expected in a certain location within
/// the home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    api_url: Url,
}

impl Config {
    /// Creates the data directory, its subdirectories and:
    /// - Creates an initial `config.json` file using `api_url` along with default settings
    /// - Copies `maps_key_file`, if given, into its default location in the data dir.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of data directory, e.g. `$HOME/haulboard`
    /// - `api_url` - The base URL of the dashboard REST API, e.g. `https://api.example.co.th/v1/`
    /// - `maps_key_file` - A text file holding the Google Maps API key used for distance and
    ///   geocoding queries.
    ///
    /// # Errors
    /// - Returns an error if any file operations fail or the URL is not valid.
    pub async fn create(
        dir: impl Into<PathBuf>,
        api_url: &str,
        maps_key_file: Option<&Path>,
    ) -> Result<Self> {
        let api_url = parse_api_url(api_url)?;

        // Create the directory if it does not exist
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the haulboard home directory")?;

        // Canonicalize the directory path
        let root = utils::canonicalize(&maybe_relative).await?;

        let secrets_dir = root.join(SECRETS);
        utils::make_dir(&secrets_dir).await?;

        if let Some(maps_key_file) = maps_key_file {
            let key = utils::read(maps_key_file).await?;
            utils::write_secret(secrets_dir.join(MAPS_KEY), key.trim()).await?;
        }

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            api_url: api_url.to_string(),
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            secrets: secrets_dir,
            config_path,
            config_file,
            api_url,
        })
    }

    /// This will
    /// - validate that the home directory exists and that the config file exists
    /// - load the config file
    /// - validate that the secrets directory exists
    /// - return the loaded configuration object
    pub async fn load(home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The haulboard home directory is missing, run 'haulboard init'")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;
        let api_url = parse_api_url(&config_file.api_url)?;

        let config = Self {
            root: root.clone(),
            secrets: root.join(SECRETS),
            config_path,
            config_file,
            api_url,
        };
        if !config.secrets.is_dir() {
            bail!(
                "The secrets directory is missing '{}'",
                config.secrets.display()
            )
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    pub fn day_zone(&self) -> DayZone {
        self.config_file.day_zone
    }

    /// Overrides the configured day zone for this run only. Nothing is written to disk.
    pub fn with_day_zone(mut self, zone: DayZone) -> Self {
        self.config_file.day_zone = zone;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.config_file.request_timeout_secs)
    }

    /// Returns the stored `maps_key_path` if it is absolute, otherwise resolves the relative path.
    pub fn maps_key_path(&self) -> PathBuf {
        self.resolve_secrets_file_path(self.config_file.maps_key_path())
    }

    /// Returns the stored `token_path` if it is absolute, otherwise resolves the relative path.
    pub fn token_path(&self) -> PathBuf {
        self.resolve_secrets_file_path(self.config_file.token_path())
    }

    /// Reads the maps API key. Returns `None` when no key has been installed.
    pub async fn maps_key(&self) -> Result<Option<String>> {
        let key = utils::read_optional(&self.maps_key_path()).await?;
        Ok(key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()))
    }

    /// Checks if `p` is relative, and if so, resolves it. Returns it unchanged if it is absolute.
    fn resolve_secrets_file_path(&self, p: PathBuf) -> PathBuf {
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "haulboard",
///   "config_version": 1,
///   "api_url": "https://api.example.co.th/v1/",
///   "day_zone": "+07:00",
///   "request_timeout_secs": 15,
///   "maps_key_path": ".secrets/maps_api_key",
///   "token_path": ".secrets/token.json"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "haulboard"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Base URL of the dashboard REST API
    api_url: String,

    /// Timezone in which record timestamps are cut into days: "local", "utc" or "+HH:MM"
    #[serde(default)]
    day_zone: DayZone,

    /// Timeout for each distance, geocoding or record-store request
    #[serde(default = "default_request_timeout_secs")]
    request_timeout_secs: u64,

    /// Path to the maps API key file (optional, relative to the home directory or absolute)
    /// Defaults to $HAULBOARD_HOME/.secrets/maps_api_key if not specified
    #[serde(skip_serializing_if = "Option::is_none")]
    maps_key_path: Option<PathBuf>,

    /// Path to the session token file (optional, relative to the home directory or absolute)
    /// Defaults to $HAULBOARD_HOME/.secrets/token.json if not specified
    #[serde(skip_serializing_if = "Option::is_none")]
    token_path: Option<PathBuf>,
}

fn default_request_timeout_secs() -> u64 {
    REQUEST_TIMEOUT_SECS
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            api_url: String::new(),
            day_zone: DayZone::default(),
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            maps_key_path: None,
            token_path: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path)
            .await
            .with_context(|| format!("Failed to load config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            config.request_timeout_secs > 0,
            "request_timeout_secs must be greater than zero"
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    fn maps_key_path(&self) -> PathBuf {
        self.maps_key_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(MAPS_KEY))
    }

    fn token_path(&self) -> PathBuf {
        self.token_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(TOKEN_JSON))
    }
}

/// Parses and validates the API base URL. A trailing slash is added so that endpoint paths can be
/// joined onto it.
fn parse_api_url(s: &str) -> Result<Url> {
    let mut url = Url::parse(s.trim()).with_context(|| format!("Invalid API URL '{s}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("The API URL must use http or https, got '{}'", url.scheme());
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
