use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory, its subdirectories and:
/// - Creates an initial `config.json` file using `api_url` along with default settings
/// - Copies the key held in `maps_key`, if given, into its default location in the data dir.
///
/// # Arguments
/// - `haulboard_home` - The directory that will be the root of data directory, e.g.
///   `$HOME/haulboard`
/// - `api_url` - The base URL of the dashboard REST API.
/// - `maps_key` - A text file holding the Google Maps API key.
///
/// # Errors
/// - Returns an error if any file operations fail.
pub async fn init(haulboard_home: &Path, api_url: &str, maps_key: Option<&Path>) -> Result<Out<()>> {
    let config = Config::create(haulboard_home, api_url, maps_key)
        .await
        .context("Unable to create the data directory and configs")?;
    if maps_key.is_none() {
        return Ok(format!(
            "Created {}. No maps API key was given, so 'route' and 'geocode' only work in test mode",
            config.root().display()
        )
        .into());
    }
    Ok(format!("Created {}", config.root().display()).into())
}
