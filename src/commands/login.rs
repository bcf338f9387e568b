use crate::commands::Out;
use crate::{Config, Result, Session};
use anyhow::ensure;
use chrono::Duration;

/// Stores `token` as the dashboard API bearer token. With `expires_in_hours` the token is treated
/// as expired after that many hours.
pub async fn login(config: &Config, token: &str, expires_in_hours: Option<i64>) -> Result<Out<()>> {
    let token = token.trim();
    ensure!(!token.is_empty(), "The session token is empty");
    let ttl = match expires_in_hours {
        Some(hours) => {
            ensure!(hours > 0, "--expires-in-hours must be greater than zero");
            Some(Duration::hours(hours))
        }
        None => None,
    };

    let mut session = Session::load(config).await?;
    session.set_token(token, ttl).await?;
    Ok(match session.token().and_then(|t| t.expires_at()) {
        Some(expires_at) => format!("Logged in until {}", expires_at.to_rfc3339()),
        None => "Logged in".to_string(),
    }
    .into())
}

/// Removes the stored bearer token.
pub async fn logout(config: &Config) -> Result<Out<()>> {
    let mut session = Session::load(config).await?;
    if session.token().is_none() {
        return Ok("Not logged in".into());
    }
    session.clear().await?;
    Ok("Logged out".into())
}
