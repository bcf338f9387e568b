//! The session owns the dashboard API bearer token and hands out the `Transport` that every
//! collaborator call receives. Nothing else in the crate reads or writes the token file.

use crate::{utils, Config, Result};
use anyhow::Context;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const USER_AGENT: &str = concat!("haulboard/", env!("CARGO_PKG_VERSION"));
const MAPS_URL: &str = "https://maps.googleapis.com/maps/api/";

/// The persisted form of the bearer token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
}

impl SessionToken {
    pub fn new(access_token: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at,
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|t| t <= now)
    }
}

impl Debug for SessionToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionToken")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Manages the lifecycle of the bearer token: set, clear and expire.
#[derive(Debug, Clone)]
pub struct Session {
    path: PathBuf,
    token: Option<SessionToken>,
}

impl Session {
    /// Loads the token stored at the configured token path. A missing file means "logged out".
    pub async fn load(config: &Config) -> Result<Self> {
        Self::load_from(config.token_path()).await
    }

    pub(crate) async fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let token = match utils::read_optional(&path).await? {
            Some(content) => Some(
                serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse token file at {}", path.display()))?,
            ),
            None => None,
        };
        Ok(Self { path, token })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn token(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }

    /// Stores a new token. When `ttl` is given the token expires that long from now.
    pub async fn set_token(
        &mut self,
        access_token: impl Into<String>,
        ttl: Option<ChronoDuration>,
    ) -> Result<()> {
        let token = SessionToken::new(access_token, ttl.map(|ttl| Utc::now() + ttl));
        let json = serde_json::to_string_pretty(&token).context("Unable to serialize token")?;
        utils::write_secret(&self.path, json).await?;
        debug!("Saved session token to {}", self.path.display());
        self.token = Some(token);
        Ok(())
    }

    /// Forgets the token, in memory and on disk.
    pub async fn clear(&mut self) -> Result<()> {
        utils::remove(&self.path).await?;
        self.token = None;
        Ok(())
    }

    /// The bearer token to send, if there is one that has not expired at `now`.
    pub fn bearer(&self, now: DateTime<Utc>) -> Option<&str> {
        match &self.token {
            Some(token) if token.is_expired(now) => {
                warn!("The session token expired, run 'haulboard login' again");
                None
            }
            Some(token) => Some(token.access_token.as_str()),
            None => None,
        }
    }

    /// Builds the transport configuration for this session.
    pub async fn transport(&self, config: &Config) -> Result<Transport> {
        Transport::new(
            config.api_url().clone(),
            config.maps_key().await?,
            self.bearer(Utc::now()).map(str::to_string),
            config.request_timeout(),
        )
    }
}

/// Everything a collaborator needs to make a request: where to send it, which credentials to
/// attach and how long to wait. One of these is passed into every record-store, distance and
/// geocoding call.
#[derive(Clone)]
pub struct Transport {
    api_url: Url,
    maps_url: Url,
    maps_key: Option<String>,
    bearer: Option<String>,
    timeout: Duration,
    client: reqwest::Client,
}

impl Transport {
    pub fn new(
        api_url: Url,
        maps_key: Option<String>,
        bearer: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Unable to build the HTTP client")?;
        Ok(Self {
            api_url,
            maps_url: Url::parse(MAPS_URL).context("Invalid maps URL")?,
            maps_key,
            bearer,
            timeout,
            client,
        })
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    pub fn maps_url(&self) -> &Url {
        &self.maps_url
    }

    pub fn maps_key(&self) -> Option<&str> {
        self.maps_key.as_deref()
    }

    pub fn bearer(&self) -> Option<&str> {
        self.bearer.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub(crate) fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

impl Debug for Transport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("api_url", &self.api_url.as_str())
            .field("maps_url", &self.maps_url.as_str())
            .field("maps_key", &self.maps_key.as_ref().map(|_| "<redacted>"))
            .field("bearer", &self.bearer.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_session_lifecycle() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token.json");

        let mut session = Session::load_from(&path).await.unwrap();
        assert!(session.token().is_none());
        assert_eq!(session.bearer(Utc::now()), None);

        session
            .set_token("secret-token", Some(ChronoDuration::hours(8)))
            .await
            .unwrap();
        assert_eq!(session.bearer(Utc::now()), Some("secret-token"));

        // A fresh load sees the persisted token.
        let reloaded = Session::load_from(&path).await.unwrap();
        assert_eq!(reloaded.token(), session.token());

        session.clear().await.unwrap();
        assert!(session.token().is_none());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_session_token_expires() {
        let dir = TempDir::new().unwrap();
        let mut session = Session::load_from(dir.path().join("token.json"))
            .await
            .unwrap();
        session
            .set_token("secret-token", Some(ChronoDuration::minutes(30)))
            .await
            .unwrap();

        let later = Utc::now() + ChronoDuration::hours(1);
        assert_eq!(session.bearer(later), None);
        assert!(session.token().unwrap().is_expired(later));
    }

    #[tokio::test]
    async fn test_session_token_without_expiry() {
        let dir = TempDir::new().unwrap();
        let mut session = Session::load_from(dir.path().join("token.json"))
            .await
            .unwrap();
        session.set_token("forever", None).await.unwrap();
        let much_later = Utc::now() + ChronoDuration::days(365);
        assert_eq!(session.bearer(much_later), Some("forever"));
    }

    #[tokio::test]
    async fn test_transport_from_config() {
        let env = crate::test::TestEnv::new().await;
        let config = env.config();
        let transport = Session::load(&config)
            .await
            .unwrap()
            .transport(&config)
            .await
            .unwrap();
        assert_eq!(transport.timeout(), config.request_timeout());
        assert_eq!(transport.maps_key(), Some("test-maps-key"));
        assert_eq!(transport.bearer(), None);
    }

    #[test]
    fn test_transport_debug_redacts_secrets() {
        let transport = Transport::new(
            Url::parse("https://api.example.co.th/").unwrap(),
            Some("AIzaSecret".to_string()),
            Some("bearer-secret".to_string()),
            Duration::from_secs(3),
        )
        .unwrap();
        let debug = format!("{transport:?}");
        assert!(!debug.contains("AIzaSecret"));
        assert!(!debug.contains("bearer-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
