//! Stored-credential session provider for Google Drive.
//!
//! Authorization is a one-time, interactive affair performed outside this
//! program; it leaves behind a `token.json` holding a refresh token. This
//! module only ever exchanges that refresh token for short-lived access
//! tokens.

use super::drive::{DriveRemote, status_error};
use super::{RemoteHandle, SessionProvider};
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::{OptionExt, ResultExt};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
/// Access tokens this close to expiry are refreshed before use.
const REFRESH_MARGIN: Duration = Duration::seconds(60);

/// Session provider reading an OAuth client file and a stored token file.
///
/// ```no_run
/// use senas_storage::remote::DriveAuthenticator;
/// use senas_storage::SessionProvider;
///
/// # async fn example() -> senas_storage::error::Result<()> {
/// let auth = DriveAuthenticator::new("./credentials.json", "./token.json");
/// let drive = auth.authenticate().await?;
/// let children = drive.list("1AbCdEf").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DriveAuthenticator {
    credentials_path: PathBuf,
    token_path: PathBuf,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ClientSecrets {
    client_id: String,
    client_secret: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Debug, Deserialize)]
struct StoredToken {
    refresh_token: Option<String>,
    access_token: Option<String>,
    /// Unix timestamp in milliseconds.
    expiry_date: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: OffsetDateTime,
}
impl AccessToken {
    fn is_fresh(&self, now: OffsetDateTime) -> bool {
        self.expires_at - REFRESH_MARGIN > now
    }
}

impl DriveAuthenticator {
    pub fn new(credentials_path: impl Into<PathBuf>, token_path: impl Into<PathBuf>) -> Self {
        Self {
            credentials_path: credentials_path.into(),
            token_path: token_path.into(),
            client: Client::new(),
        }
    }

    async fn load_secrets(&self) -> Result<ClientSecrets> {
        let raw = read_json_file(&self.credentials_path, "credentials").await?;
        let file: ClientSecretsFile = serde_json::from_slice(&raw).or_raise(|| {
            ErrorKind::Authentication(format!("{} is not a valid OAuth client file", self.credentials_path.display()))
        })?;
        file.installed.or(file.web).ok_or_raise(|| {
            ErrorKind::Authentication(format!(
                "{} has neither an `installed` nor a `web` section",
                self.credentials_path.display()
            ))
        })
    }

    async fn load_token(&self) -> Result<StoredToken> {
        if !tokio::fs::try_exists(&self.token_path).await.unwrap_or(false) {
            exn::bail!(ErrorKind::Authentication(format!(
                "{} not found; run the one-time authorization first",
                self.token_path.display()
            )));
        }
        let raw = read_json_file(&self.token_path, "token").await?;
        serde_json::from_slice(&raw)
            .or_raise(|| ErrorKind::Authentication(format!("{} is not a valid token file", self.token_path.display())))
    }
}

#[async_trait]
impl SessionProvider for DriveAuthenticator {
    #[tracing::instrument(skip(self), fields(credentials = %self.credentials_path.display()))]
    async fn authenticate(&self) -> Result<RemoteHandle> {
        let secrets = self.load_secrets().await?;
        let stored = self.load_token().await?;
        let refresh_token = stored.refresh_token.ok_or_raise(|| {
            ErrorKind::Authentication(format!(
                "{} has no refresh_token; run the one-time authorization again",
                self.token_path.display()
            ))
        })?;
        let seeded = match (stored.access_token, stored.expiry_date) {
            (Some(value), Some(expiry_ms)) => OffsetDateTime::from_unix_timestamp_nanos(i128::from(expiry_ms) * 1_000_000)
                .ok()
                .map(|expires_at| AccessToken { value, expires_at }),
            _ => None,
        };
        let tokens = TokenSource {
            client: self.client.clone(),
            secrets,
            refresh_token,
            current: Mutex::new(seeded),
        };
        // Fail here, not halfway through the walk, when the grant was revoked.
        tokens.bearer().await?;
        tracing::info!("Authenticated with Google Drive");
        Ok(Arc::new(DriveRemote::new(self.client.clone(), tokens)))
    }
}

/// Hands out bearer tokens, refreshing them shortly before expiry.
pub(crate) struct TokenSource {
    client: Client,
    secrets: ClientSecrets,
    refresh_token: String,
    current: Mutex<Option<AccessToken>>,
}

impl TokenSource {
    pub(crate) async fn bearer(&self) -> Result<String> {
        let mut current = self.current.lock().await;
        if let Some(token) = current.as_ref()
            && token.is_fresh(OffsetDateTime::now_utc())
        {
            return Ok(token.value.clone());
        }
        let fresh = self.refresh().await?;
        let value = fresh.value.clone();
        *current = Some(fresh);
        Ok(value)
    }

    async fn refresh(&self) -> Result<AccessToken> {
        tracing::debug!("Refreshing access token");
        let requested_at = OffsetDateTime::now_utc();
        let response = self
            .client
            .post(&self.secrets.token_uri)
            .form(&[
                ("client_id", self.secrets.client_id.as_str()),
                ("client_secret", self.secrets.client_secret.as_str()),
                ("refresh_token", self.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .or_raise(|| ErrorKind::Network("token endpoint unreachable".to_string()))?;
        let status = response.status();
        if matches!(status, StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED) {
            exn::bail!(ErrorKind::Authentication(format!(
                "refresh token rejected (HTTP {}); run the one-time authorization again",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            exn::bail!(status_error(status, "token endpoint"));
        }
        let body: TokenResponse = response
            .json()
            .await
            .or_raise(|| ErrorKind::BackendError("malformed token response".to_string()))?;
        Ok(AccessToken {
            value: body.access_token,
            expires_at: requested_at + Duration::seconds(body.expires_in),
        })
    }
}

async fn read_json_file(path: &Path, what: &str) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .or_raise(|| ErrorKind::Authentication(format!("could not read {what} file {}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_freshness_margin() {
        let now = OffsetDateTime::now_utc();
        let token = |secs| AccessToken {
            value: "t".into(),
            expires_at: now + Duration::seconds(secs),
        };
        assert!(token(3600).is_fresh(now));
        assert!(token(61).is_fresh(now));
        assert!(!token(60).is_fresh(now));
        assert!(!token(-5).is_fresh(now));
    }

    #[tokio::test]
    async fn test_installed_and_web_sections() {
        let dir = tempfile::tempdir().unwrap();
        let installed = write(
            dir.path(),
            "installed.json",
            r#"{"installed": {"client_id": "id-1", "client_secret": "s-1", "redirect_uris": ["http://localhost"]}}"#,
        );
        let web = write(
            dir.path(),
            "web.json",
            r#"{"web": {"client_id": "id-2", "client_secret": "s-2", "token_uri": "https://example.test/token"}}"#,
        );
        let secrets = DriveAuthenticator::new(&installed, dir.path().join("token.json")).load_secrets().await.unwrap();
        assert_eq!(secrets.client_id, "id-1");
        assert_eq!(secrets.token_uri, DEFAULT_TOKEN_URI);
        let secrets = DriveAuthenticator::new(&web, dir.path().join("token.json")).load_secrets().await.unwrap();
        assert_eq!(secrets.client_secret, "s-2");
        assert_eq!(secrets.token_uri, "https://example.test/token");
    }

    #[tokio::test]
    async fn test_missing_token_file_is_authentication_error() {
        let dir = tempfile::tempdir().unwrap();
        let credentials = write(dir.path(), "credentials.json", r#"{"installed": {"client_id": "a", "client_secret": "b"}}"#);
        let auth = DriveAuthenticator::new(credentials, dir.path().join("token.json"));
        let err = auth.authenticate().await.err().unwrap();
        assert!(matches!(&*err, ErrorKind::Authentication(msg) if msg.contains("one-time authorization")));
    }

    #[tokio::test]
    async fn test_token_without_refresh_token() {
        let dir = tempfile::tempdir().unwrap();
        let credentials = write(dir.path(), "credentials.json", r#"{"web": {"client_id": "a", "client_secret": "b"}}"#);
        let token = write(dir.path(), "token.json", r#"{"access_token": "x", "expiry_date": 1}"#);
        let err = DriveAuthenticator::new(credentials, token).authenticate().await.err().unwrap();
        assert!(matches!(&*err, ErrorKind::Authentication(msg) if msg.contains("refresh_token")));
    }

    #[tokio::test]
    async fn test_missing_credentials_file() {
        let dir = tempfile::tempdir().unwrap();
        let auth = DriveAuthenticator::new(dir.path().join("nope.json"), dir.path().join("token.json"));
        let err = auth.authenticate().await.err().unwrap();
        assert!(matches!(&*err, ErrorKind::Authentication(_)));
    }
}
