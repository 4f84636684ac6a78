use anyhow::Context as _;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

// https://developers.google.com/identity/protocols/oauth2/web-server#httprest_3
const TOKEN_REFRESH_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// OAuth client credentials as stored in the downloaded credentials file.
#[derive(Debug, Clone, Deserialize)]
pub struct OauthClient {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    installed: Option<OauthClient>,
    web: Option<OauthClient>,
}

/// The persisted refresh token with the most recent access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    #[serde(default)]
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct RefreshTokenResponse {
    access_token: String,
    // access token lifetime in seconds
    expires_in: i64,
}

pub fn credentials_from_file(path: impl AsRef<Path>) -> anyhow::Result<OauthClient> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read credentials file {}", path.display()))?;

    let file: CredentialsFile =
        serde_json::from_str(&content).context("failed to unmarshal credentials JSON")?;

    file.installed
        .or(file.web)
        .context("credentials file holds neither an installed nor a web client")
}

pub fn token_from_file(path: impl AsRef<Path>) -> anyhow::Result<StoredToken> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read token file {}", path.display()))?;

    serde_json::from_str(&content).context("failed to unmarshal JSON token")
}

/// Hands out a valid access token, refreshing it through the OAuth endpoint
/// when it is about to expire. The refreshed token is written back to the
/// token file so it survives restarts.
pub struct AccessTokenProvider {
    client: OauthClient,
    token_path: PathBuf,
    http: reqwest::Client,
    token: tokio::sync::Mutex<StoredToken>,
}

impl AccessTokenProvider {
    pub fn new(client: OauthClient, token_path: impl Into<PathBuf>, token: StoredToken) -> Self {
        Self {
            client,
            token_path: token_path.into(),
            http: reqwest::Client::new(),
            token: tokio::sync::Mutex::new(token),
        }
    }

    pub async fn access_token(&self) -> anyhow::Result<String> {
        let mut token = self.token.lock().await;

        // keep one minute of slack so a token does not expire mid-request
        if let Some(expiry) = token.expiry {
            if Utc::now() + Duration::minutes(1) <= expiry && !token.access_token.is_empty() {
                return Ok(token.access_token.clone());
            }
        }

        let params = [
            ("client_id", self.client.client_id.as_str()),
            ("client_secret", self.client.client_secret.as_str()),
            ("refresh_token", token.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let res = self
            .http
            .post(TOKEN_REFRESH_ENDPOINT)
            .form(&params)
            .send()
            .await
            .context("token refresh request failed")?;

        if !res.status().is_success() {
            anyhow::bail!("token refresh failed with status {}", res.status());
        }

        let refreshed: RefreshTokenResponse = res
            .json()
            .await
            .context("failed to unmarshal token refresh response")?;

        token.access_token = refreshed.access_token;
        token.expiry = Some(Utc::now() + Duration::seconds(refreshed.expires_in));

        if let Err(err) = self.save(&token) {
            warn!(error = %err, "unable to save refreshed token");
        }

        Ok(token.access_token.clone())
    }

    fn save(&self, token: &StoredToken) -> anyhow::Result<()> {
        let blob = serde_json::to_vec(token).context("failed to marshal JSON token")?;
        std::fs::write(&self.token_path, blob)
            .with_context(|| format!("failed to write {}", self.token_path.display()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_installed_and_web_credentials() {
        let path = std::env::temp_dir().join("calgate-creds-test.json");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(
            br#"{ "installed": { "client_id": "id-1", "client_secret": "secret-1" } }"#,
        )
        .unwrap();
        assert_eq!(credentials_from_file(&path).unwrap().client_id, "id-1");

        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(br#"{ "web": { "client_id": "id-2", "client_secret": "secret-2" } }"#)
            .unwrap();
        assert_eq!(credentials_from_file(&path).unwrap().client_id, "id-2");
    }

    #[test]
    fn token_file_round_trip() {
        let path = std::env::temp_dir().join("calgate-token-test.json");
        std::fs::write(
            &path,
            br#"{ "access_token": "at", "refresh_token": "rt", "expiry": "2030-01-01T00:00:00Z" }"#,
        )
        .unwrap();

        let token = token_from_file(&path).unwrap();
        assert_eq!(token.access_token, "at");
        assert_eq!(token.refresh_token, "rt");
        assert!(token.expiry.is_some());
    }

    #[tokio::test]
    async fn valid_access_token_is_reused_without_refresh() {
        let provider = AccessTokenProvider::new(
            OauthClient {
                client_id: "id".into(),
                client_secret: "secret".into(),
            },
            std::env::temp_dir().join("calgate-token-reuse.json"),
            StoredToken {
                access_token: "still-good".into(),
                refresh_token: "rt".into(),
                expiry: Some(Utc::now() + Duration::hours(1)),
            },
        );

        assert_eq!(provider.access_token().await.unwrap(), "still-good");
    }
}
