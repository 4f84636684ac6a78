use anyhow::Context as _;
use calgate_domain::Profile;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ListProfilesResponse {
    #[serde(default)]
    profiles: Vec<Profile>,
}

/// Client for the IDM peer service; the profiles polling cache loads
/// through it.
pub struct IdmClient {
    http: reqwest::Client,
    base_url: String,
}

impl IdmClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub async fn list_profiles(&self) -> anyhow::Result<Vec<Profile>> {
        let res = self
            .http
            .get(format!("{}/v1/profiles", self.base_url))
            .send()
            .await
            .context("idm request failed")?
            .error_for_status()
            .context("idm request rejected")?;

        let body: ListProfilesResponse = res
            .json()
            .await
            .context("failed to unmarshal idm response")?;

        Ok(body.profiles)
    }
}
