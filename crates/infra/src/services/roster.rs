use anyhow::Context as _;
use calgate_domain::{PlannedShift, WorkShift};
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct WorkingStaffResponse {
    #[serde(default)]
    shifts: Vec<PlannedShift>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkShiftsResponse {
    #[serde(default)]
    work_shifts: Vec<WorkShift>,
}

/// Client for the roster peer service; free-slot derivation pulls the
/// working shifts of a time range through it.
pub struct RosterClient {
    http: reqwest::Client,
    base_url: String,
}

impl RosterClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub async fn working_staff(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        roster_type_name: &str,
    ) -> anyhow::Result<Vec<PlannedShift>> {
        let res = self
            .http
            .get(format!("{}/v1/roster/working-staff", self.base_url))
            .query(&[
                ("from", from.to_rfc3339()),
                ("to", to.to_rfc3339()),
                ("rosterTypeName", roster_type_name.to_string()),
            ])
            .send()
            .await
            .context("roster request failed")?
            .error_for_status()
            .context("roster request rejected")?;

        let body: WorkingStaffResponse = res
            .json()
            .await
            .context("failed to unmarshal roster response")?;

        Ok(body.shifts)
    }

    pub async fn work_shifts(&self) -> anyhow::Result<Vec<WorkShift>> {
        let res = self
            .http
            .get(format!("{}/v1/workshifts", self.base_url))
            .send()
            .await
            .context("workshift request failed")?
            .error_for_status()
            .context("workshift request rejected")?;

        let body: WorkShiftsResponse = res
            .json()
            .await
            .context("failed to unmarshal workshift response")?;

        Ok(body.work_shifts)
    }
}
