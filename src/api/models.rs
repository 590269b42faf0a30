// ABOUTME: Control plane records exchanged with the API.
// ABOUTME: App summaries, releases, release commands, and status reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::Platform;
use crate::types::{AppName, EvaluationId, ReleaseCommandId, ReleaseId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub slug: String,
}

/// Remote snapshot of an app, fetched once per deploy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSummary {
    pub name: AppName,
    pub organization: Organization,
    #[serde(default, deserialize_with = "platform_marker")]
    pub platform_version: Option<Platform>,
    /// Whether the app has ever been deployed.
    #[serde(default)]
    pub deployed: bool,
}

fn platform_marker<'de, D>(deserializer: D) -> Result<Option<Platform>, D::Error>
where
    D: Deserializer<'de>,
{
    let marker = Option::<String>::deserialize(deserializer)?;
    Ok(marker.as_deref().and_then(Platform::from_marker))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrgSettings {
    #[serde(default)]
    pub machines_default_on: bool,
}

/// Request body for creating a release.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeployImageInput {
    pub app_id: AppName,
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub id: ReleaseId,
    pub version: u32,
    #[serde(default)]
    pub deployment_strategy: String,
    pub evaluation_id: EvaluationId,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Release {
    /// Strategy for releases that go live without anything to monitor.
    pub const IMMEDIATE: &'static str = "IMMEDIATE";

    pub fn is_immediate(&self) -> bool {
        self.deployment_strategy == Self::IMMEDIATE
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseCommand {
    pub id: ReleaseCommandId,
    pub command: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedRelease {
    pub release: Release,
    #[serde(default)]
    pub release_command: Option<ReleaseCommand>,
}

/// Status of anything the control plane runs asynchronously.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Where an asynchronous task stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    InFlight(String),
    Succeeded,
    Failed(String),
}

impl StatusReport {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            message: None,
        }
    }

    pub fn progress(&self) -> Progress {
        match self.status.to_ascii_lowercase().as_str() {
            "succeeded" | "successful" | "complete" | "completed" => Progress::Succeeded,
            "failed" | "cancelled" | "canceled" | "timeout" | "timed_out" | "terminated" => {
                let reason = self
                    .message
                    .clone()
                    .unwrap_or_else(|| self.status.clone());
                Progress::Failed(reason)
            }
            other => Progress::InFlight(other.to_string()),
        }
    }
}
