// ABOUTME: HTTP client for the hangar control plane API.
// ABOUTME: Implements the control plane, status, and rollout seams over JSON/REST.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::error::{ApiError, Result};
use super::models::{
    AppSummary, CreatedRelease, DeployImageInput, OrgSettings, Release, ReleaseCommand,
    StatusReport,
};
use super::{ConfigSource, ControlPlane, StatusSource};
use crate::config::AppConfig;
use crate::deploy::{RolloutEngine, RolloutError, RolloutSpec, poll_until_terminal};
use crate::settings::ClientSettings;
use crate::types::{AppName, EvaluationId, ReleaseCommandId, ReleaseId, RolloutId};

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    poll_interval: Duration,
    watch_timeout: Duration,
}

fn app_path(app: &AppName) -> String {
    format!("/v1/apps/{}", urlencoding::encode(app.as_str()))
}

impl ApiClient {
    pub fn new(settings: &ClientSettings) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", settings.access_token))
            .map_err(|_| ApiError::Other("access token contains invalid characters".into()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("hangar/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: settings.api_url.clone(),
            poll_interval: settings.poll_interval,
            watch_timeout: settings.watch_timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        tracing::debug!(path, "GET");
        let response = self.http.get(self.url(path)).send().await?;
        Self::decode(response, path).await
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        tracing::debug!(path, "POST");
        let response = self.http.post(self.url(path)).json(body).send().await?;
        Self::decode(response, path).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response, path: &str) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status.as_u16(), path, body));
        }
        Ok(response.json::<T>().await?)
    }
}

/// Connection scoped to a single app's stored config.
#[derive(Debug, Clone)]
pub struct AppScopedClient {
    client: ApiClient,
    app: AppName,
}

#[async_trait]
impl ConfigSource for AppScopedClient {
    async fn fetch_config(&self) -> Result<AppConfig> {
        let path = format!("{}/config", app_path(&self.app));
        self.client.get_json(&path).await
    }
}

#[async_trait]
impl ControlPlane for ApiClient {
    async fn app_summary(&self, app: &AppName) -> Result<AppSummary> {
        self.get_json(&app_path(app)).await
    }

    async fn machines_default_on(&self, org_slug: &str) -> Result<bool> {
        let path = format!("/v1/orgs/{}/settings", urlencoding::encode(org_slug));
        let settings: OrgSettings = self.get_json(&path).await?;
        Ok(settings.machines_default_on)
    }

    async fn config_source(&self, app: &AppName) -> Result<Box<dyn ConfigSource>> {
        // Fail early if the app isn't visible to this token.
        let _: AppSummary = self.get_json(&app_path(app)).await?;
        Ok(Box::new(AppScopedClient {
            client: self.clone(),
            app: app.clone(),
        }))
    }

    async fn create_release(
        &self,
        input: &DeployImageInput,
    ) -> Result<(Release, Option<ReleaseCommand>)> {
        let path = format!("{}/releases", app_path(&input.app_id));
        let created: CreatedRelease = self.post_json(&path, input).await?;
        Ok((created.release, created.release_command))
    }

    async fn release(&self, app: &AppName, id: &ReleaseId) -> Result<Release> {
        let path = format!(
            "{}/releases/{}",
            app_path(app),
            urlencoding::encode(id.as_str())
        );
        self.get_json(&path).await
    }
}

#[async_trait]
impl StatusSource for ApiClient {
    async fn release_command_status(
        &self,
        app: &AppName,
        id: &ReleaseCommandId,
    ) -> Result<StatusReport> {
        let path = format!(
            "{}/release_commands/{}",
            app_path(app),
            urlencoding::encode(id.as_str())
        );
        self.get_json(&path).await
    }

    async fn evaluation_status(&self, app: &AppName, id: &EvaluationId) -> Result<StatusReport> {
        let path = format!(
            "{}/evaluations/{}",
            app_path(app),
            urlencoding::encode(id.as_str())
        );
        self.get_json(&path).await
    }
}

#[derive(serde::Deserialize)]
struct CreatedRollout {
    id: RolloutId,
}

#[async_trait]
impl RolloutEngine for ApiClient {
    async fn run_rollout(&self, spec: &RolloutSpec) -> std::result::Result<(), RolloutError> {
        let path = format!("{}/rollouts", app_path(&spec.app));
        let created: CreatedRollout = self.post_json(&path, spec).await?;
        tracing::debug!(rollout = %created.id, "rollout submitted");

        let status_path = format!("{path}/{}", urlencoding::encode(created.id.as_str()));
        poll_until_terminal("rollout", self.poll_interval, self.watch_timeout, || {
            self.get_json::<StatusReport>(&status_path)
        })
        .await?;

        Ok(())
    }
}
