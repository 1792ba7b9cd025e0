use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result, bail};
use reqwest::{
    Response, StatusCode,
    header::{HeaderMap, LOCATION, RETRY_AFTER},
};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;

use crate::{
    credential::AzureCredential,
    models::arm::{ArmPage, OperationStatus, Subscription},
};

pub const ARM_ENDPOINT: &str = "https://management.azure.com";
const SUBSCRIPTIONS_API_VERSION: &str = "2022-12-01";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
const ASYNC_OPERATION: &str = "azure-asyncoperation";

/// Thin Azure Resource Manager REST client: paged listing, actions and
/// deletes that wait for the long-running operation to finish.
#[derive(Clone, Debug)]
pub struct ArmClient {
    endpoint: String,
    http: reqwest::Client,
    credential: Arc<AzureCredential>,
}

impl ArmClient {
    pub fn new(credential: Arc<AzureCredential>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(60))
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            endpoint: ARM_ENDPOINT.to_string(),
            http,
            credential,
        })
    }

    fn join_url(&self, path: &str, api_version: &str, query: Option<&str>) -> String {
        let mut url = format!(
            "{}/{}?api-version={}",
            self.endpoint,
            path.trim_start_matches('/'),
            api_version
        );
        if let Some(query) = query {
            url.push('&');
            url.push_str(query);
        }
        url
    }

    async fn send_get(&self, url: &str) -> Result<Response> {
        let token = self.credential.token().await?;
        let resp = self
            .http
            .get(url)
            .bearer_auth(token.expose_secret())
            .send()
            .await?;
        Ok(resp)
    }

    /// All subscriptions visible to the credential.
    pub async fn list_subscriptions(&self) -> Result<Vec<Subscription>> {
        self.list("/subscriptions", SUBSCRIPTIONS_API_VERSION).await
    }

    /// GET a collection and follow `nextLink` until exhausted.
    pub async fn list<T: DeserializeOwned>(&self, path: &str, api_version: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(self.join_url(path, api_version, None));
        while let Some(url) = next {
            let page = self
                .send_get(&url)
                .await?
                .error_for_status()?
                .json::<ArmPage<T>>()
                .await
                .with_context(|| format!("failed to deserialize list response for {path}"))?;
            items.extend(page.value);
            next = page.next_link;
        }
        Ok(items)
    }

    /// POST an action on a resource, e.g. `listClusterAdminCredential`.
    pub async fn post_action<T: DeserializeOwned>(
        &self,
        id: &str,
        action: &str,
        api_version: &str,
    ) -> Result<T> {
        let url = self.join_url(&format!("{}/{}", id.trim_end_matches('/'), action), api_version, None);
        let token = self.credential.token().await?;
        self.http
            .post(url)
            .bearer_auth(token.expose_secret())
            .header(reqwest::header::CONTENT_LENGTH, 0)
            .send()
            .await?
            .error_for_status()?
            .json::<T>()
            .await
            .with_context(|| format!("failed to deserialize {action} response"))
    }

    /// DELETE a resource and wait until Azure reports the operation complete.
    pub async fn delete(&self, id: &str, api_version: &str, query: Option<&str>) -> Result<()> {
        let url = self.join_url(id, api_version, query);
        let token = self.credential.token().await?;
        let resp = self
            .http
            .delete(url)
            .bearer_auth(token.expose_secret())
            .send()
            .await?;

        match resp.status() {
            StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
            StatusCode::NOT_FOUND => {
                tracing::debug!(resource_id = id, "Resource already gone");
                Ok(())
            }
            StatusCode::ACCEPTED | StatusCode::CREATED => {
                self.wait_for_completion(resp.headers()).await
            }
            _ => {
                resp.error_for_status()?;
                Ok(())
            }
        }
    }

    async fn wait_for_completion(&self, headers: &HeaderMap) -> Result<()> {
        let mut delay = retry_after(headers);

        if let Some(url) = header_str(headers, ASYNC_OPERATION) {
            loop {
                tokio::time::sleep(delay).await;
                let resp = self.send_get(&url).await?.error_for_status()?;
                delay = retry_after(resp.headers());
                let status = resp
                    .json::<OperationStatus>()
                    .await
                    .context("failed to deserialize operation status")?;
                match status.status.as_str() {
                    "Succeeded" => return Ok(()),
                    "Failed" | "Canceled" => bail!(
                        "operation {}: {}",
                        status.status.to_lowercase(),
                        status.error.map(|e| e.to_string()).unwrap_or_default()
                    ),
                    _ => continue,
                }
            }
        }

        if let Some(url) = header_str(headers, LOCATION.as_str()) {
            loop {
                tokio::time::sleep(delay).await;
                let resp = self.send_get(&url).await?;
                match resp.status() {
                    StatusCode::ACCEPTED => delay = retry_after(resp.headers()),
                    StatusCode::OK | StatusCode::NO_CONTENT | StatusCode::NOT_FOUND => return Ok(()),
                    _ => {
                        resp.error_for_status()?;
                        return Ok(());
                    }
                }
            }
        }

        // nothing to poll, the service accepted the request
        Ok(())
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

fn retry_after(headers: &HeaderMap) -> Duration {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_POLL_INTERVAL)
}
