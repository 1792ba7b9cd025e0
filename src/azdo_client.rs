use std::time::Duration;

use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};

use crate::{
    models::azdo::{EnvironmentInstance, EnvironmentList},
    project_url::AzdoProjectUrl,
};

const API_VERSION: &str = "7.1-preview.1";
const CONTINUATION_HEADER: &str = "x-ms-continuationtoken";

/// Minimal Azure DevOps REST client for deployment environments of one project
#[derive(Debug)]
pub struct AzdoClient {
    base_url: String,
    pat: SecretString,
    client: reqwest::Client,
}

impl AzdoClient {
    pub fn new(project: &AzdoProjectUrl, pat: SecretString) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            base_url: format!(
                "{}{}/_apis/distributedtask",
                project.organization_url(),
                project.project_id_or_name()
            ),
            pat,
            client,
        })
    }

    fn get(&self, url: String) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            // PAT as Basic password; username can be empty
            .basic_auth("", Some(self.pat.expose_secret()))
    }

    /// All environments of the project, following continuation tokens.
    pub async fn list_environments(&self) -> Result<Vec<EnvironmentInstance>> {
        let mut environments = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let url = format!("{}/environments?api-version={API_VERSION}", self.base_url);
            let mut request = self.get(url);
            if let Some(token) = &continuation {
                request = request.query(&[("continuationToken", token)]);
            }

            let resp = request.send().await?.error_for_status()?;
            continuation = resp
                .headers()
                .get(CONTINUATION_HEADER)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .map(|v| v.to_string());
            let page = resp
                .json::<EnvironmentList>()
                .await
                .context("failed to deserialize environment list")?;
            environments.extend(page.value);

            if continuation.is_none() {
                return Ok(environments);
            }
        }
    }

    /// Fetch an environment with its resource references expanded.
    pub async fn get_environment_with_resources(&self, environment_id: i64) -> Result<EnvironmentInstance> {
        let url = format!(
            "{}/environments/{}?expands=resourceReferences&api-version={API_VERSION}",
            self.base_url, environment_id
        );

        let resp = self
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<EnvironmentInstance>()
            .await?;

        Ok(resp)
    }

    /// Remove a Kubernetes resource reference from an environment.
    pub async fn delete_kubernetes_resource(&self, environment_id: i64, resource_id: i64) -> Result<()> {
        let url = format!(
            "{}/environments/{}/providers/kubernetes/{}?api-version={API_VERSION}",
            self.base_url, environment_id, resource_id
        );

        self.client
            .delete(url)
            .basic_auth("", Some(self.pat.expose_secret()))
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_project_scoped_base_url() {
        let project = AzdoProjectUrl::parse("https://dev.azure.com/fabrikam/DefaultCollection/_git/Fabrikam")
            .unwrap();
        let client = AzdoClient::new(&project, SecretString::from("pat".to_string())).unwrap();
        assert_eq!(
            client.base_url,
            "https://dev.azure.com/fabrikam/DefaultCollection/_apis/distributedtask"
        );

        let project = AzdoProjectUrl::parse("https://fabrikam.visualstudio.com/DefaultCollection").unwrap();
        let client = AzdoClient::new(&project, SecretString::from("pat".to_string())).unwrap();
        assert_eq!(
            client.base_url,
            "https://fabrikam.visualstudio.com/DefaultCollection/_apis/distributedtask"
        );
    }
}
