use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use anyhow::{Result, bail};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

use super::{PurgeContext, Purger};
use crate::{
    azdo_client::AzdoClient,
    models::azdo::EnvironmentInstance,
    project_url::AzdoProjectUrl,
};

const CONNECTION_TTL: Duration = Duration::from_secs(60 * 60);

/// Access tokens per Azure DevOps project, keyed by the normalized project URL.
#[derive(Debug, Default)]
pub struct ProjectTokens(HashMap<AzdoProjectUrl, SecretString>);

impl ProjectTokens {
    /// Parse `"<project url>;<token>"` entries.
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> Result<Self> {
        let mut tokens = HashMap::new();
        for entry in entries {
            let entry = entry.as_ref().trim();
            if entry.is_empty() {
                continue;
            }
            let Some((url, token)) = entry.split_once(';') else {
                bail!("project entry must be in the form '<url>;<token>'");
            };
            let url = AzdoProjectUrl::parse(url)?;
            if tokens.contains_key(&url) {
                bail!("project '{url}' is configured more than once");
            }
            tokens.insert(url, SecretString::from(token.trim().to_string()));
        }
        Ok(Self(tokens))
    }

    pub fn single(url: AzdoProjectUrl, token: SecretString) -> Self {
        Self(HashMap::from([(url, token)]))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn get(&self, raw_url: Option<&str>) -> Option<(AzdoProjectUrl, &SecretString)> {
        let url = AzdoProjectUrl::parse(raw_url?).ok()?;
        let token = self.0.get(&url)?;
        Some((url, token))
    }

    /// Look up the project URL first, then the remote URL.
    pub fn resolve(
        &self,
        project_url: Option<&str>,
        remote_url: Option<&str>,
    ) -> Option<(AzdoProjectUrl, &SecretString)> {
        self.get(project_url).or_else(|| self.get(remote_url))
    }
}

/// Where to look for environment resources in Azure DevOps.
#[derive(Debug, Clone, Default)]
pub struct DevOpsTarget {
    pub projects: Arc<ProjectTokens>,
    pub project_url: Option<String>,
    pub remote_url: Option<String>,
}

/// The environment endpoints the purger needs.
#[async_trait]
pub trait EnvironmentsApi: Send + Sync {
    async fn list_environments(&self) -> Result<Vec<EnvironmentInstance>>;
    async fn get_environment_with_resources(&self, environment_id: i64) -> Result<EnvironmentInstance>;
    async fn delete_kubernetes_resource(&self, environment_id: i64, resource_id: i64) -> Result<()>;
}

#[async_trait]
impl EnvironmentsApi for AzdoClient {
    async fn list_environments(&self) -> Result<Vec<EnvironmentInstance>> {
        AzdoClient::list_environments(self).await
    }

    async fn get_environment_with_resources(&self, environment_id: i64) -> Result<EnvironmentInstance> {
        AzdoClient::get_environment_with_resources(self, environment_id).await
    }

    async fn delete_kubernetes_resource(&self, environment_id: i64, resource_id: i64) -> Result<()> {
        AzdoClient::delete_kubernetes_resource(self, environment_id, resource_id).await
    }
}

/// Builds the client for a project from its access token.
pub type Connector =
    Box<dyn Fn(&AzdoProjectUrl, SecretString) -> Result<Arc<dyn EnvironmentsApi>> + Send + Sync>;

/// Deletes matching resource references from the deployment environments of
/// the project that raised the event.
pub struct DevOpsPurger {
    connections: Mutex<HashMap<String, (Instant, Arc<dyn EnvironmentsApi>)>>,
    ttl: Duration,
    connect: Connector,
}

impl Default for DevOpsPurger {
    fn default() -> Self {
        Self::with_ttl(CONNECTION_TTL)
    }
}

impl DevOpsPurger {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self::with_connector(
            ttl,
            Box::new(|url: &AzdoProjectUrl, token: SecretString| {
                let client: Arc<dyn EnvironmentsApi> = Arc::new(AzdoClient::new(url, token)?);
                Ok(client)
            }),
        )
    }

    pub fn with_connector(ttl: Duration, connect: Connector) -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
            ttl,
            connect,
        }
    }

    fn connection(&self, url: &AzdoProjectUrl, token: &SecretString) -> Result<Arc<dyn EnvironmentsApi>> {
        // hashed so the token never appears in the key, includes it so a new token means a new client
        let digest = Sha256::digest(format!("{url}{}", token.expose_secret()).as_bytes());
        let key = format!("vss_connections:{}", hex::encode_upper(digest));

        let mut connections = self.connections.lock().unwrap_or_else(|e| e.into_inner());
        connections.retain(|_, (created, _)| created.elapsed() < self.ttl);
        if let Some((_, client)) = connections.get(&key) {
            return Ok(client.clone());
        }

        let token = SecretString::from(token.expose_secret().to_string());
        let client = (self.connect)(url, token)?;
        connections.insert(key, (Instant::now(), client.clone()));
        Ok(client)
    }
}

#[async_trait]
impl Purger<DevOpsTarget> for DevOpsPurger {
    async fn purge(&self, context: &PurgeContext<DevOpsTarget>) -> Result<()> {
        let target = &context.resource;
        if target.project_url.is_none() && target.remote_url.is_none() {
            tracing::trace!("No Azure DevOps URLs provided. Skipping ...");
            return Ok(());
        }

        let Some((url, token)) = target
            .projects
            .resolve(target.project_url.as_deref(), target.remote_url.as_deref())
        else {
            tracing::warn!(
                project_url = target.project_url.as_deref(),
                remote_url = target.remote_url.as_deref(),
                "Project is not configured or does not have a token."
            );
            return Ok(());
        };

        let client = self.connection(&url, token)?;
        let deleted = purge_project(client.as_ref(), &url, context).await?;
        tracing::debug!(deleted, "Purged environment resources in '{}'", url);
        Ok(())
    }
}

/// Walk every environment of a project and remove the matching resources.
pub async fn purge_project<T>(
    api: &dyn EnvironmentsApi,
    url: &AzdoProjectUrl,
    context: &PurgeContext<T>,
) -> Result<usize> {
    let mut deleted = 0;
    for env in api.list_environments().await? {
        let environment = api.get_environment_with_resources(env.id).await?;
        tracing::trace!(
            project = url.project_id_or_name(),
            environment = %environment.name,
            count = environment.resources.len(),
            "Found resources in environment"
        );

        for resource in &environment.resources {
            if !context.name_matches(&resource.name) {
                continue;
            }

            if context.dry_run {
                tracing::info!(
                    "Deleting resource '{}/{}' in '{}' (dry run)",
                    environment.name,
                    resource.name,
                    url
                );
            } else {
                tracing::info!("Deleting resource '{}/{}' in '{}'", environment.name, resource.name, url);
                api.delete_kubernetes_resource(environment.id, resource.id).await?;
            }
            deleted += 1;
        }
    }
    Ok(deleted)
}
