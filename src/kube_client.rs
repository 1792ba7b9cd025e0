use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use k8s_openapi::api::core::v1::Namespace;
use kube::{
    Api, Client,
    api::{DeleteParams, ListParams},
    config::{KubeConfigOptions, Kubeconfig},
};
use tokio::sync::Mutex;

use crate::{arm_client::ArmClient, models::arm::CredentialResults};

pub const MANAGED_CLUSTERS_API_VERSION: &str = "2024-02-01";

/// Kubernetes clients for AKS clusters, built from the cluster admin
/// kubeconfig and kept per cluster resource id.
pub struct ClusterClients {
    arm: ArmClient,
    clients: Mutex<HashMap<String, Client>>,
}

impl ClusterClients {
    pub fn new(arm: ArmClient) -> Self {
        Self {
            arm,
            clients: Mutex::new(HashMap::new()),
        }
    }

    async fn client_for(&self, cluster_id: &str) -> Result<Client> {
        if let Some(client) = self.clients.lock().await.get(cluster_id) {
            return Ok(client.clone());
        }

        let credentials: CredentialResults = self
            .arm
            .post_action(cluster_id, "listClusterAdminCredential", MANAGED_CLUSTERS_API_VERSION)
            .await?;
        let kubeconfig = credentials
            .kubeconfigs
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("no admin kubeconfig returned for cluster"))?;
        tracing::trace!(credential = %kubeconfig.name, "Fetched cluster admin configuration");

        let yaml = String::from_utf8(BASE64.decode(kubeconfig.value.as_bytes())?)
            .context("kubeconfig is not valid utf-8")?;
        let kubeconfig = Kubeconfig::from_yaml(&yaml).context("failed to parse kubeconfig")?;
        let config = kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .context("failed to load kubeconfig")?;
        let client = Client::try_from(config).context("failed to build kubernetes client")?;

        self.clients
            .lock()
            .await
            .insert(cluster_id.to_string(), client.clone());
        Ok(client)
    }

    pub async fn list_namespaces(&self, cluster_id: &str) -> Result<Vec<String>> {
        let api: Api<Namespace> = Api::all(self.client_for(cluster_id).await?);
        // label selectors are unreliable here, so list everything and filter by name
        let namespaces = api.list(&ListParams::default()).await?;
        Ok(namespaces
            .items
            .into_iter()
            .filter_map(|ns| ns.metadata.name)
            .collect())
    }

    pub async fn delete_namespace(&self, cluster_id: &str, name: &str) -> Result<()> {
        let api: Api<Namespace> = Api::all(self.client_for(cluster_id).await?);
        api.delete(name, &DeleteParams::default()).await?;
        Ok(())
    }
}
