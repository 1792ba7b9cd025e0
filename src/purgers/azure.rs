use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;

use super::{
    PurgeContext, Purger,
    taxonomy::{FamilyOptions, ResourceKind, Source},
    walk::Walker,
};
use crate::{
    arm_client::ArmClient,
    kube_client::ClusterClients,
    models::arm::{ArmResource, Subscription},
};

/// Listing and deletion of the resources described by [`ResourceKind`].
#[async_trait]
pub trait ResourceBackend: Send + Sync {
    async fn subscriptions(&self) -> Result<Vec<Subscription>>;
    async fn list(&self, parent: &ArmResource, kind: &ResourceKind) -> Result<Vec<ArmResource>>;
    async fn delete(&self, resource: &ArmResource, kind: &ResourceKind) -> Result<()>;
}

/// Backend talking to Azure Resource Manager and, for namespaces, to the
/// Kubernetes API of each AKS cluster.
pub struct AzureBackend {
    arm: ArmClient,
    clusters: ClusterClients,
}

const NAMESPACES_SEGMENT: &str = "/namespaces/";

impl AzureBackend {
    pub fn new(arm: ArmClient) -> Self {
        Self {
            clusters: ClusterClients::new(arm.clone()),
            arm,
        }
    }
}

#[async_trait]
impl ResourceBackend for AzureBackend {
    async fn subscriptions(&self) -> Result<Vec<Subscription>> {
        self.arm.list_subscriptions().await
    }

    async fn list(&self, parent: &ArmResource, kind: &ResourceKind) -> Result<Vec<ArmResource>> {
        match kind.source {
            Source::Arm { path, api_version, .. } => self
                .arm
                .list(&format!("{}/{}", parent.id, path), api_version)
                .await
                .with_context(|| format!("failed to list {}s", kind.label)),
            Source::KubernetesNamespaces => {
                let names = self.clusters.list_namespaces(&parent.id).await?;
                Ok(names
                    .into_iter()
                    .map(|name| ArmResource::new(format!("{}{NAMESPACES_SEGMENT}{name}", parent.id), name))
                    .collect())
            }
        }
    }

    async fn delete(&self, resource: &ArmResource, kind: &ResourceKind) -> Result<()> {
        match kind.source {
            Source::Arm {
                api_version,
                delete_query,
                ..
            } => self.arm.delete(&resource.id, api_version, delete_query).await,
            Source::KubernetesNamespaces => {
                let (cluster_id, name) = resource
                    .id
                    .rsplit_once(NAMESPACES_SEGMENT)
                    .ok_or_else(|| anyhow!("'{}' is not a namespace id", resource.id))?;
                self.clusters.delete_namespace(cluster_id, name).await
            }
        }
    }
}

/// Subscriptions to search (empty for all) and the families to purge in each.
#[derive(Debug, Clone, Default)]
pub struct AzureTarget {
    pub subscriptions: Vec<String>,
    pub families: FamilyOptions,
}

impl AzureTarget {
    fn includes(&self, subscription: &Subscription) -> bool {
        self.subscriptions.is_empty()
            || self.subscriptions.iter().any(|s| {
                s.eq_ignore_ascii_case(&subscription.subscription_id)
                    || s.eq_ignore_ascii_case(&subscription.display_name)
            })
    }
}

pub struct AzureResourcesPurger {
    backend: Arc<dyn ResourceBackend>,
}

impl AzureResourcesPurger {
    pub fn new(backend: Arc<dyn ResourceBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Purger<AzureTarget> for AzureResourcesPurger {
    async fn purge(&self, context: &PurgeContext<AzureTarget>) -> Result<()> {
        let target = &context.resource;
        let families = target.families.enabled();

        tracing::debug!("Finding azure subscriptions ...");
        for subscription in self.backend.subscriptions().await? {
            // no subscription ids in logs
            if !target.includes(&subscription) {
                tracing::debug!("Skipping subscription '{}' ...", subscription.display_name);
                continue;
            }

            tracing::debug!("Searching in subscription '{}' ...", subscription.display_name);
            let name = subscription.display_name.clone();
            let context = context.convert(subscription);
            let walker = Walker::new(self.backend.as_ref(), &context);
            for family in &families {
                let deleted = walker.purge_family(*family).await?;
                if deleted > 0 {
                    tracing::debug!(family = %family, deleted, "Purged resources in subscription '{}'", name);
                }
            }
        }
        Ok(())
    }
}
