//! In-memory resource backend for testing

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use anyhow::Result;
use async_trait::async_trait;

use super::{
    azure::ResourceBackend,
    taxonomy::{ResourceKind, Source},
};
use crate::models::arm::{ArmResource, Subscription};

/// Resource `{parent}/{segment}/{name}`.
pub fn child(parent: &str, segment: &str, name: &str) -> ArmResource {
    ArmResource::new(format!("{parent}/{segment}/{name}"), name)
}

fn collection(kind: &ResourceKind) -> &'static str {
    match kind.source {
        Source::Arm { path, .. } => path,
        Source::KubernetesNamespaces => "namespaces",
    }
}

#[derive(Default)]
struct FakeState {
    listed: Vec<String>,
    deleted: Vec<ArmResource>,
}

/// Serves canned listings keyed by `{parent.id}/{collection}` and records
/// every listing and delete.
#[derive(Clone, Default)]
pub struct FakeBackend {
    subscriptions: Vec<Subscription>,
    listings: HashMap<String, Vec<ArmResource>>,
    state: Arc<Mutex<FakeState>>,
}

impl FakeBackend {
    pub fn with_subscription(mut self, subscription_id: &str, display_name: &str) -> Self {
        self.subscriptions.push(Subscription {
            subscription_id: subscription_id.to_string(),
            display_name: display_name.to_string(),
            state: Some("Enabled".to_string()),
        });
        self
    }

    pub fn with(mut self, parent_id: &str, kind: &ResourceKind, resources: Vec<ArmResource>) -> Self {
        self.listings
            .insert(format!("{parent_id}/{}", collection(kind)), resources);
        self
    }

    pub fn listed(&self) -> Vec<String> {
        self.state.lock().unwrap().listed.clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .deleted
            .iter()
            .map(|r| r.id.clone())
            .collect()
    }

    pub fn deleted_names(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .deleted
            .iter()
            .map(|r| r.name.clone())
            .collect()
    }
}

#[async_trait]
impl ResourceBackend for FakeBackend {
    async fn subscriptions(&self) -> Result<Vec<Subscription>> {
        Ok(self.subscriptions.clone())
    }

    async fn list(&self, parent: &ArmResource, kind: &ResourceKind) -> Result<Vec<ArmResource>> {
        let key = format!("{}/{}", parent.id, collection(kind));
        let resources = self.listings.get(&key).cloned().unwrap_or_default();
        self.state.lock().unwrap().listed.push(key);
        Ok(resources)
    }

    async fn delete(&self, resource: &ArmResource, _kind: &ResourceKind) -> Result<()> {
        self.state.lock().unwrap().deleted.push(resource.clone());
        Ok(())
    }
}
