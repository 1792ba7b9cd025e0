use anyhow::Result;
use futures::{FutureExt, future::BoxFuture};

use super::{
    PurgeContext,
    azure::ResourceBackend,
    taxonomy::{OnMatch, ResourceFamily, ResourceKind},
};
use crate::models::arm::{ArmResource, Subscription};

/// Applies the [`ResourceKind`] rules of a family to one subscription.
pub struct Walker<'a> {
    backend: &'a dyn ResourceBackend,
    context: &'a PurgeContext<Subscription>,
}

impl<'a> Walker<'a> {
    pub fn new(backend: &'a dyn ResourceBackend, context: &'a PurgeContext<Subscription>) -> Self {
        Self { backend, context }
    }

    /// Returns how many resources were deleted (or would be, in a dry run).
    pub async fn purge_family(&self, family: ResourceFamily) -> Result<usize> {
        let root = self.context.resource.as_resource();
        let mut deleted = 0;
        for kind in family.kinds() {
            deleted += self.purge_kind(&root, kind).await?;
        }
        Ok(deleted)
    }

    fn purge_kind<'s>(
        &'s self,
        parent: &'s ArmResource,
        kind: &'static ResourceKind,
    ) -> BoxFuture<'s, Result<usize>> {
        async move {
            if !(kind.applies)(parent) {
                return Ok(0);
            }

            let resources = self.backend.list(parent, kind).await?;
            tracing::trace!(
                kind = kind.label,
                parent = %parent.name,
                count = resources.len(),
                "Looking for {} possible names ({})",
                self.context.possible_names.len(),
                self.context.possible_names
            );

            let mut deleted = 0;
            for resource in &resources {
                deleted += self.visit(resource, kind).await?;
            }
            Ok(deleted)
        }
        .boxed()
    }

    async fn visit(&self, resource: &ArmResource, kind: &'static ResourceKind) -> Result<usize> {
        let mut deleted = 0;
        if kind.children_first {
            deleted += self.purge_children(resource, kind).await?;
        }

        if self.matches(resource, kind) {
            deleted += self.purge_matched(resource, kind).await?;
            // nothing more below a deleted resource
            return Ok(deleted);
        }

        if !kind.children_first {
            deleted += self.purge_children(resource, kind).await?;
        }
        Ok(deleted)
    }

    async fn purge_children(&self, resource: &ArmResource, kind: &'static ResourceKind) -> Result<usize> {
        let mut deleted = 0;
        for child in kind.children {
            deleted += self.purge_kind(resource, child).await?;
        }
        Ok(deleted)
    }

    async fn purge_matched(&self, resource: &ArmResource, kind: &'static ResourceKind) -> Result<usize> {
        let mut deleted = 0;
        match kind.on_match {
            OnMatch::Delete => {}
            OnMatch::DeleteAll(child) => {
                tracing::info!(resource_id = %resource.id, "Deleting {}s for {} '{}'", child.label, kind.label, resource.name);
                for item in self.backend.list(resource, child).await? {
                    if child.is_protected(&item.name) {
                        continue;
                    }
                    self.delete(&item, child).await?;
                    deleted += 1;
                }
            }
            OnMatch::PurgeFirst(child) => {
                deleted += self.purge_kind(resource, child).await?;
            }
        }

        self.delete(resource, kind).await?;
        Ok(deleted + 1)
    }

    fn matches(&self, resource: &ArmResource, kind: &ResourceKind) -> bool {
        if kind.is_protected(&resource.name) {
            return false;
        }
        self.context.name_matches(&resource.name)
            || kind
                .related_name(resource)
                .is_some_and(|related| self.context.name_matches(related))
    }

    async fn delete(&self, resource: &ArmResource, kind: &ResourceKind) -> Result<()> {
        if self.context.dry_run {
            tracing::info!(
                resource_id = %resource.id,
                "Deleting {} '{}' at '{}' (dry run)",
                kind.label,
                resource.name,
                resource.id
            );
            return Ok(());
        }

        tracing::info!(
            resource_id = %resource.id,
            "Deleting {} '{}' at '{}'",
            kind.label,
            resource.name,
            resource.id
        );
        self.backend.delete(resource, kind).await
    }
}
