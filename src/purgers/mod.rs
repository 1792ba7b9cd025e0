pub mod azure;
pub mod devops;
pub mod taxonomy;
pub mod walk;

#[cfg(test)]
pub mod fake;

use std::{collections::BTreeSet, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;

pub use azure::{AzureResourcesPurger, AzureTarget, ResourceBackend};
pub use devops::{DevOpsPurger, DevOpsTarget, ProjectTokens};
pub use taxonomy::{FamilyOptions, ResourceFamily};

/// Candidate name fragments for the review apps of one or more pull requests.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PossibleNames(Arc<BTreeSet<String>>);

impl PossibleNames {
    pub fn from_ids(ids: &[u32]) -> Self {
        let names = ids
            .iter()
            .flat_map(|id| [format!("review-app-{id}"), format!("ra-{id}"), format!("ra{id}")])
            .collect();
        Self(Arc::new(names))
    }

    /// A name matches when it starts or ends with any of the possible names.
    pub fn matches(&self, name: &str) -> bool {
        self.0
            .iter()
            .any(|n| name.ends_with(n.as_str()) || name.starts_with(n.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for PossibleNames {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        f.write_str(&joined.join(","))
    }
}

/// Last segment of an ARM resource id.
pub fn resource_name(id: &str) -> &str {
    id.trim_end_matches('/').rsplit('/').next().unwrap_or(id)
}

/// What a purger works on, plus the names to look for and whether to delete.
#[derive(Debug, Clone)]
pub struct PurgeContext<T> {
    pub resource: T,
    pub possible_names: PossibleNames,
    pub dry_run: bool,
}

impl<T> PurgeContext<T> {
    pub fn new(resource: T, possible_names: PossibleNames, dry_run: bool) -> Self {
        Self {
            resource,
            possible_names,
            dry_run,
        }
    }

    pub fn name_matches(&self, name: &str) -> bool {
        self.possible_names.matches(name)
    }

    /// Same names and dry-run flag, different payload.
    pub fn convert<U>(&self, resource: U) -> PurgeContext<U> {
        PurgeContext {
            resource,
            possible_names: self.possible_names.clone(),
            dry_run: self.dry_run,
        }
    }
}

#[async_trait]
pub trait Purger<T: Send + Sync>: Send + Sync {
    async fn purge(&self, context: &PurgeContext<T>) -> Result<()>;
}
