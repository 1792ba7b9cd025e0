use std::sync::Arc;

use anyhow::{Context, Result};

use crate::{
    arm_client::ArmClient,
    config::CleanerConfig,
    credential::AzureCredential,
    purgers::{
        AzureResourcesPurger, AzureTarget, DevOpsPurger, DevOpsTarget, FamilyOptions, PossibleNames,
        ProjectTokens, PurgeContext, Purger, azure::AzureBackend,
    },
};

/// One cleanup pass. Overrides left empty fall back to configuration.
#[derive(Debug, Default)]
pub struct CleanupRequest {
    pub ids: Vec<u32>,
    pub subscriptions: Option<Vec<String>>,
    pub projects: Option<ProjectTokens>,
    pub project_url: Option<String>,
    pub remote_url: Option<String>,
    pub dry_run: bool,
}

/// Runs the DevOps purger and then the Azure purger for the review apps of
/// the requested pull requests.
pub struct AzureCleaner {
    devops: Arc<dyn Purger<DevOpsTarget>>,
    azure: Arc<dyn Purger<AzureTarget>>,
    projects: Arc<ProjectTokens>,
    subscriptions: Vec<String>,
    families: FamilyOptions,
}

impl AzureCleaner {
    pub fn new(
        config: &CleanerConfig,
        devops: Arc<dyn Purger<DevOpsTarget>>,
        azure: Arc<dyn Purger<AzureTarget>>,
    ) -> Result<Self> {
        let projects =
            ProjectTokens::parse(&config.azdo_projects).context("Invalid entry in cleaner.azdo_projects")?;
        Ok(Self {
            devops,
            azure,
            projects: Arc::new(projects),
            subscriptions: config.subscriptions.clone(),
            families: FamilyOptions::from(config),
        })
    }

    /// Wire the real Azure DevOps and Azure Resource Manager purgers.
    pub fn from_config(config: &CleanerConfig) -> Result<Self> {
        let credential = Arc::new(AzureCredential::from_env()?);
        let backend = Arc::new(AzureBackend::new(ArmClient::new(credential)?));
        Self::new(
            config,
            Arc::new(DevOpsPurger::default()),
            Arc::new(AzureResourcesPurger::new(backend)),
        )
    }

    pub async fn handle(&self, request: CleanupRequest) -> Result<()> {
        if request.ids.is_empty() {
            tracing::warn!("No pull request ids to clean up");
            return Ok(());
        }

        let names = PossibleNames::from_ids(&request.ids);
        tracing::info!(
            ids = ?request.ids,
            dry_run = request.dry_run,
            "Cleaning up review apps named {}",
            names
        );
        let context = PurgeContext::new((), names, request.dry_run);

        let devops = context.convert(DevOpsTarget {
            projects: request
                .projects
                .map(Arc::new)
                .unwrap_or_else(|| self.projects.clone()),
            project_url: request.project_url,
            remote_url: request.remote_url,
        });
        self.devops.purge(&devops).await?;

        let azure = context.convert(AzureTarget {
            subscriptions: request
                .subscriptions
                .unwrap_or_else(|| self.subscriptions.clone()),
            families: self.families,
        });
        self.azure.purge(&azure).await
    }
}
