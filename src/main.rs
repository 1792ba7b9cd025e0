use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{Context, Result, bail};
use azure_cleaner::{
    AzdoProjectUrl, AzureCleaner, CleanupRequest, Config, DelayedQueue,
    api::{self, AppState},
    purgers::ProjectTokens,
};
use clap::{Args, Parser, Subcommand};
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "azure-cleaner",
    version,
    about = "Clean up review app resources in Azure and Azure DevOps when pull requests close"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the webhook service
    Serve,
    /// Clean up the resources of one or more pull requests
    Cleanup(CleanupArgs),
}

#[derive(Args)]
struct CleanupArgs {
    /// Pull request identifier(s)
    #[arg(short = 'p', long = "pull-request", aliases = ["pr", "pull-request-id"], required = true, num_args = 1..)]
    pull_requests: Vec<u32>,

    /// Subscription name(s) or id(s) to search, instead of the configured ones
    #[arg(short = 's', long = "subscription", num_args = 1..)]
    subscriptions: Vec<String>,

    /// Remote URL of the Azure DevOps repository
    #[arg(long, alias = "remote")]
    remote_url: Option<String>,

    /// Azure DevOps project URL
    #[arg(long, alias = "project")]
    project_url: Option<String>,

    /// Token for accessing the Azure DevOps project
    #[arg(long, env = "AZDO_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Log what would be deleted without deleting anything
    #[arg(long)]
    dry_run: bool,
}

impl CleanupArgs {
    fn into_request(self) -> Result<CleanupRequest> {
        let projects = match self.token {
            Some(token) => {
                let Some(url) = self.project_url.as_deref().or(self.remote_url.as_deref()) else {
                    bail!("--token requires --project-url or --remote-url");
                };
                let url = AzdoProjectUrl::parse(url)?;
                Some(ProjectTokens::single(url, SecretString::from(token)))
            }
            None => None,
        };

        Ok(CleanupRequest {
            ids: self.pull_requests,
            subscriptions: (!self.subscriptions.is_empty()).then_some(self.subscriptions),
            projects,
            project_url: self.project_url,
            remote_url: self.remote_url,
            dry_run: self.dry_run,
        })
    }
}

async fn serve(config: Config) -> Result<()> {
    let cleaner = Arc::new(AzureCleaner::from_config(&config.cleaner)?);
    let queue = DelayedQueue::start(cleaner);

    let state = AppState::new(
        Arc::new(queue),
        &config.authentication.credentials,
        Duration::from_secs(config.events.delay_secs),
    );
    let app = api::router(state);

    let addr: SocketAddr = config
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address '{}'", config.bind_addr))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}

async fn cleanup(config: Config, args: CleanupArgs) -> Result<()> {
    let request = args.into_request()?;
    let cleaner = AzureCleaner::from_config(&config.cleaner)?;

    tokio::select! {
        res = cleaner.handle(request) => res,
        _ = tokio::signal::ctrl_c() => bail!("cleanup cancelled"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with env filter, defaulting to debug for this crate if RUST_LOG is unset.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,azure_cleaner=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Serve => serve(config).await,
        Commands::Cleanup(args) => cleanup(config, args).await,
    }
}
