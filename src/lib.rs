pub mod api;
pub mod arm_client;
pub mod azdo_client;
pub mod cleaner;
pub mod config;
pub mod credential;
pub mod events;
pub mod kube_client;
pub mod models;
pub mod project_url;
pub mod purgers;

#[cfg(test)]
mod test_samples;

pub use cleaner::{AzureCleaner, CleanupRequest};
pub use config::Config;
pub use events::{AzdoCleanupEvent, DelayedQueue, EventPublisher};
pub use project_url::AzdoProjectUrl;
