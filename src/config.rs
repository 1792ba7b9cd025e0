use std::collections::HashMap;

use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub cleaner: CleanerConfig,
    #[serde(default)]
    pub authentication: AuthenticationConfig,
    #[serde(default)]
    pub events: EventsConfig,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

/// What gets cleaned: projects with their tokens, subscriptions and the
/// resource families to look at.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CleanerConfig {
    // "<project url>;<token>" entries
    pub azdo_projects: Vec<String>,
    // subscription ids or names; empty means every visible subscription
    pub subscriptions: Vec<String>,
    pub azure_resource_groups: bool,
    pub azure_kubernetes: bool,
    pub azure_app_service: bool,
    pub azure_container_apps: bool,
    pub azure_container_instances: bool,
    pub azure_cosmos_db: bool,
    pub azure_my_sql: bool,
    pub azure_postgre_sql: bool,
    pub azure_sql: bool,
    pub user_assigned_identities: bool,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            azdo_projects: Vec::new(),
            subscriptions: Vec::new(),
            azure_resource_groups: true,
            azure_kubernetes: true,
            azure_app_service: true,
            azure_container_apps: true,
            azure_container_instances: true,
            azure_cosmos_db: true,
            azure_my_sql: true,
            azure_postgre_sql: true,
            azure_sql: true,
            user_assigned_identities: true,
        }
    }
}

/// Basic auth users allowed to call the webhook (`username -> password`).
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthenticationConfig {
    #[serde(default)]
    pub credentials: HashMap<String, String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EventsConfig {
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            delay_secs: default_delay_secs(),
        }
    }
}

fn default_delay_secs() -> u64 {
    60
}

impl Config {
    pub fn load() -> Result<Self> {
        // optional, real deployments pass plain environment variables
        let _ = dotenvy::from_filename(".env.local");

        Self::from_source(
            Environment::default()
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("cleaner.azdo_projects")
                .with_list_parse_key("cleaner.subscriptions"),
        )
    }

    fn from_source(source: Environment) -> Result<Self> {
        let config = ConfigBuilder::builder()
            .add_source(source)
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let source = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<config::Map<String, String>>();
        Environment::default()
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("cleaner.azdo_projects")
            .with_list_parse_key("cleaner.subscriptions")
            .source(Some(source))
    }

    #[test]
    fn defaults_enable_everything() {
        let config = Config::from_source(env(&[])).unwrap();
        assert!(config.cleaner.azdo_projects.is_empty());
        assert!(config.cleaner.subscriptions.is_empty());
        assert!(config.cleaner.azure_sql);
        assert!(config.cleaner.user_assigned_identities);
        assert_eq!(config.events.delay_secs, 60);
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert!(config.authentication.credentials.is_empty());
    }

    #[test]
    fn reads_nested_environment_variables() {
        let config = Config::from_source(env(&[
            (
                "CLEANER__AZDO_PROJECTS",
                "https://dev.azure.com/fabrikam/DefaultCollection;pat-1,https://dev.azure.com/fabrikam/Other;pat-2",
            ),
            ("CLEANER__SUBSCRIPTIONS", "FABRIKAM,Development"),
            ("CLEANER__AZURE_KUBERNETES", "false"),
            ("AUTHENTICATION__CREDENTIALS__VSTS", "burrito"),
            ("EVENTS__DELAY_SECS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.cleaner.azdo_projects.len(), 2);
        assert_eq!(config.cleaner.subscriptions, vec!["FABRIKAM", "Development"]);
        assert!(!config.cleaner.azure_kubernetes);
        assert!(config.cleaner.azure_app_service);
        assert_eq!(config.authentication.credentials.get("vsts").map(String::as_str), Some("burrito"));
        assert_eq!(config.events.delay_secs, 5);
    }

    #[test]
    fn keeps_numeric_looking_strings_verbatim() {
        let config = Config::from_source(env(&[
            ("CLEANER__SUBSCRIPTIONS", "2024"),
            ("AUTHENTICATION__CREDENTIALS__VSTS", "0123"),
        ]))
        .unwrap();

        assert_eq!(config.cleaner.subscriptions, vec!["2024"]);
        assert_eq!(config.authentication.credentials.get("vsts").map(String::as_str), Some("0123"));
    }
}
