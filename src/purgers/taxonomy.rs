//! Resource kinds the Azure purger knows how to find and delete.
//!
//! Each [`ResourceKind`] says where its instances are listed, under which
//! parents it applies, what else makes it a match and what happens once it
//! matches. [`crate::purgers::walk`] interprets these rules; nothing here talks
//! to Azure.

use crate::{config::CleanerConfig, models::arm::ArmResource, purgers::resource_name};

/// Where the instances of a kind come from.
#[derive(Debug)]
pub enum Source {
    /// ARM collection at `{parent.id}/{path}`.
    Arm {
        path: &'static str,
        api_version: &'static str,
        /// Extra query appended to the DELETE call.
        delete_query: Option<&'static str>,
    },
    /// Namespaces inside an AKS cluster (the parent).
    KubernetesNamespaces,
}

/// What to do with a resource whose name matches.
#[derive(Debug)]
pub enum OnMatch {
    Delete,
    /// Delete every non-protected child of this kind, then the resource.
    DeleteAll(&'static ResourceKind),
    /// Run the child kind's own rules on every child, then delete the resource.
    PurgeFirst(&'static ResourceKind),
}

pub struct ResourceKind {
    pub label: &'static str,
    pub source: Source,
    /// Whether this kind is listed under the given parent.
    pub applies: fn(&ArmResource) -> bool,
    /// Another name that marks the resource as a review app.
    pub related: Option<fn(&ArmResource) -> Option<&str>>,
    /// Names never matched nor deleted.
    pub protected: &'static [&'static str],
    pub on_match: OnMatch,
    pub children: &'static [&'static ResourceKind],
    /// Search children before (and regardless of) matching the resource.
    pub children_first: bool,
}

impl ResourceKind {
    pub fn is_protected(&self, name: &str) -> bool {
        self.protected.contains(&name)
    }

    pub fn related_name<'r>(&self, resource: &'r ArmResource) -> Option<&'r str> {
        self.related.and_then(|related| related(resource))
    }
}

impl std::fmt::Debug for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceKind")
            .field("label", &self.label)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

fn always(_: &ArmResource) -> bool {
    true
}

const fn arm(path: &'static str, api_version: &'static str) -> Source {
    Source::Arm {
        path,
        api_version,
        delete_query: None,
    }
}

const BASE: ResourceKind = ResourceKind {
    label: "",
    source: Source::KubernetesNamespaces,
    applies: always,
    related: None,
    protected: &[],
    on_match: OnMatch::Delete,
    children: &[],
    children_first: false,
};

// resource groups

pub static RESOURCE_GROUPS: ResourceKind = ResourceKind {
    label: "resource group",
    source: arm("resourcegroups", "2022-09-01"),
    ..BASE
};

// kubernetes

fn cluster_running(cluster: &ArmResource) -> bool {
    cluster.property_str("/powerState/code") != Some("Stopped")
}

pub static KUBERNETES_NAMESPACES: ResourceKind = ResourceKind {
    label: "Kubernetes namespace",
    source: Source::KubernetesNamespaces,
    applies: cluster_running,
    ..BASE
};

pub static MANAGED_CLUSTERS: ResourceKind = ResourceKind {
    label: "AKS cluster",
    source: arm(
        "providers/Microsoft.ContainerService/managedClusters",
        crate::kube_client::MANAGED_CLUSTERS_API_VERSION,
    ),
    children: &[&KUBERNETES_NAMESPACES],
    ..BASE
};

// app service

const WEB_API_VERSION: &str = "2023-01-01";
const WEB_DELETE_QUERY: Option<&str> = Some("deleteMetrics=true&deleteEmptyServerFarm=false");

fn server_farm(site: &ArmResource) -> Option<&str> {
    site.property_str("/serverFarmId").map(resource_name)
}

pub static WEB_SITE_SLOTS: ResourceKind = ResourceKind {
    label: "website slot",
    source: Source::Arm {
        path: "slots",
        api_version: WEB_API_VERSION,
        delete_query: WEB_DELETE_QUERY,
    },
    ..BASE
};

pub static WEB_SITES: ResourceKind = ResourceKind {
    label: "website",
    source: Source::Arm {
        path: "providers/Microsoft.Web/sites",
        api_version: WEB_API_VERSION,
        delete_query: WEB_DELETE_QUERY,
    },
    related: Some(server_farm),
    children: &[&WEB_SITE_SLOTS],
    children_first: true,
    ..BASE
};

pub static STATIC_SITE_BUILDS: ResourceKind = ResourceKind {
    label: "static site build",
    source: arm("builds", WEB_API_VERSION),
    ..BASE
};

pub static STATIC_SITES: ResourceKind = ResourceKind {
    label: "static site",
    source: arm("providers/Microsoft.Web/staticSites", WEB_API_VERSION),
    children: &[&STATIC_SITE_BUILDS],
    ..BASE
};

// container apps

const APP_API_VERSION: &str = "2024-03-01";

fn app_environment(app: &ArmResource) -> Option<&str> {
    app.property_str("/managedEnvironmentId")
        .or_else(|| app.property_str("/environmentId"))
        .map(resource_name)
}

fn job_environment(job: &ArmResource) -> Option<&str> {
    job.property_str("/environmentId").map(resource_name)
}

pub static CONTAINER_APPS: ResourceKind = ResourceKind {
    label: "container app",
    source: arm("providers/Microsoft.App/containerApps", APP_API_VERSION),
    related: Some(app_environment),
    ..BASE
};

pub static CONTAINER_APP_JOBS: ResourceKind = ResourceKind {
    label: "container app job",
    source: arm("providers/Microsoft.App/jobs", APP_API_VERSION),
    related: Some(job_environment),
    ..BASE
};

pub static MANAGED_ENVIRONMENTS: ResourceKind = ResourceKind {
    label: "app environment",
    source: arm("providers/Microsoft.App/managedEnvironments", APP_API_VERSION),
    ..BASE
};

// container instances

pub static CONTAINER_GROUPS: ResourceKind = ResourceKind {
    label: "container group",
    source: arm("providers/Microsoft.ContainerInstance/containerGroups", "2023-05-01"),
    ..BASE
};

// cosmos db

const COSMOS_API_VERSION: &str = "2024-05-15";
const CASSANDRA: &str = "EnableCassandra";
const TABLE: &str = "EnableTable";
const GREMLIN: &str = "EnableGremlin";

fn has_capability(account: &ArmResource, capability: &str) -> bool {
    account.capabilities().any(|c| c == capability)
}

fn is_mongo_account(account: &ArmResource) -> bool {
    account.kind.as_deref() == Some("MongoDB")
}

fn is_cassandra_account(account: &ArmResource) -> bool {
    !is_mongo_account(account) && has_capability(account, CASSANDRA)
}

fn is_table_account(account: &ArmResource) -> bool {
    has_capability(account, TABLE)
}

fn is_gremlin_account(account: &ArmResource) -> bool {
    has_capability(account, GREMLIN)
}

fn is_sql_account(account: &ArmResource) -> bool {
    account.kind.as_deref() == Some("GlobalDocumentDB")
        && account
            .capabilities()
            .all(|c| c != CASSANDRA && c != TABLE && c != GREMLIN)
}

pub static COSMOS_MONGO_COLLECTIONS: ResourceKind = ResourceKind {
    label: "CosmosDB for MongoDB collection",
    source: arm("collections", COSMOS_API_VERSION),
    ..BASE
};

pub static COSMOS_MONGO_DATABASES: ResourceKind = ResourceKind {
    label: "CosmosDB for MongoDB database",
    source: arm("mongodbDatabases", COSMOS_API_VERSION),
    applies: is_mongo_account,
    children: &[&COSMOS_MONGO_COLLECTIONS],
    ..BASE
};

pub static COSMOS_CASSANDRA_TABLES: ResourceKind = ResourceKind {
    label: "CosmosDB for Cassandra table",
    source: arm("tables", COSMOS_API_VERSION),
    ..BASE
};

pub static COSMOS_CASSANDRA_KEYSPACES: ResourceKind = ResourceKind {
    label: "CosmosDB for Cassandra keyspace",
    source: arm("cassandraKeyspaces", COSMOS_API_VERSION),
    applies: is_cassandra_account,
    children: &[&COSMOS_CASSANDRA_TABLES],
    ..BASE
};

pub static COSMOS_TABLES: ResourceKind = ResourceKind {
    label: "CosmosDB for Table table",
    source: arm("tables", COSMOS_API_VERSION),
    applies: is_table_account,
    ..BASE
};

pub static COSMOS_GREMLIN_GRAPHS: ResourceKind = ResourceKind {
    label: "CosmosDB for Gremlin graph",
    source: arm("graphs", COSMOS_API_VERSION),
    ..BASE
};

pub static COSMOS_GREMLIN_DATABASES: ResourceKind = ResourceKind {
    label: "CosmosDB for Gremlin database",
    source: arm("gremlinDatabases", COSMOS_API_VERSION),
    applies: is_gremlin_account,
    children: &[&COSMOS_GREMLIN_GRAPHS],
    ..BASE
};

pub static COSMOS_SQL_CONTAINERS: ResourceKind = ResourceKind {
    label: "CosmosDB for NoSQL container",
    source: arm("containers", COSMOS_API_VERSION),
    ..BASE
};

pub static COSMOS_SQL_DATABASES: ResourceKind = ResourceKind {
    label: "CosmosDB for NoSQL database",
    source: arm("sqlDatabases", COSMOS_API_VERSION),
    applies: is_sql_account,
    children: &[&COSMOS_SQL_CONTAINERS],
    ..BASE
};

pub static COSMOS_ACCOUNTS: ResourceKind = ResourceKind {
    label: "CosmosDB account",
    source: arm("providers/Microsoft.DocumentDB/databaseAccounts", COSMOS_API_VERSION),
    children: &[
        &COSMOS_MONGO_DATABASES,
        &COSMOS_CASSANDRA_KEYSPACES,
        &COSMOS_TABLES,
        &COSMOS_GREMLIN_DATABASES,
        &COSMOS_SQL_DATABASES,
    ],
    ..BASE
};

// mysql

const MYSQL_SYSTEM_DATABASES: &[&str] = &["mysql", "sys", "information_schema", "performance_schema"];

pub static MYSQL_DATABASES: ResourceKind = ResourceKind {
    label: "MySQL database",
    source: arm("databases", "2017-12-01"),
    protected: MYSQL_SYSTEM_DATABASES,
    ..BASE
};

pub static MYSQL_SERVERS: ResourceKind = ResourceKind {
    label: "MySQL server",
    source: arm("providers/Microsoft.DBforMySQL/servers", "2017-12-01"),
    on_match: OnMatch::DeleteAll(&MYSQL_DATABASES),
    children: &[&MYSQL_DATABASES],
    ..BASE
};

pub static MYSQL_FLEXIBLE_DATABASES: ResourceKind = ResourceKind {
    label: "MySQL flexible server database",
    source: arm("databases", "2021-05-01"),
    protected: MYSQL_SYSTEM_DATABASES,
    ..BASE
};

pub static MYSQL_FLEXIBLE_SERVERS: ResourceKind = ResourceKind {
    label: "MySQL flexible server",
    source: arm("providers/Microsoft.DBforMySQL/flexibleServers", "2021-05-01"),
    on_match: OnMatch::DeleteAll(&MYSQL_FLEXIBLE_DATABASES),
    children: &[&MYSQL_FLEXIBLE_DATABASES],
    ..BASE
};

// postgresql

const POSTGRESQL_SYSTEM_DATABASES: &[&str] = &["postgres", "azure_maintenance", "azure_sys"];

pub static POSTGRESQL_DATABASES: ResourceKind = ResourceKind {
    label: "PostgreSQL database",
    source: arm("databases", "2017-12-01"),
    protected: POSTGRESQL_SYSTEM_DATABASES,
    ..BASE
};

pub static POSTGRESQL_SERVERS: ResourceKind = ResourceKind {
    label: "PostgreSQL server",
    source: arm("providers/Microsoft.DBforPostgreSQL/servers", "2017-12-01"),
    on_match: OnMatch::DeleteAll(&POSTGRESQL_DATABASES),
    children: &[&POSTGRESQL_DATABASES],
    ..BASE
};

pub static POSTGRESQL_FLEXIBLE_DATABASES: ResourceKind = ResourceKind {
    label: "PostgreSQL flexible server database",
    source: arm("databases", "2022-12-01"),
    protected: POSTGRESQL_SYSTEM_DATABASES,
    ..BASE
};

pub static POSTGRESQL_FLEXIBLE_SERVERS: ResourceKind = ResourceKind {
    label: "PostgreSQL flexible server",
    source: arm("providers/Microsoft.DBforPostgreSQL/flexibleServers", "2022-12-01"),
    on_match: OnMatch::DeleteAll(&POSTGRESQL_FLEXIBLE_DATABASES),
    children: &[&POSTGRESQL_FLEXIBLE_DATABASES],
    ..BASE
};

// sql

const SQL_API_VERSION: &str = "2021-11-01";
const SQL_SYSTEM_DATABASES: &[&str] = &["master"];

pub static SQL_DATABASES: ResourceKind = ResourceKind {
    label: "SQL database",
    source: arm("databases", SQL_API_VERSION),
    protected: SQL_SYSTEM_DATABASES,
    ..BASE
};

pub static SQL_ELASTIC_POOL_DATABASES: ResourceKind = ResourceKind {
    label: "SQL database",
    source: arm("databases", SQL_API_VERSION),
    protected: SQL_SYSTEM_DATABASES,
    ..BASE
};

pub static SQL_ELASTIC_POOLS: ResourceKind = ResourceKind {
    label: "SQL elastic pool",
    source: arm("elasticPools", SQL_API_VERSION),
    on_match: OnMatch::DeleteAll(&SQL_ELASTIC_POOL_DATABASES),
    ..BASE
};

pub static SQL_SERVERS: ResourceKind = ResourceKind {
    label: "SQL Server",
    source: arm("providers/Microsoft.Sql/servers", SQL_API_VERSION),
    on_match: OnMatch::DeleteAll(&SQL_DATABASES),
    children: &[&SQL_ELASTIC_POOLS, &SQL_DATABASES],
    ..BASE
};

pub static SQL_MANAGED_DATABASES: ResourceKind = ResourceKind {
    label: "SQL Managed Instance database",
    source: arm("databases", SQL_API_VERSION),
    protected: SQL_SYSTEM_DATABASES,
    ..BASE
};

pub static SQL_MANAGED_INSTANCES: ResourceKind = ResourceKind {
    label: "SQL Managed Instance",
    source: arm("providers/Microsoft.Sql/managedInstances", SQL_API_VERSION),
    on_match: OnMatch::DeleteAll(&SQL_MANAGED_DATABASES),
    children: &[&SQL_MANAGED_DATABASES],
    ..BASE
};

pub static SQL_POOL_MANAGED_INSTANCES: ResourceKind = ResourceKind {
    label: "SQL Managed Instance",
    source: arm("managedInstances", SQL_API_VERSION),
    on_match: OnMatch::DeleteAll(&SQL_MANAGED_DATABASES),
    children: &[&SQL_MANAGED_DATABASES],
    ..BASE
};

pub static SQL_INSTANCE_POOLS: ResourceKind = ResourceKind {
    label: "SQL Managed Instance Pool",
    source: arm("providers/Microsoft.Sql/instancePools", SQL_API_VERSION),
    on_match: OnMatch::PurgeFirst(&SQL_POOL_MANAGED_INSTANCES),
    children: &[&SQL_POOL_MANAGED_INSTANCES],
    ..BASE
};

// managed identities

const IDENTITY_API_VERSION: &str = "2023-01-31";

pub static FEDERATED_CREDENTIALS: ResourceKind = ResourceKind {
    label: "federated credential",
    source: arm("federatedIdentityCredentials", IDENTITY_API_VERSION),
    ..BASE
};

pub static USER_ASSIGNED_IDENTITIES: ResourceKind = ResourceKind {
    label: "user assigned identity",
    source: arm(
        "providers/Microsoft.ManagedIdentity/userAssignedIdentities",
        IDENTITY_API_VERSION,
    ),
    children: &[&FEDERATED_CREDENTIALS],
    ..BASE
};

/// Configurable groups of resource kinds, in the order they are purged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceFamily {
    ResourceGroups,
    Kubernetes,
    AppService,
    ContainerApps,
    ContainerInstances,
    CosmosDb,
    MySql,
    PostgreSql,
    Sql,
    UserAssignedIdentities,
}

impl ResourceFamily {
    pub const ALL: [ResourceFamily; 10] = [
        ResourceFamily::ResourceGroups,
        ResourceFamily::Kubernetes,
        ResourceFamily::AppService,
        ResourceFamily::ContainerApps,
        ResourceFamily::ContainerInstances,
        ResourceFamily::CosmosDb,
        ResourceFamily::MySql,
        ResourceFamily::PostgreSql,
        ResourceFamily::Sql,
        ResourceFamily::UserAssignedIdentities,
    ];

    /// Top-level kinds, listed directly under a subscription.
    pub fn kinds(self) -> &'static [&'static ResourceKind] {
        match self {
            ResourceFamily::ResourceGroups => RESOURCE_GROUP_KINDS,
            ResourceFamily::Kubernetes => KUBERNETES_KINDS,
            ResourceFamily::AppService => APP_SERVICE_KINDS,
            ResourceFamily::ContainerApps => CONTAINER_APPS_KINDS,
            ResourceFamily::ContainerInstances => CONTAINER_INSTANCES_KINDS,
            ResourceFamily::CosmosDb => COSMOS_DB_KINDS,
            ResourceFamily::MySql => MYSQL_KINDS,
            ResourceFamily::PostgreSql => POSTGRESQL_KINDS,
            ResourceFamily::Sql => SQL_KINDS,
            ResourceFamily::UserAssignedIdentities => IDENTITY_KINDS,
        }
    }
}

static RESOURCE_GROUP_KINDS: &[&ResourceKind] = &[&RESOURCE_GROUPS];
static KUBERNETES_KINDS: &[&ResourceKind] = &[&MANAGED_CLUSTERS];
static APP_SERVICE_KINDS: &[&ResourceKind] = &[&WEB_SITES, &STATIC_SITES];
static CONTAINER_APPS_KINDS: &[&ResourceKind] = &[&CONTAINER_APPS, &CONTAINER_APP_JOBS, &MANAGED_ENVIRONMENTS];
static CONTAINER_INSTANCES_KINDS: &[&ResourceKind] = &[&CONTAINER_GROUPS];
static COSMOS_DB_KINDS: &[&ResourceKind] = &[&COSMOS_ACCOUNTS];
static MYSQL_KINDS: &[&ResourceKind] = &[&MYSQL_SERVERS, &MYSQL_FLEXIBLE_SERVERS];
static POSTGRESQL_KINDS: &[&ResourceKind] = &[&POSTGRESQL_SERVERS, &POSTGRESQL_FLEXIBLE_SERVERS];
static SQL_KINDS: &[&ResourceKind] = &[&SQL_SERVERS, &SQL_MANAGED_INSTANCES, &SQL_INSTANCE_POOLS];
static IDENTITY_KINDS: &[&ResourceKind] = &[&USER_ASSIGNED_IDENTITIES];

impl std::fmt::Display for ResourceFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            ResourceFamily::ResourceGroups => "resource groups",
            ResourceFamily::Kubernetes => "kubernetes",
            ResourceFamily::AppService => "app service",
            ResourceFamily::ContainerApps => "container apps",
            ResourceFamily::ContainerInstances => "container instances",
            ResourceFamily::CosmosDb => "cosmos db",
            ResourceFamily::MySql => "mysql",
            ResourceFamily::PostgreSql => "postgresql",
            ResourceFamily::Sql => "sql",
            ResourceFamily::UserAssignedIdentities => "user assigned identities",
        };
        f.write_str(value)
    }
}

/// Which families are purged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilyOptions {
    pub resource_groups: bool,
    pub kubernetes: bool,
    pub app_service: bool,
    pub container_apps: bool,
    pub container_instances: bool,
    pub cosmos_db: bool,
    pub my_sql: bool,
    pub postgre_sql: bool,
    pub sql: bool,
    pub user_assigned_identities: bool,
}

impl Default for FamilyOptions {
    fn default() -> Self {
        Self {
            resource_groups: true,
            kubernetes: true,
            app_service: true,
            container_apps: true,
            container_instances: true,
            cosmos_db: true,
            my_sql: true,
            postgre_sql: true,
            sql: true,
            user_assigned_identities: true,
        }
    }
}

impl FamilyOptions {
    pub fn is_enabled(&self, family: ResourceFamily) -> bool {
        match family {
            ResourceFamily::ResourceGroups => self.resource_groups,
            ResourceFamily::Kubernetes => self.kubernetes,
            ResourceFamily::AppService => self.app_service,
            ResourceFamily::ContainerApps => self.container_apps,
            ResourceFamily::ContainerInstances => self.container_instances,
            ResourceFamily::CosmosDb => self.cosmos_db,
            ResourceFamily::MySql => self.my_sql,
            ResourceFamily::PostgreSql => self.postgre_sql,
            ResourceFamily::Sql => self.sql,
            ResourceFamily::UserAssignedIdentities => self.user_assigned_identities,
        }
    }

    pub fn enabled(&self) -> Vec<ResourceFamily> {
        ResourceFamily::ALL
            .into_iter()
            .filter(|family| self.is_enabled(*family))
            .collect()
    }
}

impl From<&CleanerConfig> for FamilyOptions {
    fn from(config: &CleanerConfig) -> Self {
        Self {
            resource_groups: config.azure_resource_groups,
            kubernetes: config.azure_kubernetes,
            app_service: config.azure_app_service,
            container_apps: config.azure_container_apps,
            container_instances: config.azure_container_instances,
            cosmos_db: config.azure_cosmos_db,
            my_sql: config.azure_my_sql,
            postgre_sql: config.azure_postgre_sql,
            sql: config.azure_sql,
            user_assigned_identities: config.user_assigned_identities,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn account(kind: &str, capabilities: &[&str]) -> ArmResource {
        let capabilities: Vec<_> = capabilities.iter().map(|c| json!({ "name": c })).collect();
        ArmResource::new("/acc", "acc")
            .with_kind(kind)
            .with_properties(json!({ "capabilities": capabilities }))
    }

    fn applicable(parent: &ArmResource) -> Vec<&'static str> {
        COSMOS_ACCOUNTS
            .children
            .iter()
            .filter(|kind| (kind.applies)(parent))
            .filter_map(|kind| match kind.source {
                Source::Arm { path, .. } => Some(path),
                Source::KubernetesNamespaces => None,
            })
            .collect()
    }

    #[test]
    fn cosmos_children_follow_account_api() {
        assert_eq!(applicable(&account("MongoDB", &[])), vec!["mongodbDatabases"]);
        assert_eq!(applicable(&account("GlobalDocumentDB", &[])), vec!["sqlDatabases"]);
        assert_eq!(
            applicable(&account("GlobalDocumentDB", &["EnableCassandra"])),
            vec!["cassandraKeyspaces"]
        );
        assert_eq!(
            applicable(&account("GlobalDocumentDB", &["EnableTable", "EnableServerless"])),
            vec!["tables"]
        );
        assert_eq!(
            applicable(&account("GlobalDocumentDB", &["EnableGremlin"])),
            vec!["gremlinDatabases"]
        );
    }

    #[test]
    fn namespaces_only_for_running_clusters() {
        let running = ArmResource::new("/aks", "aks").with_properties(json!({ "powerState": { "code": "Running" } }));
        let stopped = ArmResource::new("/aks", "aks").with_properties(json!({ "powerState": { "code": "Stopped" } }));
        assert!((KUBERNETES_NAMESPACES.applies)(&running));
        assert!(!(KUBERNETES_NAMESPACES.applies)(&stopped));
        assert!((KUBERNETES_NAMESPACES.applies)(&ArmResource::new("/aks", "aks")));
    }

    #[test]
    fn related_names_use_last_segment() {
        let site = ArmResource::new("/sites/fabrikam", "fabrikam").with_properties(json!({
            "serverFarmId": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Web/serverfarms/plan-ra-1"
        }));
        assert_eq!(WEB_SITES.related_name(&site), Some("plan-ra-1"));

        let app = ArmResource::new("/apps/fabrikam", "fabrikam").with_properties(json!({
            "environmentId": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.App/managedEnvironments/env-ra-1"
        }));
        assert_eq!(CONTAINER_APPS.related_name(&app), Some("env-ra-1"));
        assert_eq!(CONTAINER_APP_JOBS.related_name(&app), Some("env-ra-1"));
        assert_eq!(MANAGED_ENVIRONMENTS.related_name(&app), None);
    }

    #[test]
    fn system_databases_are_protected() {
        assert!(SQL_DATABASES.is_protected("master"));
        assert!(SQL_MANAGED_DATABASES.is_protected("master"));
        assert!(MYSQL_FLEXIBLE_DATABASES.is_protected("performance_schema"));
        assert!(POSTGRESQL_DATABASES.is_protected("azure_sys"));
        assert!(!SQL_DATABASES.is_protected("ra-1"));
    }

    #[test]
    fn families_honour_options_and_order() {
        assert_eq!(FamilyOptions::default().enabled(), ResourceFamily::ALL.to_vec());

        let options = FamilyOptions {
            kubernetes: false,
            sql: false,
            ..FamilyOptions::default()
        };
        let enabled = options.enabled();
        assert_eq!(enabled.len(), 8);
        assert_eq!(enabled.first(), Some(&ResourceFamily::ResourceGroups));
        assert_eq!(enabled.last(), Some(&ResourceFamily::UserAssignedIdentities));
        assert!(!enabled.contains(&ResourceFamily::Sql));
    }
}
