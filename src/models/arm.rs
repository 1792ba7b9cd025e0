use serde::Deserialize;
use serde_json::Value;

/// Generic ARM resource as returned by list operations.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ArmResource {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub properties: Value,
}

impl ArmResource {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: None,
            properties: Value::Null,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_properties(mut self, properties: Value) -> Self {
        self.properties = properties;
        self
    }

    /// String property addressed by a JSON pointer, e.g. `/powerState/code`.
    pub fn property_str(&self, pointer: &str) -> Option<&str> {
        self.properties.pointer(pointer).and_then(Value::as_str)
    }

    /// Names listed under `properties.capabilities[].name` (Cosmos DB accounts).
    pub fn capabilities(&self) -> impl Iterator<Item = &str> {
        self.properties
            .get("capabilities")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|c| c.get("name").and_then(Value::as_str))
    }
}

// ARM REST: subscription list item
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub subscription_id: String,
    pub display_name: String,
    #[serde(default)]
    pub state: Option<String>,
}

impl Subscription {
    /// The subscription as the root of every resource listing beneath it.
    pub fn as_resource(&self) -> ArmResource {
        ArmResource::new(
            format!("/subscriptions/{}", self.subscription_id),
            self.display_name.clone(),
        )
    }
}

// ARM REST: paged list
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmPage<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(default)]
    pub next_link: Option<String>,
}

// ARM REST: Azure-AsyncOperation status
#[derive(Debug, Deserialize)]
pub struct OperationStatus {
    pub status: String,
    #[serde(default)]
    pub error: Option<Value>,
}

// ARM REST: managedClusters/listClusterAdminCredential
#[derive(Debug, Deserialize)]
pub struct CredentialResults {
    #[serde(default)]
    pub kubeconfigs: Vec<CredentialResult>,
}

#[derive(Debug, Deserialize)]
pub struct CredentialResult {
    pub name: String,
    pub value: String,
}
