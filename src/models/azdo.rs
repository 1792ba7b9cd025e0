use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Service hook event types this service knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AzdoEventType {
    #[serde(rename = "git.push")]
    GitPush,
    #[serde(rename = "git.pullrequest.updated")]
    GitPullRequestUpdated,
    #[serde(rename = "git.pullrequest.merged")]
    GitPullRequestMerged,
    #[serde(rename = "ms.vss-code.git-pullrequest-comment-event")]
    GitPullRequestCommentEvent,
}

impl std::fmt::Display for AzdoEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            AzdoEventType::GitPush => "git.push",
            AzdoEventType::GitPullRequestUpdated => "git.pullrequest.updated",
            AzdoEventType::GitPullRequestMerged => "git.pullrequest.merged",
            AzdoEventType::GitPullRequestCommentEvent => "ms.vss-code.git-pullrequest-comment-event",
        };
        f.write_str(value)
    }
}

// Azure DevOps service hook envelope. Required fields are optional here so that
// missing ones can be reported together instead of failing on the first.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzdoEvent {
    #[serde(default)]
    pub subscription_id: Option<String>,
    #[serde(default)]
    pub notification_id: Option<i64>,
    #[serde(default)]
    pub event_type: Option<AzdoEventType>,
    #[serde(default)]
    pub resource: Option<Value>,
}

// git.pullrequest.updated resource (minimal)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzdoPullRequestResource {
    pub pull_request_id: u32,
    pub status: String,
    #[serde(default)]
    pub repository: Option<AzdoRepository>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzdoRepository {
    #[serde(default)]
    pub project: Option<AzdoRepositoryProject>,
    #[serde(default)]
    pub remote_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AzdoRepositoryProject {
    #[serde(default)]
    pub url: Option<String>,
}

// Azure DevOps REST: environment list
#[derive(Debug, Deserialize)]
pub struct EnvironmentList {
    #[serde(default)]
    pub value: Vec<EnvironmentInstance>,
}

// Azure DevOps REST: environment (optionally with resource references)
#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentInstance {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub resources: Vec<EnvironmentResourceReference>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentResourceReference {
    pub id: i64,
    pub name: String,
    #[serde(default, rename = "type")]
    pub resource_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pull_request_updated_event() {
        let event: AzdoEvent = serde_json::from_str(crate::test_samples::PULL_REQUEST_UPDATED).unwrap();
        assert_eq!(event.event_type, Some(AzdoEventType::GitPullRequestUpdated));
        assert_eq!(event.notification_id, Some(21));

        let resource: AzdoPullRequestResource = serde_json::from_value(event.resource.unwrap()).unwrap();
        assert_eq!(resource.pull_request_id, 1);
        assert_eq!(resource.status, "completed");
        let repository = resource.repository.unwrap();
        assert_eq!(
            repository.remote_url.as_deref(),
            Some("https://dev.azure.com/fabrikam/DefaultCollection/_git/Fabrikam")
        );
    }

    #[test]
    fn rejects_unknown_event_types() {
        let res = serde_json::from_str::<AzdoEvent>(r#"{"eventType":"build.complete"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn parses_environment_with_resources() {
        let env: EnvironmentInstance = serde_json::from_str(
            r#"{"id":3,"name":"review","resources":[{"id":7,"name":"ra-1","type":"kubernetes"}]}"#,
        )
        .unwrap();
        assert_eq!(env.resources.len(), 1);
        assert_eq!(env.resources[0].resource_type.as_deref(), Some("kubernetes"));
    }
}
