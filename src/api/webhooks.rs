use std::collections::BTreeMap;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use super::AppState;
use crate::{
    events::AzdoCleanupEvent,
    models::azdo::{AzdoEvent, AzdoEventType, AzdoPullRequestResource},
};

const CLOSING_STATUSES: [&str; 3] = ["completed", "abandoned", "draft"];

/// RFC 9457 problem details listing the invalid fields of a request.
#[derive(Debug, Serialize)]
struct ValidationProblem {
    #[serde(rename = "type")]
    kind: &'static str,
    title: &'static str,
    status: u16,
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationProblem {
    fn new(errors: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            kind: "https://tools.ietf.org/html/rfc9110#section-15.5.1",
            title: "One or more validation errors occurred.",
            status: StatusCode::BAD_REQUEST.as_u16(),
            errors,
        }
    }

    fn field(field: &str, message: impl Into<String>) -> Self {
        Self::new(BTreeMap::from([(field.to_string(), vec![message.into()])]))
    }

    fn required(field: &str) -> Self {
        Self::field(field, format!("The {field} field is required."))
    }
}

impl IntoResponse for ValidationProblem {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            [(CONTENT_TYPE, "application/problem+json")],
            Json(self),
        )
            .into_response()
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

/// Collect the missing required fields of the service hook envelope.
fn validate(event: &AzdoEvent) -> Option<ValidationProblem> {
    let mut errors = BTreeMap::new();
    let mut require = |present: bool, field: &str| {
        if !present {
            errors.insert(field.to_string(), vec![format!("The {field} field is required.")]);
        }
    };
    require(
        event.subscription_id.as_deref().is_some_and(|s| !s.is_empty()),
        "SubscriptionId",
    );
    require(event.event_type.is_some(), "EventType");
    require(event.resource.is_some(), "Resource");

    (!errors.is_empty()).then(|| ValidationProblem::new(errors))
}

/// Receives Azure DevOps service hook notifications.
pub async fn azure(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    if body.is_empty() {
        return StatusCode::BAD_REQUEST.into_response();
    }
    if !is_json(&headers) {
        return StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response();
    }

    let event: AzdoEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => return ValidationProblem::field("$", e.to_string()).into_response(),
    };
    if let Some(problem) = validate(&event) {
        return problem.into_response();
    }
    let (Some(event_type), Some(resource)) = (event.event_type, event.resource) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    let hook_subscription = event
        .subscription_id
        .as_deref()
        .unwrap_or_default()
        .replace(['\r', '\n'], "");
    tracing::info!(
        notification_id = event.notification_id,
        "Received {} notification on subscription {}",
        event_type,
        hook_subscription
    );

    if event_type != AzdoEventType::GitPullRequestUpdated {
        tracing::warn!("Events of type {} are not supported.", event_type);
        return StatusCode::OK.into_response();
    }

    let resource: AzdoPullRequestResource = match serde_json::from_value(resource) {
        Ok(resource) => resource,
        Err(e) => return ValidationProblem::field("Resource", e.to_string()).into_response(),
    };
    let pull_request_id = resource.pull_request_id;
    let status = resource.status;

    // only the PR status counts, merge status is ignored
    if !CLOSING_STATUSES.iter().any(|s| s.eq_ignore_ascii_case(&status)) {
        tracing::trace!(
            pull_request_id,
            "PR was updated but the status didn't match. Status '{}'",
            status
        );
        return StatusCode::OK.into_response();
    }

    let repository = resource.repository;
    let Some(raw_project_url) = repository
        .as_ref()
        .and_then(|r| r.project.as_ref())
        .and_then(|p| p.url.clone())
    else {
        return ValidationProblem::required("Resource.Repository.Project.Url").into_response();
    };
    let Some(remote_url) = repository.and_then(|r| r.remote_url) else {
        return ValidationProblem::required("Resource.Repository.RemoteUrl").into_response();
    };

    let event = AzdoCleanupEvent {
        pull_request_id,
        remote_url,
        raw_project_url,
    };
    // resources created right before the PR closed need time to show up in listings
    if let Err(e) = state.publisher.publish(event, state.delay).await {
        tracing::error!(error = ?e, pull_request_id, "Failed to publish cleanup event");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    StatusCode::OK.into_response()
}
