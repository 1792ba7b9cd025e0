pub mod webhooks;

use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    Router,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header::WWW_AUTHENTICATE},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Basic};
use secrecy::{ExposeSecret, SecretString};
use tower_http::trace::TraceLayer;

use crate::events::EventPublisher;

const REALM: &str = "Basic realm=\"AzureCleaner\"";

#[derive(Clone)]
pub struct AppState {
    pub publisher: Arc<dyn EventPublisher>,
    credentials: Arc<HashMap<String, SecretString>>,
    /// How long published events wait before being processed.
    pub delay: Duration,
}

impl AppState {
    pub fn new(
        publisher: Arc<dyn EventPublisher>,
        credentials: &HashMap<String, String>,
        delay: Duration,
    ) -> Self {
        // configuration keys arrive lowercased, so usernames are compared that way
        let credentials = credentials
            .iter()
            .map(|(user, password)| (user.to_lowercase(), SecretString::from(password.clone())))
            .collect();
        Self {
            publisher,
            credentials: Arc::new(credentials),
            delay,
        }
    }

    fn is_authorized(&self, username: &str, password: &str) -> bool {
        self.credentials
            .get(&username.to_lowercase())
            .is_some_and(|expected| expected.expose_secret() == password)
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn require_basic_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    let authorized = headers
        .typed_get::<Authorization<Basic>>()
        .is_some_and(|auth| state.is_authorized(auth.username(), auth.password()));
    if !authorized {
        return (StatusCode::UNAUTHORIZED, [(WWW_AUTHENTICATE, REALM)]).into_response();
    }
    next.run(request).await
}

/// Create router for the webhook and probe endpoints
pub fn router(state: AppState) -> Router {
    let webhooks = Router::new()
        .route("/webhooks/azure", post(webhooks::azure))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_basic_auth));

    Router::new()
        .route("/health", get(health))
        .route("/liveness", get(health))
        .merge(webhooks)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
