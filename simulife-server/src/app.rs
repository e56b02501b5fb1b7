//! HTTP surface: progress endpoints plus the legacy vote counters.
//!
//! Route shapes and semantics follow the original client contract:
//! `/api/init` bootstraps the page in one round trip, progress is saved
//! per `(story instance, player)`, anonymous players are never persisted,
//! and the counter endpoints mutate the shared `count` key.

use crate::config::ServerConfig;
use crate::gateway::KvProgressStore;
use crate::identity::{HeaderIdentity, IdentityProvider, PlayerIdentity};
use crate::kv::{KvError, KvStore, MemoryKv};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use simulife_core::persist::{PersistError, PersistedProgress, ProgressStore};
use simulife_core::session::SessionState;
use simulife_core::StoryGraph;
use std::sync::Arc;
use thiserror::Error;

/// The shared `count` key behind the legacy endpoints.
const COUNT_KEY: &str = "count";

/// Everything the handlers need.
pub struct AppState {
    /// The story instance all progress is scoped to.
    pub instance: String,

    /// The story graph; stamps saved snapshots with its content version.
    pub graph: Arc<StoryGraph>,

    pub kv: Arc<dyn KvStore>,
    pub progress: Arc<dyn ProgressStore>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    /// State with in-memory collaborators, for local runs and tests.
    pub fn in_memory(instance: impl Into<String>, graph: Arc<StoryGraph>) -> Self {
        let kv: Arc<dyn KvStore> = Arc::new(MemoryKv::new());
        Self {
            instance: instance.into(),
            graph,
            progress: Arc::new(KvProgressStore::new(kv.clone())),
            kv,
            identity: Arc::new(HeaderIdentity::new()),
        }
    }

    pub fn from_config(config: &ServerConfig, graph: Arc<StoryGraph>) -> Self {
        Self::in_memory(config.story_instance.clone(), graph)
    }
}

/// Errors surfaced to clients.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("a signed-in player is required")]
    AnonymousPlayer,

    #[error("persistence error: {0}")]
    Persist(#[from] PersistError),

    #[error("store error: {0}")]
    Kv(#[from] KvError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::AnonymousPlayer => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(serde_json::json!({
            "status": "error",
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InitResponse {
    #[serde(rename = "type")]
    kind: &'static str,
    post_id: String,
    count: i64,
    username: String,
    progress: Option<PersistedProgress>,
}

#[derive(Debug, Serialize)]
struct ProgressResponse {
    status: &'static str,
    progress: Option<PersistedProgress>,
}

#[derive(Debug, Serialize)]
struct Ack {
    status: &'static str,
    message: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CountResponse {
    #[serde(rename = "type")]
    kind: &'static str,
    post_id: String,
    count: i64,
}

/// Build the router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/init", get(init))
        .route("/api/progress", get(progress))
        .route("/api/save-progress", post(save_progress))
        .route("/api/reset-progress", post(reset_progress))
        .route("/api/increment", post(increment))
        .route("/api/decrement", post(decrement))
        .with_state(state)
}

async fn current_count(state: &AppState) -> Result<i64, ApiError> {
    let raw = state.kv.get(COUNT_KEY).await?;
    Ok(raw.and_then(|v| v.parse().ok()).unwrap_or(0))
}

/// Bootstrap the page: counter, identity, and any saved progress in one
/// round trip.
async fn init(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<InitResponse>, ApiError> {
    let identity = state.identity.identify(&headers);
    let count = current_count(&state).await?;

    // A failed progress load must not block entry; the player just starts
    // fresh.
    let progress = match identity.name() {
        None => None,
        Some(player) => match state.progress.load(&state.instance, player).await {
            Ok(progress) => progress,
            Err(err) => {
                tracing::warn!(error = %err, player, "progress load failed during init");
                None
            }
        },
    };

    Ok(Json(InitResponse {
        kind: "init",
        post_id: state.instance.clone(),
        count,
        username: identity.display_name().to_string(),
        progress,
    }))
}

async fn progress(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ProgressResponse>, ApiError> {
    let progress = match state.identity.identify(&headers) {
        PlayerIdentity::Anonymous => None,
        PlayerIdentity::Player(player) => {
            state.progress.load(&state.instance, &player).await?
        }
    };

    Ok(Json(ProgressResponse {
        status: "success",
        progress,
    }))
}

/// Persist a session snapshot. The body is the raw session state; the
/// server stamps the graph version and timestamp.
async fn save_progress(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(snapshot): Json<SessionState>,
) -> Result<Json<Ack>, ApiError> {
    let player = match state.identity.identify(&headers) {
        PlayerIdentity::Anonymous => return Err(ApiError::AnonymousPlayer),
        PlayerIdentity::Player(player) => player,
    };

    let progress = PersistedProgress::new(state.graph.version(), snapshot);
    state
        .progress
        .save(&state.instance, &player, &progress)
        .await?;

    Ok(Json(Ack {
        status: "success",
        message: "Progress saved successfully",
    }))
}

async fn reset_progress(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Ack>, ApiError> {
    let player = match state.identity.identify(&headers) {
        PlayerIdentity::Anonymous => return Err(ApiError::AnonymousPlayer),
        PlayerIdentity::Player(player) => player,
    };

    state.progress.clear(&state.instance, &player).await?;

    Ok(Json(Ack {
        status: "success",
        message: "Progress reset successfully",
    }))
}

async fn increment(State(state): State<Arc<AppState>>) -> Result<Json<CountResponse>, ApiError> {
    let count = state.kv.incr_by(COUNT_KEY, 1).await?;
    Ok(Json(CountResponse {
        kind: "increment",
        post_id: state.instance.clone(),
        count,
    }))
}

async fn decrement(State(state): State<Arc<AppState>>) -> Result<Json<CountResponse>, ApiError> {
    let count = state.kv.incr_by(COUNT_KEY, -1).await?;
    Ok(Json(CountResponse {
        kind: "decrement",
        post_id: state.instance.clone(),
        count,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::PLAYER_HEADER;
    use axum::body::Body;
    use axum::http::{header, Request};
    use http_body_util::BodyExt;
    use simulife_core::session::{Selection, StorySession};
    use simulife_core::story;
    use tower::ServiceExt;

    fn test_router() -> Router {
        router(Arc::new(AppState::in_memory("post_test", story::simulife())))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get_req(uri: &str, player: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(player) = player {
            builder = builder.header(PLAYER_HEADER, player);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post_req(uri: &str, player: Option<&str>, body: Body) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(player) = player {
            builder = builder.header(PLAYER_HEADER, player);
        }
        builder.body(body).unwrap()
    }

    fn played_state() -> SessionState {
        let mut session = StorySession::start(story::simulife(), Selection::none());
        session.choose("chicago").unwrap();
        session.state().clone()
    }

    #[tokio::test]
    async fn init_bootstraps_a_fresh_player() {
        let app = test_router();
        let response = app.oneshot(get_req("/api/init", Some("cassey"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["type"], "init");
        assert_eq!(body["postId"], "post_test");
        assert_eq!(body["count"], 0);
        assert_eq!(body["username"], "cassey");
        assert!(body["progress"].is_null());
    }

    #[tokio::test]
    async fn init_reports_anonymous_users() {
        let app = test_router();
        let response = app.oneshot(get_req("/api/init", None)).await.unwrap();
        let body = body_json(response).await;
        assert_eq!(body["username"], "anonymous");
        assert!(body["progress"].is_null());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let app = test_router();
        let state = played_state();

        let response = app
            .clone()
            .oneshot(post_req(
                "/api/save-progress",
                Some("cassey"),
                Body::from(serde_json::to_vec(&state).unwrap()),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(get_req("/api/progress", Some("cassey")))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["progress"]["state"]["current_scene"], "scene2_chicago");
        assert_eq!(
            body["progress"]["graph_version"],
            story::GRAPH_VERSION
        );
    }

    #[tokio::test]
    async fn anonymous_saves_are_rejected() {
        let app = test_router();
        let response = app
            .oneshot(post_req(
                "/api/save-progress",
                None,
                Body::from(serde_json::to_vec(&played_state()).unwrap()),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn reset_clears_saved_progress() {
        let app = test_router();

        let save = post_req(
            "/api/save-progress",
            Some("cassey"),
            Body::from(serde_json::to_vec(&played_state()).unwrap()),
        );
        app.clone().oneshot(save).await.unwrap();

        let reset = post_req("/api/reset-progress", Some("cassey"), Body::empty());
        let response = app.clone().oneshot(reset).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(get_req("/api/progress", Some("cassey")))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert!(body["progress"].is_null());
    }

    #[tokio::test]
    async fn progress_is_per_player() {
        let app = test_router();

        let save = post_req(
            "/api/save-progress",
            Some("cassey"),
            Body::from(serde_json::to_vec(&played_state()).unwrap()),
        );
        app.clone().oneshot(save).await.unwrap();

        let response = app
            .oneshot(get_req("/api/progress", Some("zeke")))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert!(body["progress"].is_null());
    }

    #[tokio::test]
    async fn counters_move_both_ways() {
        let app = test_router();

        for expected in 1..=2 {
            let response = app
                .clone()
                .oneshot(post_req("/api/increment", None, Body::empty()))
                .await
                .unwrap();
            let body = body_json(response).await;
            assert_eq!(body["type"], "increment");
            assert_eq!(body["count"], expected);
        }

        let response = app
            .clone()
            .oneshot(post_req("/api/decrement", None, Body::empty()))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["count"], 1);

        // init reads the same counter.
        let response = app.oneshot(get_req("/api/init", None)).await.unwrap();
        let body = body_json(response).await;
        assert_eq!(body["count"], 1);
    }
}
