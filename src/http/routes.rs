//! HTTP route definitions

use axum::{
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::error;

use crate::app::AppState;
use crate::util::time::uptime_secs;
use crate::ws::handler::{chat_ws_handler, game_ws_handler};

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins(&state.config.client_origin))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    // Client application, unknown paths fall back to the index document
    let static_dir = &state.config.static_dir;
    let client_app = ServeDir::new(static_dir)
        .fallback(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .route("/health", get(health_handler))
        .route("/ws/rock-paper-scissors", get(game_ws_handler))
        .route("/ws/chat", get(chat_ws_handler))
        .fallback_service(client_app)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// CORS origins from a comma-separated list, `*` meaning any
fn allowed_origins(client_origin: &str) -> AllowOrigin {
    if client_origin.split(',').any(|s| s.trim() == "*") {
        return AllowOrigin::any();
    }

    let origins: Vec<HeaderValue> = client_origin
        .split(',')
        .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
        .collect();
    AllowOrigin::list(origins)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    active_rooms: usize,
    waiting_rooms: usize,
    game_connections: usize,
    chat_connections: usize,
}

async fn health_handler(State(state): State<AppState>) -> Response {
    match state.game.stats().await {
        Ok(stats) => Json(HealthResponse {
            status: "ok",
            uptime_secs: uptime_secs(),
            active_rooms: stats.active_rooms,
            waiting_rooms: stats.waiting_rooms,
            game_connections: stats.game_connections,
            chat_connections: state.chat.listeners(),
        })
        .into_response(),
        Err(e) => {
            error!(error = %e, "Health check failed");
            let body = serde_json::json!({ "status": "unavailable", "error": e.to_string() });
            (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;

    fn test_config(static_dir: PathBuf) -> Config {
        Config {
            server_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "debug".into(),
            client_origin: "*".into(),
            static_dir,
        }
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_hub_counters() {
        let (state, hub) = AppState::new(test_config(PathBuf::from("public")));
        tokio::spawn(hub.run());

        let response = build_router(state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["active_rooms"], 0);
        assert_eq!(body["game_connections"], 0);
    }

    #[tokio::test]
    async fn health_is_unavailable_without_hub() {
        let (state, hub) = AppState::new(test_config(PathBuf::from("public")));
        drop(hub);

        let response = build_router(state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn unknown_paths_serve_the_index_document() {
        let dir = std::env::temp_dir().join(format!("rps-static-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("index.html"), "<h1>rps</h1>").unwrap();
        std::fs::write(dir.join("app.js"), "console.log(1)").unwrap();

        let (state, _hub) = AppState::new(test_config(dir.clone()));
        let router = build_router(state);

        let asset = router
            .clone()
            .oneshot(Request::get("/app.js").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(asset.status(), StatusCode::OK);
        let bytes = to_bytes(asset.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"console.log(1)");

        let page = router
            .oneshot(Request::get("/some/client/route").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = to_bytes(page.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"<h1>rps</h1>");

        std::fs::remove_dir_all(dir).unwrap();
    }
}
