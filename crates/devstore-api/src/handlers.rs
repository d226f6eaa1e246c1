//! HTTP handlers.
//!
//! The dispatcher does blocking storage I/O, so each command and the health
//! check run on the blocking thread pool.

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use devstore_core::{Envelope, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::ApiState;

/// Header carrying the developer key.
pub const DEVELOPER_KEY_HEADER: &str = "developer-key";

/// Optional `?key=` fallback for envelopes that omit `key`.
#[derive(Debug, Default, Deserialize)]
pub struct KeyQuery {
    pub key: Option<String>,
}

/// Developer key from `Developer-Key`, else from `Authorization`.
pub fn developer_key(headers: &HeaderMap) -> Option<String> {
    let raw = headers
        .get(DEVELOPER_KEY_HEADER)
        .or_else(|| headers.get(header::AUTHORIZATION))?
        .to_str()
        .ok()?
        .trim();
    let key = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    (!key.is_empty()).then(|| key.to_string())
}

fn status_of(response: &Response) -> StatusCode {
    StatusCode::from_u16(response.http_status_hint).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// POST /worker, POST /api/server
pub async fn execute(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Query(query): Query<KeyQuery>,
    Json(mut envelope): Json<Envelope>,
) -> impl IntoResponse {
    if envelope.key.is_none() {
        envelope.key = query.key;
    }
    let developer_key = developer_key(&headers);

    let dispatcher = state.dispatcher.clone();
    let response = tokio::task::spawn_blocking(move || {
        dispatcher.handle(developer_key.as_deref(), envelope)
    })
    .await;

    match response {
        Ok(response) => (status_of(&response), Json(response)).into_response(),
        Err(e) => {
            error!(error = %e, "command task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"status": "error", "message": "failed to process the request"})),
            )
                .into_response()
        }
    }
}

/// GET /api/server
pub async fn server_status() -> impl IntoResponse {
    Json(json!({ "message": "devstore command endpoint is up" }))
}

/// GET /healthz
pub async fn healthz(State(state): State<ApiState>) -> impl IntoResponse {
    let dispatcher = state.dispatcher.clone();
    let count = tokio::task::spawn_blocking(move || dispatcher.registry().count()).await;

    match count {
        Ok(Ok(developers)) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "developers": developers })),
        ),
        Ok(Err(e)) => {
            error!(error = %e, "health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "message": e.to_string() })),
            )
        }
        Err(e) => {
            error!(error = %e, "health check task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "message": "failed to process the request" })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use devstore_core::{Dispatcher, ErrorKind};
    use devstore_state::StateStore;

    fn test_state() -> ApiState {
        let store = StateStore::open_in_memory().unwrap();
        ApiState {
            dispatcher: Dispatcher::new(store),
        }
    }

    fn headers_with(name: &'static str, value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_static(value));
        headers
    }

    async fn body_json(resp: axum::response::Response) -> Response {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn envelope(action: &str, key: Option<&str>) -> Envelope {
        Envelope {
            action: action.to_string(),
            key: key.map(str::to_string),
            data: None,
        }
    }

    #[test]
    fn developer_key_sources() {
        assert_eq!(
            developer_key(&headers_with("developer-key", "abc")).as_deref(),
            Some("abc")
        );
        assert_eq!(
            developer_key(&headers_with("authorization", "Bearer abc")).as_deref(),
            Some("abc")
        );
        assert_eq!(
            developer_key(&headers_with("authorization", "abc")).as_deref(),
            Some("abc")
        );
        assert_eq!(developer_key(&headers_with("authorization", "")), None);
        assert_eq!(developer_key(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn setdev_then_get_missing_record() {
        let state = test_state();

        let setdev = Envelope {
            data: Some(json!({"developerKey": "abc"})),
            ..envelope("SETDEV", None)
        };
        let resp = execute(
            State(state.clone()),
            HeaderMap::new(),
            Query(KeyQuery::default()),
            Json(setdev),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = execute(
            State(state),
            headers_with("developer-key", "abc"),
            Query(KeyQuery::default()),
            Json(envelope("GET", Some("nope"))),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await.code, Some(ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn query_key_fills_missing_envelope_key() {
        let state = test_state();
        state.dispatcher.registry().register("abc", json!({})).unwrap();

        // Without any key the command is rejected with 400.
        let resp = execute(
            State(state.clone()),
            headers_with("developer-key", "abc"),
            Query(KeyQuery::default()),
            Json(envelope("SIGNOUT", None)),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        // With ?key= it reaches the auth controller.
        let resp = execute(
            State(state),
            headers_with("developer-key", "abc"),
            Query(KeyQuery {
                key: Some("u1".to_string()),
            }),
            Json(envelope("SIGNOUT", None)),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn missing_developer_key_is_unauthorized() {
        let resp = execute(
            State(test_state()),
            HeaderMap::new(),
            Query(KeyQuery::default()),
            Json(envelope("GET", Some("k"))),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unsupported_action_is_405() {
        let resp = execute(
            State(test_state()),
            headers_with("developer-key", "abc"),
            Query(KeyQuery::default()),
            Json(envelope("PATCH", Some("k"))),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn healthz_counts_developers() {
        let state = test_state();
        let resp = healthz(State(state.clone())).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);

        state.dispatcher.registry().register("a", json!({})).unwrap();
        state.dispatcher.registry().register("b", json!({})).unwrap();
        let resp = healthz(State(state)).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["developers"], 2);
    }

    #[tokio::test]
    async fn server_status_responds() {
        let resp = server_status().await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
