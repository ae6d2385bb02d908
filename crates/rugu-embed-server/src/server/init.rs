use axum::extract::MatchedPath;
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use clap::Args;
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info_span;

use crate::server::routes::{default, embeddings, models};
use crate::server::state::ServerState;

#[derive(Debug, Clone, Args)]
pub struct RouterArgs {
    /// Seconds before a request is abandoned
    #[clap(long, env = "RUGU_EMBED_REQUEST_TIMEOUT", default_value_t = 120)]
    pub request_timeout: u64,
}

impl Default for RouterArgs {
    fn default() -> Self {
        Self {
            request_timeout: 120,
        }
    }
}

pub fn init_router(state: Arc<ServerState>, args: &RouterArgs) -> Router {
    Router::new()
        .route("/", get(default::root))
        .route("/health", get(default::health_check))
        .route("/v1/embeddings", post(embeddings::infer_text_embeddings))
        // Older clients post to the unversioned path.
        .route("/embeddings", post(embeddings::infer_text_embeddings))
        .route("/v1/models", get(models::list_models))
        .route("/v1/models/:model_id", get(models::get_model))
        .with_state(state)
        .layer((
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    // Log the matched route's path (with placeholders not filled in).
                    let matched_path = request
                        .extensions()
                        .get::<MatchedPath>()
                        .map(MatchedPath::as_str);
                    tracing::debug!("{}", request.uri());

                    info_span!(
                        "http_request",
                        method = ?request.method(),
                        matched_path,
                        inputs = tracing::field::Empty,
                    )
                }),
            TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_secs(args.request_timeout),
            ),
        ))
}

#[cfg(test)]
mod test {
    use super::*;
    use axum::http::Method;

    use crate::server::testing::{send, test_state, FakeEncoder};

    #[tokio::test]
    async fn test_slow_request_times_out() {
        let router = init_router(test_state(true), &RouterArgs { request_timeout: 1 });
        let body = serde_json::json!({ "input": FakeEncoder::SLOW_INPUT }).to_string();

        let (status, _) = send(&router, Method::POST, "/v1/embeddings", Some(&body)).await;

        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    }
}
