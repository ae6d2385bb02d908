//! Deterministic stand-in for a real model, so routes can be tested without weights.

use axum::body::{to_bytes, Body, Bytes};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use std::sync::Arc;
use tower::ServiceExt;

use crate::server::config::ModelArgs;
use crate::server::infer::embed::{EmbeddingsHandler, SentenceEncoder};
use crate::server::state::ServerState;
use crate::server::{init_router, RouterArgs};

pub(crate) struct FakeEncoder;

impl FakeEncoder {
    pub(crate) const DIMENSIONS: usize = 4;
    pub(crate) const FAILING_INPUT: &'static str = "__fail__";
    /// Takes two seconds to encode.
    pub(crate) const SLOW_INPUT: &'static str = "__slow__";

    /// The unit vector [`FakeEncoder`] produces for `sentence`.
    pub(crate) fn vector(sentence: &str) -> Vec<f32> {
        let bytes = sentence.as_bytes();
        let raw = [
            bytes.len() as f32 + 1.0,
            bytes.iter().map(|&b| b as f32).sum::<f32>() + 1.0,
            bytes.first().map_or(1.0, |&b| b as f32),
            bytes.last().map_or(1.0, |&b| b as f32),
        ];
        let norm = raw.iter().map(|x| x * x).sum::<f32>().sqrt();
        raw.iter().map(|x| x / norm).collect()
    }
}

impl SentenceEncoder for FakeEncoder {
    fn encode(&self, sentences: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        sentences
            .iter()
            .map(|sentence| {
                if sentence == Self::FAILING_INPUT {
                    anyhow::bail!("cannot encode {sentence}")
                }
                if sentence == Self::SLOW_INPUT {
                    std::thread::sleep(std::time::Duration::from_secs(2));
                }
                Ok(Self::vector(sentence))
            })
            .collect()
    }

    fn dimensions(&self) -> usize {
        Self::DIMENSIONS
    }
}

/// State serving [`FakeEncoder`] under the default name, loaded or not.
pub(crate) fn test_state(loaded: bool) -> Arc<ServerState> {
    let state = Arc::new(ServerState::new(&ModelArgs {
        dimensions: FakeEncoder::DIMENSIONS,
        ..Default::default()
    }));
    if loaded {
        state
            .model
            .initialize(EmbeddingsHandler::new(FakeEncoder))
            .expect("fresh state accepts a model");
    }
    state
}

pub(crate) fn test_router(state: Arc<ServerState>) -> Router {
    init_router(
        state,
        &RouterArgs {
            request_timeout: 10,
        },
    )
}

pub(crate) async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    json_body: Option<&str>,
) -> (StatusCode, Bytes) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match json_body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("valid request");

    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");

    (status, body)
}
