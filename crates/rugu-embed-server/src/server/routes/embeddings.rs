use axum::extract::State;
use axum::Json;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::Span;

use crate::server::data_models::{EmbeddingsRequest, EmbeddingsResponse, Usage};
use crate::server::state::ServerState;
use crate::server::{ApiJson, ServerError};

/// `POST /v1/embeddings`, also mounted at `POST /embeddings`.
pub async fn infer_text_embeddings(
    State(server_state): State<Arc<ServerState>>,
    ApiJson(embeddings_request): ApiJson<EmbeddingsRequest>,
) -> Result<Json<EmbeddingsResponse>, ServerError> {
    let EmbeddingsRequest {
        input,
        model,
        encoding_format,
    } = embeddings_request;
    tracing::trace!("Requested encoding format: {}", encoding_format);

    let sentences: Vec<String> = input.into();
    Span::current().record("inputs", sentences.len());
    let usage = Usage::from_sentences(&sentences);

    let start = Instant::now();
    let embeddings = server_state.model.encode(sentences).await?;
    tracing::trace!("Inference took {} ms", start.elapsed().as_millis());

    let model = model.unwrap_or_else(|| server_state.model.name().to_string());

    Ok(Json(EmbeddingsResponse::from_embeddings(
        embeddings, usage, model,
    )))
}
