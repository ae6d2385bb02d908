use anyhow::Result;
use once_cell::sync::OnceCell;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::time::Instant;

use crate::server::config::ModelArgs;
use crate::server::infer::embed::{EmbeddingsClient, EmbeddingsHandler};
use crate::server::infer::DedicatedExecutor;
use crate::server::ServerError;

/// Represents the state of the server.
pub struct ServerState {
    pub model: ModelHolder,
}

impl ServerState {
    pub fn new(model_args: &ModelArgs) -> Self {
        Self {
            model: ModelHolder::new(model_args),
        }
    }
}

struct LoadedModel {
    client: EmbeddingsClient,
    executor: DedicatedExecutor<EmbeddingsHandler>,
}

/// The single served model.
///
/// Starts empty and is bound exactly once, after which every request reads it. Until then
/// [`ModelHolder::encode`] fails with [`ServerError::ModelNotReady`].
pub struct ModelHolder {
    name: String,
    dimensions: usize,
    source: String,
    created: u64,
    loaded: OnceCell<LoadedModel>,
}

impl ModelHolder {
    pub fn new(model_args: &ModelArgs) -> Self {
        let created = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        Self {
            name: model_args.model_name.clone(),
            dimensions: model_args.dimensions,
            source: model_args.model_source(),
            created,
            loaded: OnceCell::new(),
        }
    }

    /// Served model name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Advertised dimensionality, known before the model is loaded.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Hub repository or folder the weights come from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Unix timestamp of process start, reported as the model creation time.
    pub fn created(&self) -> u64 {
        self.created
    }

    pub fn is_ready(&self) -> bool {
        self.loaded.get().is_some()
    }

    /// Load the model described by `model_args` off the async runtime and bind it.
    pub async fn load(&self, model_args: ModelArgs) -> Result<()> {
        let start = Instant::now();

        let handler =
            tokio::task::spawn_blocking(move || EmbeddingsHandler::load(&model_args)).await??;
        self.initialize(handler)?;

        tracing::info!(
            "Model {} ready after {} ms",
            self.name,
            start.elapsed().as_millis()
        );
        Ok(())
    }

    /// Move `handler` onto its own inference thread and start serving it.
    pub fn initialize(&self, handler: EmbeddingsHandler) -> Result<()> {
        if self.is_ready() {
            anyhow::bail!("Model {} is already loaded", self.name);
        }

        if handler.dimensions() != self.dimensions {
            tracing::warn!(
                "Model {} produces {} dimensional embeddings, but {} are advertised",
                self.name,
                handler.dimensions(),
                self.dimensions
            );
        }

        let executor = DedicatedExecutor::new(handler)?;
        let client = EmbeddingsClient::new(&executor);

        self.loaded
            .set(LoadedModel { client, executor })
            .map_err(|_| anyhow::anyhow!("Model {} is already loaded", self.name))
    }

    /// Embed `sentences`, one unit vector per sentence, in order.
    pub async fn encode(&self, sentences: Vec<String>) -> Result<Vec<Vec<f32>>, ServerError> {
        let loaded = self.loaded.get().ok_or(ServerError::ModelNotReady)?;

        let embeddings = loaded
            .client
            .generate_embeddings(sentences)
            .await
            .map_err(ServerError::Inference)?;

        Ok(embeddings)
    }

    /// Stop the inference thread after the queued requests are handled.
    pub fn shutdown(&self) {
        if let Some(loaded) = self.loaded.get() {
            loaded.executor.stop();
            loaded.executor.join();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::server::testing::FakeEncoder;

    fn holder() -> ModelHolder {
        ModelHolder::new(&ModelArgs {
            dimensions: FakeEncoder::DIMENSIONS,
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_encode_before_initialize_is_not_ready() {
        let holder = holder();

        assert!(!holder.is_ready());
        let result = holder.encode(vec!["hello".to_string()]).await;

        assert!(matches!(result, Err(ServerError::ModelNotReady)));
    }

    #[tokio::test]
    async fn test_initialize_then_encode() -> anyhow::Result<()> {
        let holder = holder();

        holder.initialize(EmbeddingsHandler::new(FakeEncoder))?;

        assert!(holder.is_ready());
        let embeddings = holder.encode(vec!["hello".to_string()]).await?;
        assert_eq!(embeddings, vec![FakeEncoder::vector("hello")]);
        Ok(())
    }

    #[tokio::test]
    async fn test_initialize_twice_fails() -> anyhow::Result<()> {
        let holder = holder();

        holder.initialize(EmbeddingsHandler::new(FakeEncoder))?;

        assert!(holder
            .initialize(EmbeddingsHandler::new(FakeEncoder))
            .is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_encode_failure_is_an_inference_error() -> anyhow::Result<()> {
        let holder = holder();
        holder.initialize(EmbeddingsHandler::new(FakeEncoder))?;

        let result = holder
            .encode(vec![FakeEncoder::FAILING_INPUT.to_string()])
            .await;

        assert!(matches!(result, Err(ServerError::Inference(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_load_failure_leaves_holder_not_ready() {
        let dir = std::env::temp_dir().join(format!("rugu-embed-missing-{}", uuid::Uuid::new_v4()));
        let holder = holder();

        let result = holder
            .load(ModelArgs {
                model_folder: Some(dir),
                ..Default::default()
            })
            .await;

        assert!(result.is_err());
        assert!(!holder.is_ready());
    }

    #[test]
    fn test_descriptor_is_known_before_load() {
        let holder = ModelHolder::new(&ModelArgs::default());

        assert_eq!(holder.name(), "bge-m3");
        assert_eq!(holder.dimensions(), 1024);
        assert_eq!(holder.source(), "BAAI/bge-m3");
    }
}
