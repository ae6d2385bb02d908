use anyhow::Context;
use rugu_embed::core::device::print_device_info;
use rugu_embed::SentenceTransformer;

use crate::server::config::ModelArgs;
use crate::server::infer::client::Client;
use crate::server::infer::handler::RequestHandler;
use crate::server::infer::DedicatedExecutor;

/// A model that turns sentences into unit-length vectors, one per sentence, in order.
pub trait SentenceEncoder: Send + 'static {
    fn encode(&self, sentences: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    fn dimensions(&self) -> usize;
}

impl SentenceEncoder for SentenceTransformer {
    fn encode(&self, sentences: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(self.embed(sentences)?)
    }

    fn dimensions(&self) -> usize {
        SentenceTransformer::dimensions(self)
    }
}

pub struct EmbeddingsHandler {
    encoder: Box<dyn SentenceEncoder>,
}

impl EmbeddingsHandler {
    pub fn new(encoder: impl SentenceEncoder) -> Self {
        Self {
            encoder: Box::new(encoder),
        }
    }

    /// Load the configured model. Blocks for as long as the download and weight loading take.
    pub fn load(args: &ModelArgs) -> anyhow::Result<Self> {
        let device = args.device.device()?;
        print_device_info(&device);

        let builder = SentenceTransformer::builder().with_device(device);
        let builder = match args.pooling {
            Some(pooling_strategy) => builder.with_pooling_strategy(pooling_strategy),
            None => builder,
        };
        let builder = match &args.model_folder {
            Some(folder) => {
                tracing::info!("Loading model from {}. Wait for model load.", folder.display());
                builder.with_model_folder(folder)
            }
            None => {
                tracing::info!("Loading model: {}. Wait for model load.", args.model_repo);
                builder.with_model_repo(&args.model_repo)?
            }
        };

        let sentence_transformer = builder
            .build()
            .with_context(|| format!("Failed to load model {}", args.model_source()))?;

        tracing::info!(
            "Model loaded, producing {} dimensional embeddings",
            sentence_transformer.dimensions()
        );

        Ok(Self::new(sentence_transformer))
    }

    pub fn dimensions(&self) -> usize {
        self.encoder.dimensions()
    }
}

impl RequestHandler for EmbeddingsHandler {
    type Input = Vec<String>;
    type Output = Vec<Vec<f32>>;

    fn handle(&mut self, sentences: Vec<String>) -> anyhow::Result<Vec<Vec<f32>>> {
        let embeddings = self.encoder.encode(&sentences)?;

        anyhow::ensure!(
            embeddings.len() == sentences.len(),
            "Model returned {} embeddings for {} inputs",
            embeddings.len(),
            sentences.len()
        );

        Ok(embeddings)
    }
}

impl From<SentenceTransformer> for EmbeddingsHandler {
    fn from(sentence_transformer: SentenceTransformer) -> Self {
        Self::new(sentence_transformer)
    }
}

/// Embeddings inference struct
#[derive(Clone)]
pub struct EmbeddingsClient(Client<EmbeddingsHandler>);

impl EmbeddingsClient {
    pub(crate) fn new(executor: &DedicatedExecutor<EmbeddingsHandler>) -> Self {
        Self(Client::new(executor))
    }

    pub async fn generate_embeddings(
        &self,
        sentences: Vec<String>,
    ) -> anyhow::Result<Vec<Vec<f32>>> {
        let rx = self.0.send(sentences).await?;
        rx.await
            .map_err(|_| anyhow::anyhow!("Failed to receive response from executor"))?
    }
}
