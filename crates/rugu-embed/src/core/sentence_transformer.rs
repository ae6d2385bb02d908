use crate::core::config::model::SentenceTransformerConfig;
use crate::core::embedder::{encode_batch, load_pretrained_model, EmbedderModel};
use crate::core::repo::{ModelRepo, ModelRepoFiles};
use crate::{Device, Error, PoolingStrategy, Result};

use candle_core::Tensor;
use std::marker::PhantomData;
use std::path::Path;
use std::str::FromStr;
use tokenizers::tokenizer::Tokenizer;
use tokenizers::{EncodeInput, Encoding, PaddingParams, PaddingStrategy, TruncationParams};

/// The SentenceTransformer struct is the main abstraction for using pre-trained models for
/// generating text embeddings.
///
/// ```rust,no_run
/// use rugu_embed::SentenceTransformer;
///
/// let encoder = SentenceTransformer::builder()
///     .with_model_repo("BAAI/bge-m3")?
///     .build()?;
///
/// let embeddings = encoder.embed(&["Hello, how are you?", "Hey, how are you doing?"])?;
/// assert_eq!(embeddings.len(), 2);
/// # Ok::<(), rugu_embed::Error>(())
/// ```
pub struct SentenceTransformer {
    model: Box<dyn EmbedderModel>,
    tokenizer: Tokenizer,
    pooling_strategy: PoolingStrategy,
    dimensions: usize,
}

impl SentenceTransformer {
    /// Retrieve a builder object for constructing a [`SentenceTransformer`] instance.
    pub fn builder() -> SentenceTransformerBuilder<Uninitialised> {
        SentenceTransformerBuilder::new()
    }

    /// Load a [`SentenceTransformer`] from a model repository containing the weights, config and
    /// tokenizer json files. Often, these folders are created by huggingface libraries when
    /// pulling a model from the hub, and are saved in the `~/.cache/huggingface/hub/models`
    /// directory.
    pub(crate) fn from_model_repo(
        model_repo: &ModelRepo,
        device: &Device,
        pooling_strategy: Option<PoolingStrategy>,
    ) -> Result<Self> {
        let span = tracing::span!(tracing::Level::TRACE, "st-from-repo");
        let _enter = span.enter();

        let ModelRepoFiles { model_weights, .. } = model_repo.file_paths()?;

        let st_config =
            SentenceTransformerConfig::try_from_model_repo(model_repo, pooling_strategy)?;

        let tokenizer_config_str = serde_json::to_string(&st_config.tokenizer_config)?;
        let mut tokenizer = Tokenizer::from_str(&tokenizer_config_str)?;
        configure_tokenizer(&mut tokenizer, st_config.max_sequence_length)?;

        let model = load_pretrained_model(&model_weights, &st_config.embedder_config, device)?;

        tracing::debug!(
            "loaded model with {} dimensions and {:?} pooling",
            st_config.hidden_size,
            st_config.pooling_strategy
        );

        Ok(Self {
            model,
            tokenizer,
            pooling_strategy: st_config.pooling_strategy,
            dimensions: st_config.hidden_size,
        })
    }

    /// Length of every embedding this model produces.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn pooling_strategy(&self) -> PoolingStrategy {
        self.pooling_strategy
    }

    pub fn tokenize<'s, E>(&self, sentences: Vec<E>) -> Result<Vec<Encoding>>
    where
        E: Into<EncodeInput<'s>> + Send,
    {
        Ok(self.tokenizer.encode_batch(sentences, true)?)
    }

    /// Encode `sentences` into a `(n_sentences, dimensions)` tensor.
    pub fn encode_batch<'s, E>(&self, sentences: Vec<E>, normalize: bool) -> Result<Tensor>
    where
        E: Into<EncodeInput<'s>> + Send,
    {
        let span = tracing::span!(tracing::Level::TRACE, "st-encode-batch");
        let _enter = span.enter();

        encode_batch(
            self.model.as_ref(),
            &self.tokenizer,
            sentences,
            &self.pooling_strategy,
            normalize,
        )
    }

    /// Unit-length embeddings, one per sentence and in the same order.
    pub fn embed<S>(&self, sentences: &[S]) -> Result<Vec<Vec<f32>>>
    where
        S: AsRef<str>,
    {
        if sentences.is_empty() {
            return Ok(Vec::new());
        }

        let sentences: Vec<&str> = sentences.iter().map(AsRef::as_ref).collect();
        let embeddings = self.encode_batch(sentences, true)?;

        Ok(embeddings.to_vec2::<f32>()?)
    }
}

/// Pad every batch to its longest member with the model's own pad token, and make sure no
/// sequence outgrows the position embeddings.
fn configure_tokenizer(tokenizer: &mut Tokenizer, max_sequence_length: usize) -> Result<()> {
    if let Some(pp) = tokenizer.get_padding_mut() {
        pp.strategy = PaddingStrategy::BatchLongest
    } else {
        let (pad_id, pad_token) = ["<pad>", "[PAD]"]
            .into_iter()
            .find_map(|token| {
                tokenizer
                    .token_to_id(token)
                    .map(|id| (id, token.to_string()))
            })
            .unwrap_or((0, "[PAD]".to_string()));

        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            pad_id,
            pad_token,
            ..Default::default()
        }));
    }

    let truncation = match tokenizer.get_truncation() {
        Some(tp) if tp.max_length <= max_sequence_length => None,
        Some(tp) => Some(TruncationParams {
            max_length: max_sequence_length,
            ..tp.clone()
        }),
        None => Some(TruncationParams {
            max_length: max_sequence_length,
            ..Default::default()
        }),
    };
    if truncation.is_some() {
        tokenizer.with_truncation(truncation)?;
    }

    Ok(())
}

pub trait BuilderState {}

pub struct Uninitialised;
pub struct Initialised;

impl BuilderState for Uninitialised {}
impl BuilderState for Initialised {}

pub struct SentenceTransformerBuilder<S>
where
    S: BuilderState,
{
    model_repo: Option<ModelRepo>,
    pooling_strategy: Option<PoolingStrategy>,
    device: Device,
    _marker: PhantomData<S>,
}

impl Default for SentenceTransformerBuilder<Uninitialised> {
    fn default() -> Self {
        Self::new()
    }
}

impl SentenceTransformerBuilder<Uninitialised> {
    pub fn new() -> SentenceTransformerBuilder<Uninitialised> {
        Self {
            model_repo: None,
            pooling_strategy: None,
            device: Device::Cpu,
            _marker: PhantomData,
        }
    }
}

impl<S> SentenceTransformerBuilder<S>
where
    S: BuilderState,
{
    /// Use a Hugging Face Hub repository, given as `repo_id[:revision]`.
    pub fn with_model_repo<MR: AsRef<str>>(
        self,
        model_repo: MR,
    ) -> Result<SentenceTransformerBuilder<Initialised>> {
        let model_repo = ModelRepo::from_repo_string(model_repo.as_ref())?;
        Ok(SentenceTransformerBuilder::<Initialised> {
            model_repo: Some(model_repo),
            pooling_strategy: self.pooling_strategy,
            device: self.device,
            _marker: PhantomData,
        })
    }

    pub fn with_model_folder<MR: AsRef<Path>>(
        self,
        model_folder: MR,
    ) -> SentenceTransformerBuilder<Initialised> {
        let model_repo_folder = ModelRepo::from_path(model_folder.as_ref());
        SentenceTransformerBuilder::<Initialised> {
            model_repo: Some(model_repo_folder),
            pooling_strategy: self.pooling_strategy,
            device: self.device,
            _marker: PhantomData,
        }
    }

    pub fn with_pooling_strategy(self, pooling_strategy: PoolingStrategy) -> Self {
        Self {
            pooling_strategy: Some(pooling_strategy),
            ..self
        }
    }

    pub fn with_device(self, device: Device) -> Self {
        Self { device, ..self }
    }
}

impl SentenceTransformerBuilder<Initialised> {
    pub fn build(self) -> Result<SentenceTransformer> {
        match self.model_repo {
            None => Err(Error::ModelLoad("No model directory or repository given.")),
            Some(mr) => {
                SentenceTransformer::from_model_repo(&mr, &self.device, self.pooling_strategy)
            }
        }
    }
}
