use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use tokenizers::{EncodeInput, Tokenizer};

// Re-exports
pub use candle_transformers::models::{bert::BertModel, xlm_roberta::XLMRobertaModel};

use crate::core::config::model::EmbedderConfig;
use crate::core::repo::ModelWeightsPath;
use crate::core::utils::normalize_l2;
use crate::pooling::PoolingStrategy;
use crate::Result;

pub(crate) fn load_model(
    vb: VarBuilder,
    model_config: &EmbedderConfig,
) -> Result<Box<dyn EmbedderModel>> {
    match model_config {
        EmbedderConfig::Bert(cfg) => Ok(Box::new(BertModel::load(vb, cfg)?)),
        EmbedderConfig::XlmRoberta(cfg) => Ok(Box::new(XlmRobertaEmbedder::load(vb, cfg)?)),
    }
}

pub(crate) fn load_pretrained_model(
    model_weights_path: &ModelWeightsPath,
    model_config: &EmbedderConfig,
    device: &Device,
) -> Result<Box<dyn EmbedderModel>> {
    tracing::debug!("loading weights from {:?}", model_weights_path);

    let vb = match model_weights_path {
        ModelWeightsPath::Pth(path) => VarBuilder::from_pth(path, DType::F32, device)?,
        ModelWeightsPath::Safetensors(path) => unsafe {
            VarBuilder::from_mmaped_safetensors(&[path], DType::F32, device)?
        },
    };

    load_model(vb, model_config)
}

/// Trait for embedder models
pub trait EmbedderModel: Send + Sync {
    /// Run the transformer and return the last hidden states, `(batch, seq_len, hidden)`.
    ///
    /// `attention_mask` is `(batch, seq_len)` with ones on real tokens and zeros on padding.
    fn encode(&self, token_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor>;

    fn get_device(&self) -> &Device;
}

impl EmbedderModel for BertModel {
    #[inline]
    fn encode(&self, token_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let token_type_ids = token_ids.zeros_like()?;
        Ok(self.forward(token_ids, &token_type_ids, Some(attention_mask))?)
    }

    fn get_device(&self) -> &Device {
        &self.device
    }
}

/// [`XLMRobertaModel`] does not expose the device it was loaded on, so it is kept alongside.
pub struct XlmRobertaEmbedder {
    model: XLMRobertaModel,
    device: Device,
}

impl XlmRobertaEmbedder {
    pub fn load(
        vb: VarBuilder,
        config: &candle_transformers::models::xlm_roberta::Config,
    ) -> Result<Self> {
        let device = vb.device().clone();
        let model = XLMRobertaModel::new(config, vb)?;
        Ok(Self { model, device })
    }
}

impl EmbedderModel for XlmRobertaEmbedder {
    #[inline]
    fn encode(&self, token_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let token_type_ids = token_ids.zeros_like()?;
        Ok(self.model.forward(
            token_ids,
            attention_mask,
            &token_type_ids,
            None,
            None,
            None,
        )?)
    }

    fn get_device(&self) -> &Device {
        &self.device
    }
}

/// Encodes a batch of sentences by tokenizing them and running them through the model,
/// then pools every sequence into a single vector.
///
/// # Arguments
///
/// * `model` - A reference to a `dyn EmbedderModel` trait object.
/// * `tokenizer` - A reference to a `Tokenizer`, configured to pad to the longest sequence.
/// * `sentences` - A collection of sentences to encode.
/// * `pooling_strategy` - How token states are reduced to one vector per sentence.
/// * `normalize` - A boolean flag indicating whether to normalize the embeddings or not.
///
/// # Returns
///
/// A `(n_sentences, hidden_size)` tensor, row `i` belonging to `sentences[i]`.
///
/// # Errors
///
/// Returns an error if there is any failure during tokenization or the forward pass.
///
pub(crate) fn encode_batch<'s, E>(
    model: &dyn EmbedderModel,
    tokenizer: &Tokenizer,
    sentences: Vec<E>,
    pooling_strategy: &PoolingStrategy,
    normalize: bool,
) -> Result<Tensor>
where
    E: Into<EncodeInput<'s>> + Send,
{
    let tokens = tokenizer.encode_batch(sentences, true)?;

    let device = model.get_device();

    let token_ids = tokens
        .iter()
        .map(|tokens| Tensor::new(tokens.get_ids(), device))
        .collect::<candle_core::Result<Vec<_>>>()?;
    let attention_mask = tokens
        .iter()
        .map(|tokens| Tensor::new(tokens.get_attention_mask(), device))
        .collect::<candle_core::Result<Vec<_>>>()?;

    let token_ids = Tensor::stack(&token_ids, 0)?;
    let attention_mask = Tensor::stack(&attention_mask, 0)?;

    encode_tokens(
        model,
        &token_ids,
        &attention_mask,
        pooling_strategy,
        normalize,
    )
}

/// Run the model on an already tokenized, padded `(batch, seq_len)` batch and pool the
/// token states into one vector per row.
pub(crate) fn encode_tokens(
    model: &dyn EmbedderModel,
    token_ids: &Tensor,
    attention_mask: &Tensor,
    pooling_strategy: &PoolingStrategy,
    normalize: bool,
) -> Result<Tensor> {
    tracing::trace!("running inference on batch {:?}", token_ids.shape());

    let hidden_states = model.encode(token_ids, attention_mask)?;
    let embeddings = pooling_strategy.pool(&hidden_states, attention_mask)?;

    let embeddings = if normalize {
        normalize_l2(&embeddings)?
    } else {
        embeddings
    };

    tracing::trace!("generated embeddings {:?}", embeddings.shape());
    Ok(embeddings)
}
