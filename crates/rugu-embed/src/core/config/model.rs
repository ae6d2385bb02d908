//! Embedding model configuration data
//!
//! An embedder is defined by its model configuration (the `config.json` in the root of a
//! Hugging Face model repository) and the pooling strategy (optionally defined in a
//! `1_Pooling/config.json` file in the model repository).

use candle_transformers::models::bert::Config as BertConfig;
use candle_transformers::models::xlm_roberta::Config as XlmRobertaConfig;
use serde::Deserialize;

use crate::core::config::parse::parse_config;
use crate::core::repo::ModelRepo;
use crate::pooling::PoolingStrategy;
use crate::Result;

/// The base HF embedding model configuration.
///
/// This represents the fields every supported `config.json` shares.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
pub(crate) struct BaseModelConfig {
    #[serde(default)]
    pub architectures: Vec<String>,
    pub model_type: String,
    pub hidden_size: usize,
    #[serde(alias = "n_positions")]
    pub max_position_embeddings: usize,
    #[serde(default)]
    pub pad_token_id: usize,
}

/// Architecture specific configuration, selected by the `model_type` key of `config.json`.
pub(crate) enum EmbedderConfig {
    Bert(BertConfig),
    /// XLM-RoBERTa, the backbone of `BAAI/bge-m3`.
    XlmRoberta(XlmRobertaConfig),
}

/// Everything needed to construct a sentence transformer besides the weights.
pub struct SentenceTransformerConfig {
    pub(crate) embedder_config: EmbedderConfig,
    pub(crate) pooling_strategy: PoolingStrategy,
    pub(crate) tokenizer_config: serde_json::Value,
    pub(crate) hidden_size: usize,
    pub(crate) max_sequence_length: usize,
}

impl SentenceTransformerConfig {
    pub(crate) fn try_from_model_repo(
        model_repo: &ModelRepo,
        pooling_strategy: Option<PoolingStrategy>,
    ) -> Result<Self> {
        parse_config(model_repo, pooling_strategy)
    }

    pub fn pooling_strategy(&self) -> PoolingStrategy {
        self.pooling_strategy
    }

    /// Dimensionality of the produced embeddings.
    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    /// Longest token sequence the position embeddings can address.
    pub fn max_sequence_length(&self) -> usize {
        self.max_sequence_length
    }
}
