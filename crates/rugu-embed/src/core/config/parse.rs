use std::fs;
use std::path::Path;

use crate::core::config::model::{BaseModelConfig, EmbedderConfig, SentenceTransformerConfig};
use crate::core::repo::{ModelRepo, ModelRepoFiles};
use crate::pooling::{PoolConfig, PoolingStrategy};
use crate::{Error, Result};

/// Parse the model configuration from the given model repository.
pub(crate) fn parse_config(
    // Directory containing all model files (in a HF repo)
    model_repo: &ModelRepo,
    // If not given, it'll be read from `1_Pooling/config.json`
    pooling_strategy: Option<PoolingStrategy>,
) -> Result<SentenceTransformerConfig> {
    let ModelRepoFiles {
        config,
        tokenizer_config,
        pooling_config,
        ..
    } = model_repo.file_paths()?;

    // Parse config.json
    let config_str = &fs::read_to_string(config)?;
    let base_config: BaseModelConfig = serde_json::from_str(config_str)?;
    let (embedder_config, max_sequence_length) = parse_embedder_config(&base_config, config_str)?;

    // Parse tokenizer.json
    let tokenizer_config: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(tokenizer_config)?)?;

    let pooling_strategy = match pooling_strategy {
        Some(ps) => ps,
        None => read_pooling_strategy(pooling_config.as_deref())?,
    };

    Ok(SentenceTransformerConfig {
        embedder_config,
        pooling_strategy,
        tokenizer_config,
        hidden_size: base_config.hidden_size,
        max_sequence_length,
    })
}

/// Select the architecture config and the longest sequence it accepts.
fn parse_embedder_config(
    base_config: &BaseModelConfig,
    config_str: &str,
) -> Result<(EmbedderConfig, usize)> {
    match base_config.model_type.as_str() {
        "bert" => Ok((
            EmbedderConfig::Bert(serde_json::from_str(config_str)?),
            base_config.max_position_embeddings,
        )),
        "xlm-roberta" => {
            // Positions are offset by `pad_token_id + 1`.
            let offset = base_config.pad_token_id + 1;
            Ok((
                EmbedderConfig::XlmRoberta(serde_json::from_str(config_str)?),
                base_config.max_position_embeddings.saturating_sub(offset),
            ))
        }
        other => Err(Error::InvalidModelConfig(format!(
            "unsupported model type `{other}`"
        ))),
    }
}

fn read_pooling_strategy(pooling_config_path: Option<&Path>) -> Result<PoolingStrategy> {
    let Some(path) = pooling_config_path else {
        return Err(Error::NoPoolingConfiguration(
            "No pooling strategy given or found in model repository.",
        ));
    };

    let config: PoolConfig = serde_json::from_str(&fs::read_to_string(path)?)?;

    if config.pooling_mode_cls_token {
        Ok(PoolingStrategy::Cls)
    } else if config.pooling_mode_mean_tokens {
        Ok(PoolingStrategy::Mean)
    } else {
        Err(Error::NoPoolingConfiguration(
            "Only CLS and mean pooling are supported.",
        ))
    }
}
