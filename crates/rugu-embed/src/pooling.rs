use candle_core::{IndexOp, Tensor, D};
use serde::Deserialize;

#[cfg(feature = "clap")]
use clap::ValueEnum;

use crate::Result;

/// Pooling strategy.
///
/// Source: `text-embeddings-inference`: [`backends/candle/src/lib.rs`](https://github.com/huggingface/text-embeddings-inference/blob/7e55c61c2a39612ade5db9b929ffc883913ae0f3/backends/candle/src/lib.rs)
#[cfg_attr(feature = "clap", derive(ValueEnum))]
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum PoolingStrategy {
    /// Select the CLS token as embedding
    Cls,
    /// Apply Mean pooling to the model embeddings, ignoring padding tokens
    Mean,
}

impl PoolingStrategy {
    /// Reduce `(batch, seq_len, hidden)` token states to `(batch, hidden)`.
    ///
    /// `attention_mask` has shape `(batch, seq_len)` with ones on real tokens.
    pub fn pool(&self, embeddings: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        match self {
            PoolingStrategy::Cls => cls_pooling(embeddings),
            PoolingStrategy::Mean => mean_pooling(embeddings, attention_mask),
        }
    }
}

/// Contents of a sentence-transformers `1_Pooling/config.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[allow(dead_code)]
pub struct PoolConfig {
    pub(crate) pooling_mode_cls_token: bool,
    pub(crate) pooling_mode_mean_tokens: bool,
    #[serde(default)]
    pooling_mode_max_tokens: bool,
    #[serde(default)]
    pooling_mode_mean_sqrt_len_tokens: bool,
}

fn cls_pooling(embeddings: &Tensor) -> Result<Tensor> {
    Ok(embeddings.i((.., 0))?.contiguous()?)
}

fn mean_pooling(embeddings: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let mask = attention_mask
        .to_dtype(embeddings.dtype())?
        .unsqueeze(D::Minus1)?;

    let summed = embeddings.broadcast_mul(&mask)?.sum(1)?;
    let counts = mask.sum(1)?;

    Ok(summed.broadcast_div(&counts)?)
}

#[cfg(test)]
mod test {
    use super::*;
    use candle_core::{DType, Device};

    #[test]
    fn test_cls_pooling_takes_first_token() -> Result<()> {
        // 2 sentences, 3 tokens, 2 dimensions
        let v = Tensor::new(
            &[
                [[1f32, 2.], [3., 4.], [5., 6.]],
                [[7f32, 8.], [9., 10.], [11., 12.]],
            ],
            &Device::Cpu,
        )?;
        let mask = Tensor::ones((2, 3), DType::U32, &Device::Cpu)?;

        let pooled = PoolingStrategy::Cls.pool(&v, &mask)?;

        assert_eq!(pooled.to_vec2::<f32>()?, vec![vec![1., 2.], vec![7., 8.]]);
        Ok(())
    }

    #[test]
    fn test_mean_pooling_ignores_padding() -> Result<()> {
        let v = Tensor::new(
            &[
                [[1f32, 1.], [3., 3.], [100., 100.]],
                [[2f32, 4.], [4., 8.], [6., 12.]],
            ],
            &Device::Cpu,
        )?;
        // The last token of the first sentence is padding.
        let mask = Tensor::new(&[[1u32, 1, 0], [1, 1, 1]], &Device::Cpu)?;

        let pooled = PoolingStrategy::Mean.pool(&v, &mask)?;

        assert_eq!(pooled.to_vec2::<f32>()?, vec![vec![2., 2.], vec![4., 8.]]);
        Ok(())
    }

    #[test]
    fn test_pool_config_deserialization() -> Result<()> {
        let config: PoolConfig = serde_json::from_str(
            r#"{
                "word_embedding_dimension": 1024,
                "pooling_mode_cls_token": true,
                "pooling_mode_mean_tokens": false,
                "pooling_mode_max_tokens": false,
                "pooling_mode_mean_sqrt_len_tokens": false
            }"#,
        )?;

        assert!(config.pooling_mode_cls_token);
        assert!(!config.pooling_mode_mean_tokens);
        Ok(())
    }
}
