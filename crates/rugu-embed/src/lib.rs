#![doc = include_str!("../README.md")]

pub mod core;
mod error;
pub mod pooling;

pub use crate::core::device::DeviceKind;
pub use crate::core::repo::ModelRepo;
pub use crate::core::sentence_transformer::{SentenceTransformer, SentenceTransformerBuilder};
pub use candle_core::Device;
pub use error::{Error, Result};
pub use pooling::PoolingStrategy;
