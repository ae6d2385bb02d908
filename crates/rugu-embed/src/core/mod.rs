pub mod config;
pub mod device;
pub mod embedder;
pub mod repo;
pub mod sentence_transformer;
pub mod utils;
