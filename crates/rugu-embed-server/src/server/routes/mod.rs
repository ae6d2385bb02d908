pub mod default;
pub mod embeddings;
pub mod models;
