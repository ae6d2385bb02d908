use serde::{Deserialize, Deserializer, Serialize};

fn default_encoding_format() -> String {
    "float".to_string()
}

/// `model` may be left out, but not sent as `null`.
fn non_null_model<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(Some)
}

/// Unicode whitespace plus the ASCII information separators U+001C to U+001F, the same set
/// Python's `str.split()` breaks on.
fn is_token_separator(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingsRequest {
    pub input: Sentences,
    /// Echoed back in the response. Does not select a model.
    #[serde(default, deserialize_with = "non_null_model")]
    pub model: Option<String>,
    /// Accepted for OpenAI compatibility. Embeddings are always returned as floats.
    #[serde(default = "default_encoding_format")]
    pub encoding_format: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub total_tokens: usize,
}

impl Usage {
    /// Whitespace separated word counts summed over all sentences. This is not the model's
    /// tokenization, and clients rely on it staying that way.
    pub fn from_sentences(sentences: &[String]) -> Self {
        let prompt_tokens = sentences
            .iter()
            .map(|sentence| {
                sentence
                    .split(is_token_separator)
                    .filter(|word| !word.is_empty())
                    .count()
            })
            .sum();

        Self {
            prompt_tokens,
            total_tokens: prompt_tokens,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EmbeddingsResponse {
    pub data: Vec<EmbeddingData>,
    pub model: String,
    pub usage: Usage,
}

impl EmbeddingsResponse {
    pub fn from_embeddings(embeddings: Vec<Vec<f32>>, usage: Usage, model: String) -> Self {
        let data = embeddings
            .into_iter()
            .enumerate()
            .map(|(index, embedding)| EmbeddingData {
                embedding,
                index,
                object: "embedding".to_string(),
            })
            .collect();

        EmbeddingsResponse { data, model, usage }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EmbeddingData {
    pub embedding: Vec<f32>,
    pub index: usize,
    pub object: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum Sentences {
    Single(String),
    Multiple(Vec<String>),
}

impl From<String> for Sentences {
    fn from(s: String) -> Self {
        Self::Single(s)
    }
}

impl From<Vec<&str>> for Sentences {
    fn from(strings: Vec<&str>) -> Self {
        Self::Multiple(strings.into_iter().map(|s| s.to_string()).collect())
    }
}

impl From<Vec<String>> for Sentences {
    fn from(strings: Vec<String>) -> Self {
        Self::Multiple(strings)
    }
}

impl From<Sentences> for Vec<String> {
    fn from(sentences: Sentences) -> Self {
        match sentences {
            Sentences::Single(s) => vec![s],
            Sentences::Multiple(vec) => vec,
        }
    }
}

/// `GET /`
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub model: String,
    pub dimensions: usize,
}

/// `GET /health`
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
}

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}
