use hf_hub::api::sync::{Api, ApiRepo};
use hf_hub::{Repo, RepoType};
use std::path::{Path, PathBuf};

use crate::core::config::model::SentenceTransformerConfig;
use crate::core::config::parse::parse_config;
use crate::core::utils::parse_repo_string;
use crate::{Error, Result};

/// A folder with model weights structured as a repository on HF Hub, or the Hub
/// repository itself.
pub enum ModelRepo {
    Folder(PathBuf),
    ApiRepo(Box<ApiRepo>),
}

const CONFIG_FILE: &str = "config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const SAFETENSORS_FILE: &str = "model.safetensors";
const PTH_FILE: &str = "pytorch_model.bin";
const POOLING_CONFIG_FILE: &str = "1_Pooling/config.json";

impl ModelRepo {
    pub fn from_path<P>(root: P) -> Self
    where
        P: AsRef<Path>,
    {
        Self::Folder(root.as_ref().to_owned())
    }

    pub fn from_api_repo(api_repo: ApiRepo) -> Self {
        Self::ApiRepo(Box::new(api_repo))
    }

    /// Point at a Hub repository given as `repo_id[:revision]`.
    pub fn from_repo_string(repo_string: &str) -> Result<Self> {
        let (repo_id, revision) = parse_repo_string(repo_string)?;
        let repo = Repo::with_revision(repo_id.to_owned(), RepoType::Model, revision.to_owned());
        let api = Api::new()?;

        Ok(Self::from_api_repo(api.repo(repo)))
    }

    /// Get the relevant repository files.
    ///
    /// **Warning**: Will download model weights if not present in the expected
    /// folder in the Huggingface cache.
    pub(crate) fn file_paths(&self) -> Result<ModelRepoFiles> {
        let root = match self {
            ModelRepo::Folder(pathbuf) => pathbuf.to_owned(),
            ModelRepo::ApiRepo(api_repo) => {
                let model_path = api_repo
                    .get(SAFETENSORS_FILE)
                    .or_else(|_e| api_repo.get(PTH_FILE))?;

                let _ = api_repo.get(CONFIG_FILE)?;

                let _ = api_repo.get(TOKENIZER_FILE)?;

                if api_repo.get(POOLING_CONFIG_FILE).is_err() {
                    tracing::info!(
                        "No pooling configuration found. Using default or given strategy."
                    );
                }

                model_path
                    .parent()
                    .ok_or(Error::ModelLoad("Model path has no parent directory."))?
                    .to_owned()
            }
        };
        let config = root.join(CONFIG_FILE);
        let tokenizer_config = root.join(TOKENIZER_FILE);

        for p in [&config, &tokenizer_config] {
            if !p.exists() {
                return Err(Error::ModelLoad("Repository misses configuration files."));
            }
        }

        // Safetensors get precedence over pth.
        let model_weights = if root.join(SAFETENSORS_FILE).exists() {
            ModelWeightsPath::Safetensors(root.join(SAFETENSORS_FILE))
        } else if root.join(PTH_FILE).exists() {
            ModelWeightsPath::Pth(root.join(PTH_FILE))
        } else {
            return Err(Error::ModelLoad(
                "Repository doesn't contain model weights.",
            ));
        };

        let pooling_config = Some(root.join(POOLING_CONFIG_FILE)).filter(|p| p.exists());

        Ok(ModelRepoFiles {
            config,
            tokenizer_config,
            model_weights,
            pooling_config,
        })
    }

    pub fn get_config(&self) -> Result<SentenceTransformerConfig> {
        parse_config(self, None)
    }
}

pub(crate) struct ModelRepoFiles {
    pub(crate) config: PathBuf,
    pub(crate) tokenizer_config: PathBuf,
    pub(crate) model_weights: ModelWeightsPath,
    pub(crate) pooling_config: Option<PathBuf>,
}

#[derive(Debug)]
pub(crate) enum ModelWeightsPath {
    Pth(PathBuf),
    Safetensors(PathBuf),
}
