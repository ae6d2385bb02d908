use clap::Args;
use rugu_embed::{DeviceKind, PoolingStrategy};
use std::path::PathBuf;

/// Which model to serve and how to present it.
#[derive(Debug, Clone, Args)]
pub struct ModelArgs {
    /// Hugging Face Hub repository to load, as `repo_id[:revision]`
    #[clap(short, long, env = "RUGU_EMBED_MODEL_REPO", default_value = "BAAI/bge-m3")]
    pub model_repo: String,

    /// Local folder with `config.json`, `tokenizer.json` and weights. Overrides `--model-repo`
    #[clap(long, env = "RUGU_EMBED_MODEL_FOLDER")]
    pub model_folder: Option<PathBuf>,

    /// Name the model is served under
    #[clap(long, env = "RUGU_EMBED_MODEL_NAME", default_value = "bge-m3")]
    pub model_name: String,

    /// Advertised embedding dimensionality
    #[clap(long, env = "RUGU_EMBED_DIMENSIONS", default_value_t = 1024)]
    pub dimensions: usize,

    #[clap(long, value_enum, env = "RUGU_EMBED_DEVICE", default_value_t = DeviceKind::Cpu)]
    pub device: DeviceKind,

    /// Pooling override. Read from the model repository when absent
    #[clap(long, value_enum, env = "RUGU_EMBED_POOLING")]
    pub pooling: Option<PoolingStrategy>,
}

impl ModelArgs {
    /// Where the weights come from: the local folder if given, else the Hub repository.
    pub fn model_source(&self) -> String {
        match &self.model_folder {
            Some(folder) => folder.display().to_string(),
            None => self.model_repo.clone(),
        }
    }
}

impl Default for ModelArgs {
    fn default() -> Self {
        Self {
            model_repo: "BAAI/bge-m3".to_string(),
            model_folder: None,
            model_name: "bge-m3".to_string(),
            dimensions: 1024,
            device: DeviceKind::Cpu,
            pooling: None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct Cli {
        #[clap(flatten)]
        model_args: ModelArgs,
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["rugu-embed-server"]);

        assert_eq!(cli.model_args.model_repo, "BAAI/bge-m3");
        assert_eq!(cli.model_args.model_name, "bge-m3");
        assert_eq!(cli.model_args.dimensions, 1024);
        assert_eq!(cli.model_args.device, DeviceKind::Cpu);
        assert_eq!(cli.model_args.pooling, None);
        assert_eq!(cli.model_args.model_source(), "BAAI/bge-m3");
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::parse_from([
            "rugu-embed-server",
            "--model-folder",
            "/models/minilm",
            "--model-name",
            "minilm",
            "--dimensions",
            "384",
            "--pooling",
            "mean",
        ]);

        assert_eq!(cli.model_args.model_name, "minilm");
        assert_eq!(cli.model_args.dimensions, 384);
        assert_eq!(cli.model_args.pooling, Some(PoolingStrategy::Mean));
        assert_eq!(cli.model_args.model_source(), "/models/minilm");
    }
}
