use candle_core::Tensor;

use crate::{Error, Result};

/// Scale every row of a `(batch, hidden)` tensor to unit Euclidean length.
pub fn normalize_l2(v: &Tensor) -> candle_core::Result<Tensor> {
    v.broadcast_div(&v.sqr()?.sum_keepdim(1)?.sqrt()?)
}

/// Split `repo_id[:revision]` into its parts. The revision defaults to `main`.
pub fn parse_repo_string(repo_string: &str) -> Result<(&str, &str)> {
    // Fail if the repo string is empty
    if repo_string.is_empty() {
        return Err(Error::InvalidModelName("Model repository string is empty"));
    }

    // Fail if the repo string contains illegal characters
    const ILLEGAL_CHARS: [char; 6] = ['\\', '<', '>', '|', '?', '*'];
    if repo_string.chars().any(|c| ILLEGAL_CHARS.contains(&c)) {
        return Err(Error::InvalidModelName(
            "Model repository string contains illegal characters",
        ));
    }

    let (model_repo, revision) = match repo_string.split_once(':') {
        Some((model_repo, revision)) => (model_repo, revision),
        None => (repo_string, ""),
    };

    if model_repo.is_empty() {
        return Err(Error::InvalidModelName("Model repository id is empty"));
    }

    let revision = if revision.is_empty() { "main" } else { revision };

    Ok((model_repo, revision))
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use candle_core::Device;

    #[test]
    fn test_parse_repo_string() -> Result<()> {
        let (model_repo, revision) = parse_repo_string("BAAI/bge-m3:refs/pr/21")?;
        assert_eq!(model_repo, "BAAI/bge-m3");
        assert_eq!(revision, "refs/pr/21");

        let (model_repo, revision) = parse_repo_string("BAAI/bge-m3")?;
        assert_eq!(model_repo, "BAAI/bge-m3");
        assert_eq!(revision, "main");

        let (model_repo, revision) = parse_repo_string("BAAI/bge-m3:")?;
        assert_eq!(model_repo, "BAAI/bge-m3");
        assert_eq!(revision, "main");

        assert!(parse_repo_string("").is_err());
        assert!(parse_repo_string(":main").is_err());
        assert!(parse_repo_string("BAAI/bge-m3*").is_err());

        Ok(())
    }

    #[test]
    fn test_normalize_l2() -> Result<()> {
        let v = Tensor::new(&[[3f32, 4.], [0., 2.]], &Device::Cpu)?;
        let v = normalize_l2(&v)?.to_vec2::<f32>()?;

        assert_relative_eq!(v[0][0], 0.6, epsilon = 1e-6);
        assert_relative_eq!(v[0][1], 0.8, epsilon = 1e-6);
        assert_relative_eq!(v[1][0], 0.0, epsilon = 1e-6);
        assert_relative_eq!(v[1][1], 1.0, epsilon = 1e-6);

        Ok(())
    }
}
