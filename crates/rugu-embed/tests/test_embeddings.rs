//! Tests against real model weights. They download from the Hugging Face Hub, so they are
//! ignored by default: `cargo test -p rugu-embed -- --ignored`.

use approx::assert_relative_eq;
use rugu_embed::{Result, SentenceTransformer};

const MODEL_REPO: &str = "sentence-transformers/all-MiniLM-L6-v2";

fn encoder() -> Result<SentenceTransformer> {
    SentenceTransformer::builder()
        .with_model_repo(MODEL_REPO)?
        .build()
}

fn sentences() -> Vec<&'static str> {
    vec![
        "The cat sits outside",
        "A man is playing guitar",
        "I love pasta",
        "The new movie is awesome, the actors were great and the soundtrack too",
    ]
}

fn assert_vectors_eq(a: &[f32], b: &[f32]) {
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b) {
        assert_relative_eq!(*x, *y, epsilon = 1e-4);
    }
}

#[test]
#[ignore = "downloads model weights"]
fn test_embeddings_are_unit_length() -> Result<()> {
    let encoder = encoder()?;

    let embeddings = encoder.embed(&sentences())?;

    assert_eq!(embeddings.len(), sentences().len());
    for embedding in embeddings {
        assert_eq!(embedding.len(), encoder.dimensions());
        let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert_relative_eq!(norm, 1.0, epsilon = 1e-4);
    }
    Ok(())
}

#[test]
#[ignore = "downloads model weights"]
fn test_order_is_preserved_when_reversed() -> Result<()> {
    let encoder = encoder()?;
    let forward = sentences();
    let mut backward = forward.clone();
    backward.reverse();

    let forward = encoder.embed(&forward)?;
    let backward = encoder.embed(&backward)?;

    let n = forward.len();
    for i in 0..n {
        assert_vectors_eq(&forward[i], &backward[n - 1 - i]);
    }
    Ok(())
}

#[test]
#[ignore = "downloads model weights"]
fn test_padding_does_not_change_embeddings() -> Result<()> {
    let encoder = encoder()?;

    // The short sentence is padded when batched with the long one.
    let batched = encoder.embed(&sentences())?;
    let alone = encoder.embed(&[sentences()[0]])?;

    assert_vectors_eq(&batched[0], &alone[0]);
    Ok(())
}

#[test]
#[ignore = "downloads model weights"]
fn test_similar_sentences_score_higher() -> Result<()> {
    let encoder = encoder()?;

    let embeddings = encoder.embed(&["The cat sits outside", "The cat sits", "I love pasta"])?;
    let dot = |a: &[f32], b: &[f32]| a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();

    assert!(dot(&embeddings[0], &embeddings[1]) > dot(&embeddings[0], &embeddings[2]));
    Ok(())
}

#[test]
#[ignore = "downloads model weights"]
fn test_bge_m3_embeddings() -> Result<()> {
    let encoder = SentenceTransformer::builder()
        .with_model_repo("BAAI/bge-m3")?
        .build()?;
    assert_eq!(encoder.dimensions(), 1024);

    let forward = sentences();
    let mut backward = forward.clone();
    backward.reverse();

    let forward = encoder.embed(&forward)?;
    let backward = encoder.embed(&backward)?;
    let alone = encoder.embed(&[sentences()[0]])?;

    let n = forward.len();
    for i in 0..n {
        let norm = forward[i].iter().map(|x| x * x).sum::<f32>().sqrt();
        assert_relative_eq!(norm, 1.0, epsilon = 1e-4);
        assert_vectors_eq(&forward[i], &backward[n - 1 - i]);
    }
    assert_vectors_eq(&forward[0], &alone[0]);
    Ok(())
}
