use rugu_embed::{Error, SentenceTransformer};
use std::process::ExitCode;

fn main() -> Result<ExitCode, Error> {
    let sentences = vec![
        "The cat sits outside",
        "A man is playing guitar",
        "I love pasta",
        "The new movie is awesome",
        "The cat plays in the garden",
        "A woman watches TV",
        "The new movie is so great",
        "Do you like pizza?",
        "The cat sits",
    ];

    let encoder = SentenceTransformer::builder()
        .with_model_repo("BAAI/bge-m3")?
        .build()?;

    let embeddings = encoder.embed(&sentences)?;

    let n_sentences = embeddings.len();
    let mut similarities = Vec::with_capacity(n_sentences * (n_sentences - 1) / 2);

    // Embeddings are unit length, so the dot product is the cosine similarity.
    for i in 0..n_sentences {
        for j in (i + 1)..n_sentences {
            let score: f32 = embeddings[i]
                .iter()
                .zip(&embeddings[j])
                .map(|(a, b)| a * b)
                .sum();
            similarities.push((score, i, j))
        }
    }

    similarities.sort_by(|u, v| v.0.total_cmp(&u.0));
    for &(score, i, j) in similarities[..5].iter() {
        println!("score: {score:.2} '{}' '{}'", sentences[i], sentences[j])
    }

    Ok(ExitCode::SUCCESS)
}
