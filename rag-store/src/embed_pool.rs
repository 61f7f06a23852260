//! Concurrent embedding executor with order restoration.

use futures::stream::{self, StreamExt};
use tracing::debug;

use crate::embed::EmbeddingsProvider;
use crate::errors::RagError;

/// Embeds `texts` with at most `concurrency` requests in flight.
///
/// Completion order is arbitrary; the output is re-assembled by index so it
/// always matches the input order. Any single failure fails the whole batch.
pub(crate) async fn embed_ordered(
    provider: &dyn EmbeddingsProvider,
    texts: &[String],
    concurrency: usize,
) -> Result<Vec<Vec<f32>>, RagError> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    debug!(
        total = texts.len(),
        concurrency, "embed_pool::embed_ordered"
    );

    let mut futures = Vec::with_capacity(texts.len());
    for (i, text) in texts.iter().enumerate() {
        let fut = provider.embed(text);
        futures.push(async move { Ok::<(usize, Vec<f32>), RagError>((i, fut.await?)) });
    }

    let results: Vec<(usize, Vec<f32>)> = stream::iter(futures)
        .buffer_unordered(concurrency.max(1))
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .collect::<Result<Vec<_>, RagError>>()?;

    let mut out = vec![Vec::new(); texts.len()];
    for (i, v) in results {
        out[i] = v;
    }
    Ok(out)
}
