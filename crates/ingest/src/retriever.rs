use std::collections::HashSet;

use paperchat_core::Outcome;
use tracing::{debug, warn};

use crate::document::chunker::Chunk;
use crate::embedding::Embedder;
use crate::index::DocumentIndex;

pub const DEFAULT_TOP_K: usize = 8;

/// Top-`k` chunks of `doc` closest to `query`, nearest first.
///
/// `k` is clamped to the number of chunks and duplicate ids from the index are
/// dropped. Embedding or search failures yield `Degraded` rather than an error
/// so the caller can continue without grounding.
pub async fn retrieve(
    query: &str,
    doc: &DocumentIndex,
    embedder: &dyn Embedder,
    k: usize,
) -> Outcome<Vec<Chunk>> {
    let k = k.min(doc.len());
    if k == 0 {
        return Outcome::Ok(Vec::new());
    }

    let query_vector = match embedder.embed_batch(&[query]).await {
        Ok(mut vectors) if vectors.len() == 1 => vectors.remove(0),
        Ok(vectors) => {
            warn!(returned = vectors.len(), "query embedding returned unexpected batch size");
            return Outcome::degraded("query embedding returned no vector");
        }
        Err(e) => {
            warn!(error = %e, "query embedding failed");
            return Outcome::degraded(format!("query embedding failed: {e}"));
        }
    };

    let hits = match doc.index().search(&query_vector, k) {
        Ok(hits) => hits,
        Err(e) => {
            warn!(error = %e, "document search failed");
            return Outcome::degraded(format!("document search failed: {e}"));
        }
    };

    let mut seen = HashSet::with_capacity(hits.len());
    let chunks: Vec<Chunk> = hits
        .into_iter()
        .filter(|(id, _)| seen.insert(*id))
        .filter_map(|(id, _)| doc.chunks().get(id).cloned())
        .collect();

    debug!(requested = k, returned = chunks.len(), "retrieved chunks");
    Outcome::Ok(chunks)
}
