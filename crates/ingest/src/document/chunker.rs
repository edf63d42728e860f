//! Word-window chunking.
//!
//! Splits the filtered page text into fixed-size windows of whitespace
//! delimited words, each window overlapping its predecessor.

use super::{IgnoreSet, PageText};

// ── Configuration ───────────────────────────────────────────────────────────

/// Configuration for the chunking engine.
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// Target words per chunk (default: 400).
    pub chunk_words: usize,
    /// Words shared with the previous chunk (default: 60).
    pub overlap_words: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_words: 400,
            overlap_words: 60,
        }
    }
}

impl ChunkConfig {
    /// Distance between consecutive chunk starts.
    ///
    /// An overlap that is not smaller than the chunk size would make the step
    /// non-positive; such configs fall back to non-overlapping windows.
    pub fn step(&self) -> usize {
        let size = self.chunk_words.max(1);
        if self.overlap_words >= size {
            size
        } else {
            size - self.overlap_words
        }
    }
}

// ── Chunk output ────────────────────────────────────────────────────────────

/// A contiguous window of document words. `index` is also the vector id of
/// the chunk's embedding in the document index.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub index: usize,
    pub content: String,
    /// Offset of the first word in the document's word stream.
    pub word_offset: usize,
    pub word_count: usize,
}

/// Join non-ignored, non-blank pages with newlines.
///
/// Returns the joined text and the number of pages that contributed to it.
pub fn join_pages(pages: &PageText, ignored: &IgnoreSet) -> (String, usize) {
    let kept: Vec<&str> = pages
        .iter()
        .enumerate()
        .filter(|(i, page)| !ignored.contains(i) && !page.trim().is_empty())
        .map(|(_, page)| page.as_str())
        .collect();
    (kept.join("\n"), kept.len())
}

/// Split `text` into overlapping word windows, left to right.
/// The last window may be shorter than `chunk_words`.
pub fn chunk_text(text: &str, config: &ChunkConfig) -> Vec<Chunk> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }

    let size = config.chunk_words.max(1);
    (0..words.len())
        .step_by(config.step())
        .enumerate()
        .map(|(index, start)| {
            let end = (start + size).min(words.len());
            Chunk {
                index,
                content: words[start..end].join(" "),
                word_offset: start,
                word_count: end - start,
            }
        })
        .collect()
}
