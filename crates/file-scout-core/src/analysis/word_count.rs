use ahash::AHashMap;
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::time::Instant;
use tracing::debug;

use super::chunker;
use crate::error::{Error, Result};
use crate::pool::build_pool;

/// Word counts from a single worker's chunk, before merging.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PartialCount {
    counts: AHashMap<String, u64>,
}

impl PartialCount {
    pub fn from_text(text: &str) -> Self {
        let mut partial = Self::default();
        for word in tokenize(text) {
            *partial.counts.entry(word.to_string()).or_insert(0) += 1;
        }
        partial
    }

    /// Sum per word. Associative and commutative, so the merged table does
    /// not depend on which worker finished first.
    pub fn merge(mut self, other: PartialCount) -> PartialCount {
        if self.counts.len() < other.counts.len() {
            return other.merge(self);
        }
        for (word, count) in other.counts {
            *self.counts.entry(word).or_insert(0) += count;
        }
        self
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }
}

/// Whitespace-separated tokens with leading and trailing non-alphanumeric
/// characters stripped. Case is preserved. Tokens that are only punctuation
/// are dropped.
pub fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
        .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|word| !word.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordCount {
    pub word: String,
    pub count: u64,
}

impl fmt::Display for WordCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.word, self.count)
    }
}

/// Merged word frequencies, ordered by descending count then ascending word.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct WordFrequencyTable {
    entries: Vec<WordCount>,
    total_words: u64,
}

impl WordFrequencyTable {
    pub fn entries(&self) -> &[WordCount] {
        &self.entries
    }

    pub fn total_words(&self) -> u64 {
        self.total_words
    }

    pub fn distinct_words(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, word: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|entry| entry.word == word)
            .map(|entry| entry.count)
    }

    /// The `n` most frequent words in presentation order.
    pub fn top(&self, n: usize) -> &[WordCount] {
        &self.entries[..n.min(self.entries.len())]
    }
}

impl From<PartialCount> for WordFrequencyTable {
    fn from(partial: PartialCount) -> Self {
        let total_words = partial.total();
        let mut entries: Vec<WordCount> = partial
            .counts
            .into_iter()
            .map(|(word, count)| WordCount { word, count })
            .collect();
        entries.sort_by(presentation_order);
        Self {
            entries,
            total_words,
        }
    }
}

fn presentation_order(a: &WordCount, b: &WordCount) -> Ordering {
    b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word))
}

/// Count words in `content` with `workers` threads, one task per non-empty
/// chunk. `workers` must already be validated against the configured cap.
///
/// All or nothing: if any chunk fails the whole count fails with
/// `Error::Processing` naming the chunk.
pub fn count(content: &[u8], workers: usize) -> Result<WordFrequencyTable> {
    if workers == 0 {
        return Err(Error::invalid("worker count must be greater than zero"));
    }

    let start = Instant::now();
    let chunks: Vec<(usize, &[u8])> = chunker::split(content, workers)?
        .into_iter()
        .enumerate()
        .filter(|(_, chunk)| !chunk.is_empty())
        .collect();

    if chunks.is_empty() {
        return Ok(WordFrequencyTable::default());
    }

    let pool = build_pool(workers, "count")?;
    let partials = pool.install(|| {
        chunks
            .par_iter()
            .map(|(index, chunk)| count_chunk(*index, chunk))
            .collect::<Result<Vec<PartialCount>>>()
    })?;

    let merged = partials
        .into_iter()
        .fold(PartialCount::default(), PartialCount::merge);
    let table = WordFrequencyTable::from(merged);

    debug!(
        "Counted {} words ({} distinct) across {} chunks in {:.3}s",
        table.total_words(),
        table.distinct_words(),
        chunks.len(),
        start.elapsed().as_secs_f64()
    );
    Ok(table)
}

fn count_chunk(index: usize, chunk: &[u8]) -> Result<PartialCount> {
    let text = std::str::from_utf8(chunk).map_err(|e| Error::Processing {
        chunk: index,
        reason: format!("invalid UTF-8: {}", e),
    })?;
    Ok(PartialCount::from_text(text))
}
