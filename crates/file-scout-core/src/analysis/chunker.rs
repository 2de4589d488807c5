//! Word-boundary-aligned partitioning of text for the counting workers.
//!
//! Boundaries are only placed next to ASCII whitespace. ASCII bytes never
//! occur inside a multi-byte UTF-8 sequence, so every boundary in valid UTF-8
//! text is also a char boundary.

use crate::error::{Error, Result};

/// Byte offsets of the `n - 1` inner boundaries plus both ends, so segment
/// `i` is `offsets[i]..offsets[i + 1]`.
fn chunk_offsets(content: &[u8], n: usize) -> Result<Vec<usize>> {
    if n == 0 {
        return Err(Error::invalid("chunk count must be greater than zero"));
    }

    let len = content.len();
    let mut offsets = Vec::with_capacity(n + 1);
    offsets.push(0);

    let mut previous = 0;
    for i in 1..n {
        let target = (len * i / n).max(previous);
        let cut = next_cut(content, target);
        offsets.push(cut);
        previous = cut;
    }

    offsets.push(len);
    Ok(offsets)
}

/// Split raw bytes into `n` contiguous segments.
pub fn split(content: &[u8], n: usize) -> Result<Vec<&[u8]>> {
    let offsets = chunk_offsets(content, n)?;
    Ok(offsets.windows(2).map(|w| &content[w[0]..w[1]]).collect())
}

/// First position at or after `pos` that does not fall between two
/// non-whitespace bytes.
fn next_cut(content: &[u8], mut pos: usize) -> usize {
    let len = content.len();
    while pos > 0 && pos < len {
        if content[pos - 1].is_ascii_whitespace() || content[pos].is_ascii_whitespace() {
            break;
        }
        pos += 1;
    }
    pos
}
