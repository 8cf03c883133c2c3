//! Splits extracted document text into overlapping, bounded-size chunks.
//!
//! The splitter walks the text with a sliding window of `max_size`
//! characters. When a window does not reach the end of the text, its right
//! edge snaps back to the most recent natural boundary — paragraph break,
//! line break, sentence end, then word gap — and falls back to a plain
//! character split when no boundary leaves enough room to make progress.
//! The next window starts `overlap` characters before the previous end, so
//! consecutive chunks always share exactly `overlap` characters and the
//! chunks together cover the source text contiguously.

use crate::error::PipelineError;

/// Boundary kinds tried from coarsest to finest.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

/// Default chunk width in characters.
pub const DEFAULT_MAX_SIZE: usize = 500;
/// Default overlap between consecutive chunks in characters.
pub const DEFAULT_OVERLAP: usize = 50;

/// Character-oriented text splitter with fixed overlap.
#[derive(Clone, Debug)]
pub struct Chunker {
    max_size: usize,
    overlap: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

impl Chunker {
    /// Creates a splitter producing chunks of at most `max_size` characters
    /// with `overlap` shared characters between neighbours.
    ///
    /// `overlap` must be strictly smaller than `max_size`, otherwise the
    /// window could never advance.
    pub fn new(max_size: usize, overlap: usize) -> Result<Self, PipelineError> {
        if max_size == 0 {
            return Err(PipelineError::Config(
                "chunk max_size must be positive".into(),
            ));
        }
        if overlap >= max_size {
            return Err(PipelineError::Config(format!(
                "chunk overlap {overlap} must be smaller than max_size {max_size}"
            )));
        }
        Ok(Self { max_size, overlap })
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Splits `text` into ordered chunks. Empty input yields no chunks; a
    /// text that fits in one window is returned whole. Deterministic for
    /// identical input and parameters.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        // Byte offset of every char boundary, plus the end sentinel, so the
        // window arithmetic runs over characters rather than bytes.
        let mut offsets: Vec<usize> = text.char_indices().map(|(pos, _)| pos).collect();
        offsets.push(text.len());
        let total_chars = offsets.len() - 1;

        if total_chars <= self.max_size {
            return vec![text.to_string()];
        }

        let mut chunks = Vec::new();
        let mut start = 0usize;
        loop {
            let window_end = (start + self.max_size).min(total_chars);
            let end = if window_end < total_chars {
                self.snap_to_boundary(text, &offsets, start, window_end)
            } else {
                window_end
            };

            chunks.push(text[offsets[start]..offsets[end]].to_string());

            if end == total_chars {
                break;
            }
            start = end - self.overlap;
        }
        chunks
    }

    /// Picks the chunk end for the window `[start, window_end)`: the end of
    /// the latest separator occurrence that still lies past the overlap
    /// region (so the next window advances), or `window_end` when no
    /// separator qualifies.
    fn snap_to_boundary(
        &self,
        text: &str,
        offsets: &[usize],
        start: usize,
        window_end: usize,
    ) -> usize {
        let window = &text[offsets[start]..offsets[window_end]];
        for sep in SEPARATORS {
            if let Some(rel_bytes) = window.rfind(sep) {
                let sep_start_byte = offsets[start] + rel_bytes;
                let sep_start = match offsets.binary_search(&sep_start_byte) {
                    Ok(idx) => idx,
                    // rfind on a char-aligned window always lands on a boundary.
                    Err(idx) => idx,
                };
                let sep_end = sep_start + sep.chars().count();
                if sep_end > start + self.overlap && sep_end <= window_end {
                    return sep_end;
                }
            }
        }
        window_end
    }
}
