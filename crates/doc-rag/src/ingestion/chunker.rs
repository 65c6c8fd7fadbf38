//! Sliding-window text chunking with sentence-boundary preference

use crate::config::ChunkingConfig;
use crate::types::TextSpan;

/// Text chunker with configurable size and overlap
///
/// Windows are measured in characters. A window that does not reach the end
/// of the text is cut after its last `.` or newline when that boundary lies
/// beyond `boundary_ratio * chunk_size`; otherwise it is hard-cut.
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap between chunks
    overlap: usize,
    /// Minimum relative position of a usable sentence break
    boundary_ratio: f64,
}

impl TextChunker {
    /// Create a new chunker
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            overlap: overlap.min(chunk_size.saturating_sub(1)),
            boundary_ratio: 0.5,
        }
    }

    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap).with_boundary_ratio(config.boundary_ratio)
    }

    pub fn with_boundary_ratio(mut self, ratio: f64) -> Self {
        self.boundary_ratio = ratio;
        self
    }

    /// Effective window size after clamping
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Effective overlap, always below the window size
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split text into ordered, overlapping spans
    pub fn chunk_text(&self, text: &str) -> Vec<TextSpan> {
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();

        let mut spans = Vec::new();
        let mut start = 0usize;
        let mut prev_end: Option<usize> = None;

        while start < len {
            let mut end = (start + self.chunk_size).min(len);

            if end < len {
                if let Some(pos) = self.find_break(&chars[start..end]) {
                    end = start + pos + 1;
                }
            }

            let window: String = chars[start..end].iter().collect();
            let trimmed = window.trim();

            if !trimmed.is_empty() {
                let overlap_chars = prev_end.filter(|&p| p > start).map(|p| p - start);
                spans.push(TextSpan {
                    index: spans.len() as u32,
                    text: trimmed.to_string(),
                    char_start: start,
                    char_end: end,
                    overlap_chars,
                });
                prev_end = Some(end);
            }

            if end >= len {
                break;
            }

            // Always move forward, even if a short sentence cut sits inside the overlap
            start = end.saturating_sub(self.overlap).max(start + 1);
        }

        tracing::debug!("Created {} chunks from {} characters", spans.len(), len);
        spans
    }

    /// Position of the last usable sentence break in a window
    fn find_break(&self, window: &[char]) -> Option<usize> {
        let pos = window.iter().rposition(|&c| c == '.' || c == '\n')?;
        let threshold = self.chunk_size as f64 * self.boundary_ratio;
        ((pos as f64) > threshold).then_some(pos)
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(1000, 200)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Text with no sentence breaks and no whitespace, so windows are never adjusted or trimmed
    fn plain_text(len: usize) -> String {
        "abcdefghijklmnopqrstuvwxyz".chars().cycle().take(len).collect()
    }

    fn expected_count(len: usize, size: usize, overlap: usize) -> usize {
        if len <= size {
            1
        } else {
            (len - overlap).div_ceil(size - overlap)
        }
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunker = TextChunker::default();
        let spans = chunker.chunk_text("One paragraph about ferrous oxide. It is short.");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "One paragraph about ferrous oxide. It is short.");
        assert_eq!(spans[0].overlap_chars, None);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert!(TextChunker::default().chunk_text("").is_empty());
        assert!(TextChunker::default().chunk_text("   \n  ").is_empty());
    }

    #[test]
    fn test_chunk_count_matches_window_formula() {
        for &(len, size, overlap) in &[
            (1000, 1000, 200),
            (1001, 1000, 200),
            (2600, 1000, 200),
            (5000, 1000, 200),
            (333, 100, 10),
            (10_000, 512, 64),
        ] {
            let chunker = TextChunker::new(size, overlap);
            let spans = chunker.chunk_text(&plain_text(len));
            assert_eq!(
                spans.len(),
                expected_count(len, size, overlap),
                "len={} size={} overlap={}",
                len,
                size,
                overlap
            );
        }
    }

    #[test]
    fn test_settings_are_clamped() {
        let chunker = TextChunker::new(10, 50);
        assert_eq!(chunker.chunk_size(), 10);
        assert_eq!(chunker.overlap(), 9);

        let chunker = TextChunker::new(0, 0);
        assert_eq!(chunker.chunk_size(), 1);
        assert_eq!(chunker.overlap(), 0);
    }

    #[test]
    fn test_consecutive_chunks_share_overlap() {
        let chunker = TextChunker::new(100, 20);
        let spans = chunker.chunk_text(&plain_text(450));

        for pair in spans.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            assert_eq!(prev.char_end - next.char_start, 20);
            assert_eq!(next.overlap_chars, Some(20));

            let tail: String = prev.text.chars().skip(prev.text.chars().count() - 20).collect();
            assert!(next.text.starts_with(&tail));
        }

        assert_eq!(spans.last().unwrap().char_end, 450);
    }

    #[test]
    fn test_prefers_sentence_boundary() {
        let mut text = "a".repeat(70);
        text.push('.');
        text.push_str(&"b".repeat(100));

        let chunker = TextChunker::new(100, 10);
        let spans = chunker.chunk_text(&text);

        assert!(spans[0].text.ends_with('.'));
        assert_eq!(spans[0].char_end, 71);
        assert_eq!(spans[1].char_start, 61);
    }

    #[test]
    fn test_boundary_too_early_falls_back_to_hard_cut() {
        let mut text = "a".repeat(30);
        text.push('.');
        text.push_str(&"b".repeat(200));

        let chunker = TextChunker::new(100, 10);
        let spans = chunker.chunk_text(&text);

        assert_eq!(spans[0].char_end, 100);
        assert_eq!(spans[0].text.chars().count(), 100);
    }

    #[test]
    fn test_newline_counts_as_boundary() {
        let mut text = "x".repeat(80);
        text.push('\n');
        text.push_str(&"y".repeat(80));

        let spans = TextChunker::new(100, 10).chunk_text(&text);
        assert_eq!(spans[0].text, "x".repeat(80));
        assert_eq!(spans[0].char_end, 81);
    }

    #[test]
    fn test_multibyte_characters() {
        let text: String = "日本語のテキスト。".repeat(40);
        let spans = TextChunker::new(50, 5).chunk_text(&text);
        assert!(!spans.is_empty());
        assert!(spans.iter().all(|s| s.text.chars().count() <= 50));
    }

    #[test]
    fn test_large_overlap_still_terminates() {
        let mut text = String::new();
        for _ in 0..50 {
            text.push_str(&"w".repeat(55));
            text.push('.');
        }
        let spans = TextChunker::new(100, 90).chunk_text(&text);
        assert!(!spans.is_empty());
        assert_eq!(spans.last().unwrap().char_end, text.chars().count());
    }
}
