//! Overlapping fixed-size text chunks

/// Splits text into windows of `chunk_size` characters that share
/// `chunk_overlap` characters with their predecessor.
///
/// A window end is pulled back to the last whitespace in the back half of the
/// window so words are not cut when avoidable.
#[derive(Debug, Clone, Copy)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    /// `chunk_overlap` is capped below `chunk_size`; a zero size becomes 1.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < len {
            let mut end = (start + self.chunk_size).min(len);

            if end < len {
                let back_half = start + self.chunk_size / 2 + 1;
                if let Some(pos) = (back_half..end).rev().find(|&i| chars[i].is_whitespace()) {
                    end = pos;
                }
            }

            let chunk: String = chars[start..end].iter().collect();
            let chunk = chunk.trim();
            if !chunk.is_empty() {
                chunks.push(chunk.to_string());
            }

            if end >= len {
                break;
            }

            let next = end.saturating_sub(self.chunk_overlap);
            start = if next > start { next } else { end };
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text() {
        assert!(TextSplitter::new(512, 50).split("").is_empty());
        assert!(TextSplitter::new(512, 50).split("   \n ").is_empty());
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunks = TextSplitter::new(512, 50).split("TSMC beats estimates.");
        assert_eq!(chunks, vec!["TSMC beats estimates.".to_string()]);
    }

    #[test]
    fn test_chunks_respect_size_and_overlap() {
        let text = "abcdefghijklmnopqrstuvwxyz";
        let chunks = TextSplitter::new(10, 3).split(text);

        assert_eq!(chunks[0], "abcdefghij");
        assert_eq!(chunks[1], "hijklmnopq");
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert_eq!(chunks.last().map(String::as_str), Some("vwxyz"));
    }

    #[test]
    fn test_breaks_at_whitespace() {
        let text = "alpha beta gamma delta epsilon";
        let chunks = TextSplitter::new(12, 0).split(text);

        assert_eq!(chunks[0], "alpha beta");
        assert!(chunks.iter().all(|c| !c.starts_with(' ') && !c.ends_with(' ')));
        assert_eq!(chunks.join(" "), text);
    }

    #[test]
    fn test_overlap_larger_than_size_still_progresses() {
        let chunks = TextSplitter::new(4, 100).split("abcdefgh");
        assert!(!chunks.is_empty());
        assert!(chunks.len() < 10);
    }

    #[test]
    fn test_multibyte_text() {
        let chunks = TextSplitter::new(3, 1).split("台積電營收成長");
        assert_eq!(chunks[0], "台積電");
        assert_eq!(chunks[1], "電營收");
    }
}
