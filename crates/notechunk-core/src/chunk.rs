//! Paragraph- and sentence-aware text chunker.
//!
//! Splits note text into [`Chunk`]s of roughly `target_size` characters,
//! preferring paragraph boundaries, then sentence boundaries. A single
//! sentence longer than `target_size` is kept whole.
//!
//! # Algorithm
//!
//! 1. Trim the input. Blank input yields no chunks.
//! 2. If the trimmed text fits in `target_size`, return it as one chunk.
//! 3. Split on the paragraph separator and greedily pack consecutive
//!    paragraphs while `current + part + separator < target_size`.
//! 4. Any packed candidate still longer than `target_size` is re-split on
//!    sentence ends (`.`, `!`, `?` followed by whitespace) and packed the
//!    same way with a one-character joiner.
//! 5. Chunk `i ≥ 1` is prefixed with the last `overlap` characters of
//!    chunk `i - 1`, joined by a single space.
//! 6. Trim, drop blank chunks, and number the survivors.
//!
//! All lengths are counted in `char`s, never bytes.
//!
//! # Example
//!
//! ```rust
//! use notechunk_core::chunk::{chunk_text, ChunkingConfig};
//!
//! let config = ChunkingConfig::new(10, 0, "|").unwrap();
//! let chunks = chunk_text("AAAAA|BBBBB|CCCCC", "", &config);
//! let contents: Vec<&str> = chunks.iter().map(|c| c.content()).collect();
//! assert_eq!(contents, ["AAAAA", "BBBBB", "CCCCC"]);
//! ```

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::models::Chunk;

pub const DEFAULT_TARGET_SIZE: usize = 1000;
pub const DEFAULT_OVERLAP: usize = 200;
pub const DEFAULT_SEPARATOR: &str = "\n\n";

/// Sentence terminator followed by the whitespace run that ends it.
static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("sentence pattern is valid"));

/// Sizing rules for [`chunk_text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkingConfig {
    target_size: usize,
    overlap: usize,
    paragraph_separator: String,
}

impl ChunkingConfig {
    /// Build a config, rejecting combinations that would never converge.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] if `target_size` is zero, `overlap` is not
    /// smaller than `target_size`, or the separator is empty.
    pub fn new(
        target_size: usize,
        overlap: usize,
        paragraph_separator: impl Into<String>,
    ) -> Result<Self> {
        let paragraph_separator = paragraph_separator.into();
        if target_size == 0 {
            return Err(Error::Validation(
                "chunking target_size must be > 0".to_string(),
            ));
        }
        if overlap >= target_size {
            return Err(Error::Validation(format!(
                "chunking overlap ({overlap}) must be smaller than target_size ({target_size})"
            )));
        }
        if paragraph_separator.is_empty() {
            return Err(Error::Validation(
                "chunking paragraph separator must not be empty".to_string(),
            ));
        }
        Ok(Self {
            target_size,
            overlap,
            paragraph_separator,
        })
    }

    /// Same overlap and separator, different target size.
    pub fn with_target_size(&self, target_size: usize) -> Result<Self> {
        Self::new(target_size, self.overlap, self.paragraph_separator.clone())
    }

    pub fn target_size(&self) -> usize {
        self.target_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    pub fn paragraph_separator(&self) -> &str {
        &self.paragraph_separator
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            target_size: DEFAULT_TARGET_SIZE,
            overlap: DEFAULT_OVERLAP,
            paragraph_separator: DEFAULT_SEPARATOR.to_string(),
        }
    }
}

/// Split `text` into ordered, overlapping chunks.
///
/// Every returned chunk carries `title`, a contiguous `chunk_index`
/// starting at 0, and the same `total_chunks`. Blank input returns an
/// empty vector.
pub fn chunk_text(text: &str, title: &str, config: &ChunkingConfig) -> Vec<Chunk> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let target = config.target_size;
    if char_len(trimmed) <= target {
        return vec![Chunk::new(trimmed.to_string(), title, 0, 1)];
    }

    let mut pieces = Vec::new();
    for candidate in split_by_separator(trimmed, &config.paragraph_separator, target) {
        if char_len(&candidate) <= target {
            pieces.push(candidate);
            continue;
        }
        pieces.extend(split_by_sentences(&candidate, target));
    }

    let pieces = add_overlap(pieces, config.overlap);
    finalize(pieces, title, trimmed)
}

/// Chunk a note, prefixing the title as its own paragraph.
///
/// A note whose content is blank produces no chunks even when it has a
/// title, so an emptied note never gets a title-only index entry.
pub fn prepare_note(title: &str, content: &str, config: &ChunkingConfig) -> Vec<Chunk> {
    if content.trim().is_empty() {
        return Vec::new();
    }
    let title = title.trim();
    let full_text = if title.is_empty() {
        content.to_string()
    } else {
        format!("{title}\n\n{content}")
    };
    chunk_text(&full_text, title, config)
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte offset of the `n`th char, or `s.len()` past the end.
fn byte_offset(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len())
}

fn split_by_separator(text: &str, separator: &str, target: usize) -> Vec<String> {
    if !text.contains(separator) {
        return vec![text.to_string()];
    }
    pack(text.split(separator), separator, target)
}

fn split_by_sentences(text: &str, target: usize) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in SENTENCE_END.find_iter(text) {
        // Terminators are ASCII, so `start + 1` is a char boundary.
        sentences.push(&text[start..m.start() + 1]);
        start = m.end();
    }
    sentences.push(&text[start..]);

    pack(sentences.into_iter(), " ", target)
        .into_iter()
        .map(|run| run.trim().to_string())
        .filter(|run| !run.is_empty())
        .collect()
}

/// Greedily join `parts` with `joiner`, flushing before the buffer would
/// reach `target` characters.
fn pack<'a>(parts: impl Iterator<Item = &'a str>, joiner: &str, target: usize) -> Vec<String> {
    let joiner_len = char_len(joiner);
    let mut packed = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for part in parts {
        let part_len = char_len(part);
        if current_len + part_len + joiner_len < target {
            if !current.is_empty() {
                current.push_str(joiner);
                current_len += joiner_len;
            }
            current.push_str(part);
            current_len += part_len;
        } else {
            if !current.is_empty() {
                packed.push(std::mem::take(&mut current));
            }
            current = part.to_string();
            current_len = part_len;
        }
    }

    if !current.is_empty() {
        packed.push(current);
    }
    packed
}

fn add_overlap(pieces: Vec<String>, overlap: usize) -> Vec<String> {
    if pieces.len() <= 1 || overlap == 0 {
        return pieces;
    }

    let mut overlapped = Vec::with_capacity(pieces.len());
    overlapped.push(pieces[0].clone());
    for pair in pieces.windows(2) {
        overlapped.push(format!("{} {}", tail(&pair[0], overlap), pair[1]));
    }
    overlapped
}

/// The last `n` chars of `s`, or all of `s` if it is shorter.
fn tail(s: &str, n: usize) -> &str {
    let len = char_len(s);
    if len <= n {
        s
    } else {
        &s[byte_offset(s, len - n)..]
    }
}

fn finalize(pieces: Vec<String>, title: &str, fallback: &str) -> Vec<Chunk> {
    let contents: Vec<String> = pieces
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();

    if contents.is_empty() {
        return vec![Chunk::new(fallback.to_string(), title, 0, 1)];
    }

    let total = contents.len();
    contents
        .into_iter()
        .enumerate()
        .map(|(i, content)| Chunk::new(content, title, i, total))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(target: usize, overlap: usize, sep: &str) -> ChunkingConfig {
        ChunkingConfig::new(target, overlap, sep).unwrap()
    }

    fn contents(chunks: &[Chunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.content()).collect()
    }

    fn assert_numbering(chunks: &[Chunk]) {
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.chunk_index(), i, "index mismatch at position {i}");
            assert_eq!(c.total_chunks(), chunks.len());
            assert!(!c.content().trim().is_empty());
        }
    }

    #[test]
    fn test_empty_and_blank_text() {
        let cfg = ChunkingConfig::default();
        assert!(chunk_text("", "t", &cfg).is_empty());
        assert!(chunk_text("   \n\n\t ", "t", &cfg).is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = chunk_text("  Hello, world!  ", "Greeting", &ChunkingConfig::default());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content(), "Hello, world!");
        assert_eq!(chunks[0].title(), "Greeting");
        assert_eq!(chunks[0].chunk_index(), 0);
        assert_eq!(chunks[0].total_chunks(), 1);
    }

    #[test]
    fn test_text_exactly_target_size_is_not_split() {
        let text = "a".repeat(10);
        let chunks = chunk_text(&text, "", &config(10, 2, "|"));
        assert_eq!(contents(&chunks), [text.as_str()]);
    }

    #[test]
    fn test_paragraph_packing_without_overlap() {
        let chunks = chunk_text("AAAAA|BBBBB|CCCCC", "", &config(10, 0, "|"));
        assert_eq!(contents(&chunks), ["AAAAA", "BBBBB", "CCCCC"]);
        assert_numbering(&chunks);
    }

    #[test]
    fn test_paragraph_packing_with_overlap() {
        let chunks = chunk_text("AAAAA|BBBBB|CCCCC", "", &config(10, 2, "|"));
        assert_eq!(contents(&chunks), ["AAAAA", "AA BBBBB", "BB CCCCC"]);
        assert_numbering(&chunks);
    }

    #[test]
    fn test_small_paragraphs_are_packed_together() {
        let chunks = chunk_text("aa|bb|cc|dd|ee", "", &config(10, 0, "|"));
        // 2+2+1 < 10 keeps packing until the next part would reach 10.
        assert_eq!(contents(&chunks), ["aa|bb|cc", "dd|ee"]);
    }

    #[test]
    fn test_sentence_pass_without_separator() {
        let text = "One two three. Four five six! Seven eight nine? Ten.";
        let chunks = chunk_text(text, "", &config(20, 0, "\n\n"));
        assert_eq!(
            contents(&chunks),
            ["One two three.", "Four five six!", "Seven eight nine?", "Ten."]
        );
        assert_numbering(&chunks);
    }

    #[test]
    fn test_oversized_paragraph_is_split_by_sentences() {
        let text = "Short intro.\n\nFirst sentence here. Second sentence here. Third one.";
        let chunks = chunk_text(text, "", &config(25, 0, "\n\n"));
        assert_eq!(
            contents(&chunks),
            [
                "Short intro.",
                "First sentence here.",
                "Second sentence here.",
                "Third one."
            ]
        );
    }

    #[test]
    fn test_long_sentence_without_boundaries_stays_whole() {
        let text = "abcdefghijklmnopqrstuvwxy";
        let chunks = chunk_text(text, "", &config(10, 0, "\n\n"));
        assert_eq!(contents(&chunks), [text]);
        assert_numbering(&chunks);
    }

    #[test]
    fn test_oversized_sentence_is_not_cut_at_whitespace() {
        let text = "aaaa bbbb cccc dddd. eeee ffff";
        let chunks = chunk_text(text, "", &config(10, 0, "\n\n"));
        assert_eq!(contents(&chunks), ["aaaa bbbb cccc dddd.", "eeee ffff"]);
    }

    #[test]
    fn test_multibyte_sentences_overlap_on_char_boundaries() {
        let text = "ééééé. ééééé. ééééé.";
        let chunks = chunk_text(text, "", &config(10, 3, "\n\n"));
        assert_eq!(contents(&chunks), ["ééééé.", "éé. ééééé.", "éé. ééééé."]);
        assert_numbering(&chunks);

        let unbroken = "é".repeat(30);
        assert_eq!(contents(&chunk_text(&unbroken, "", &config(10, 3, "\n\n"))), [unbroken.as_str()]);
    }

    #[test]
    fn test_overlap_prefix_is_suffix_of_previous_chunk() {
        let paragraphs: Vec<String> = ('a'..='f').map(|c| c.to_string().repeat(30)).collect();
        let text = paragraphs.join("\n\n");

        let plain = chunk_text(&text, "", &config(50, 0, "\n\n"));
        let overlapped = chunk_text(&text, "", &config(50, 12, "\n\n"));
        assert_eq!(plain.len(), 6);
        assert_eq!(overlapped.len(), plain.len());
        assert_eq!(overlapped[0].content(), plain[0].content());

        for i in 1..plain.len() {
            let prev = plain[i - 1].content();
            let expected_prefix = format!("{} ", tail(prev, 12));
            assert!(overlapped[i].content().starts_with(&expected_prefix));
            assert!(overlapped[i].content().ends_with(plain[i].content()));
        }
    }

    #[test]
    fn test_overlap_longer_than_previous_chunk_uses_whole_chunk() {
        let chunks = chunk_text("ab|cdefghij|klm", "", &config(10, 9, "|"));
        assert_eq!(contents(&chunks), ["ab", "ab cdefghij", "cdefghij klm"]);
    }

    #[test]
    fn test_deterministic() {
        let text = "Alpha beta.\n\nGamma delta epsilon. Zeta eta.\n\nTheta iota kappa lambda.";
        let cfg = config(20, 5, "\n\n");
        assert_eq!(chunk_text(text, "T", &cfg), chunk_text(text, "T", &cfg));
    }

    #[test]
    fn test_indices_contiguous_for_long_text() {
        let text = (0..200)
            .map(|i| format!("Paragraph number {i} talks about things."))
            .collect::<Vec<_>>()
            .join("\n\n");
        let chunks = chunk_text(&text, "", &config(120, 30, "\n\n"));
        assert!(chunks.len() > 10);
        assert_numbering(&chunks);
    }

    #[test]
    fn test_finalize_falls_back_to_trimmed_input() {
        let chunks = finalize(vec!["  ".to_string(), "\n".to_string()], "T", "original text");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content(), "original text");
        assert_eq!(chunks[0].chunk_index(), 0);
        assert_eq!(chunks[0].total_chunks(), 1);
    }

    #[test]
    fn test_finalize_drops_blank_pieces_and_renumbers() {
        let pieces = vec!["one".to_string(), "   ".to_string(), " two ".to_string()];
        let chunks = finalize(pieces, "", "unused");
        assert_eq!(contents(&chunks), ["one", "two"]);
        assert_numbering(&chunks);
    }

    #[test]
    fn test_config_validation() {
        assert!(matches!(ChunkingConfig::new(0, 0, "\n\n"), Err(Error::Validation(_))));
        assert!(matches!(ChunkingConfig::new(10, 10, "\n\n"), Err(Error::Validation(_))));
        assert!(matches!(ChunkingConfig::new(10, 11, "\n\n"), Err(Error::Validation(_))));
        assert!(matches!(ChunkingConfig::new(10, 2, ""), Err(Error::Validation(_))));
        assert!(ChunkingConfig::new(10, 9, "|").is_ok());
    }

    #[test]
    fn test_prepare_note_prefixes_title() {
        let cfg = ChunkingConfig::default();
        let chunks = prepare_note("Groceries", "milk, eggs", &cfg);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content(), "Groceries\n\nmilk, eggs");
        assert_eq!(chunks[0].title(), "Groceries");

        let untitled = prepare_note("", "milk, eggs", &cfg);
        assert_eq!(untitled[0].content(), "milk, eggs");
    }

    #[test]
    fn test_prepare_note_blank_content_yields_nothing() {
        let cfg = ChunkingConfig::default();
        assert!(prepare_note("Title only", "  \n ", &cfg).is_empty());
    }
}
