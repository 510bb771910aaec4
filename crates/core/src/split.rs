use serde::{Deserialize, Serialize};

use crate::error::{MemoraError, Result};

pub const DEFAULT_CHUNK_SIZE: usize = 3000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SplitterConfig {
    pub max_size: usize,
    pub overlap: usize,
    pub separators: Vec<String>,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
            separators: default_separators(),
        }
    }
}

pub fn default_separators() -> Vec<String> {
    vec![" ".to_string(), ",".to_string(), "\n".to_string()]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
}

impl SplitterConfig {
    pub fn validate(&self) -> Result<()> {
        validate(self.max_size, self.overlap)
    }
}

pub struct TextSplitter {
    config: SplitterConfig,
}

impl TextSplitter {
    pub fn new(config: SplitterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    pub fn split(&self, text: &str) -> Vec<Chunk> {
        split_validated(
            text,
            self.config.max_size,
            self.config.overlap,
            &self.config.separators,
        )
        .into_iter()
        .enumerate()
        .map(|(index, text)| Chunk { index, text })
        .collect()
    }
}

/// Split `text` into pieces of at most `max_size` characters.
///
/// Every piece after the first starts with the last `overlap` characters of
/// the piece before it, so dropping those prefixes and concatenating gives
/// back `text`. Within each window the separators are tried in order and the
/// cut lands after the right-most hit of the first separator that moves the
/// cursor past the overlap; without one the window is cut hard.
pub fn split_text(
    text: &str,
    max_size: usize,
    overlap: usize,
    separators: &[String],
) -> Result<Vec<String>> {
    validate(max_size, overlap)?;
    Ok(split_validated(text, max_size, overlap, separators))
}

fn validate(max_size: usize, overlap: usize) -> Result<()> {
    if max_size == 0 {
        return Err(MemoraError::InvalidConfig(
            "chunk size must be positive".to_string(),
        ));
    }
    if overlap >= max_size {
        return Err(MemoraError::InvalidConfig(format!(
            "chunk overlap {overlap} must be smaller than chunk size {max_size}"
        )));
    }
    Ok(())
}

fn split_validated(
    text: &str,
    max_size: usize,
    overlap: usize,
    separators: &[String],
) -> Vec<String> {
    // offsets[i] is the byte offset of char i; offsets[len] == text.len()
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(idx, _)| idx)
        .chain(std::iter::once(text.len()))
        .collect();
    let total = offsets.len() - 1;
    let mut chunks = Vec::new();
    let mut cursor = 0usize;
    while cursor < total {
        if total - cursor <= max_size {
            chunks.push(text[offsets[cursor]..].to_string());
            break;
        }
        let window_end = cursor + max_size;
        let end = find_cut(text, &offsets, cursor, window_end, overlap, separators)
            .unwrap_or(window_end);
        chunks.push(text[offsets[cursor]..offsets[end]].to_string());
        cursor = end - overlap;
    }
    chunks
}

fn find_cut(
    text: &str,
    offsets: &[usize],
    cursor: usize,
    window_end: usize,
    overlap: usize,
    separators: &[String],
) -> Option<usize> {
    let window = &text[offsets[cursor]..offsets[window_end]];
    for separator in separators.iter().filter(|s| !s.is_empty()) {
        let Some(byte_pos) = window.rfind(separator.as_str()) else {
            continue;
        };
        let cut = cursor
            + window[..byte_pos].chars().count()
            + separator.chars().count();
        if cut > cursor + overlap && cut <= window_end {
            return Some(cut);
        }
    }
    None
}
