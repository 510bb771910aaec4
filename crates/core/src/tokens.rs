use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tiktoken_rs::CoreBPE;

use crate::error::{MemoraError, Result};

static CL100K: Lazy<Option<Arc<CoreBPE>>> =
    Lazy::new(|| tiktoken_rs::cl100k_base().ok().map(Arc::new));

/// Anything that can turn text into a token count.
pub trait TokenEncoder: Send + Sync {
    fn count(&self, text: &str) -> usize;
}

impl<T: TokenEncoder + ?Sized> TokenEncoder for Arc<T> {
    fn count(&self, text: &str) -> usize {
        (**self).count(text)
    }
}

impl<T: TokenEncoder + ?Sized> TokenEncoder for &T {
    fn count(&self, text: &str) -> usize {
        (**self).count(text)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenizerKind {
    #[default]
    Cl100k,
    O200k,
    P50k,
}

impl TokenizerKind {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "cl100k" | "cl100k_base" => Some(Self::Cl100k),
            "o200k" | "o200k_base" => Some(Self::O200k),
            "p50k" | "p50k_base" | "gpt2" => Some(Self::P50k),
            _ => None,
        }
    }

    pub fn build(&self) -> Result<CoreBPE> {
        let built = match self {
            TokenizerKind::Cl100k => tiktoken_rs::cl100k_base(),
            TokenizerKind::O200k => tiktoken_rs::o200k_base(),
            TokenizerKind::P50k => tiktoken_rs::p50k_base(),
        };
        built.map_err(|e| MemoraError::Tokenizer(e.to_string()))
    }
}

/// BPE token counter backed by `tiktoken-rs`.
#[derive(Clone)]
pub struct TiktokenCounter {
    bpe: Arc<CoreBPE>,
}

impl TiktokenCounter {
    pub fn new(kind: TokenizerKind) -> Result<Self> {
        if kind == TokenizerKind::Cl100k {
            return Self::cl100k();
        }
        Ok(Self {
            bpe: Arc::new(kind.build()?),
        })
    }

    /// Shared `cl100k_base` instance; the vocabulary is only loaded once per process.
    pub fn cl100k() -> Result<Self> {
        let bpe = CL100K
            .as_ref()
            .cloned()
            .ok_or_else(|| MemoraError::Tokenizer("cl100k_base unavailable".to_string()))?;
        Ok(Self { bpe })
    }
}

impl TokenEncoder for TiktokenCounter {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizer_kind_parses_aliases() {
        assert_eq!(TokenizerKind::from_str("CL100K_base"), Some(TokenizerKind::Cl100k));
        assert_eq!(TokenizerKind::from_str("gpt2"), Some(TokenizerKind::P50k));
        assert_eq!(TokenizerKind::from_str("o200k"), Some(TokenizerKind::O200k));
        assert_eq!(TokenizerKind::from_str("bert"), None);
    }

    #[test]
    fn counter_counts_tokens() {
        let counter = TiktokenCounter::cl100k().unwrap();
        assert_eq!(counter.count(""), 0);
        let short = counter.count("hello world");
        let long = counter.count(&"hello world ".repeat(20));
        assert!(short >= 2);
        assert!(long > short);
    }
}
