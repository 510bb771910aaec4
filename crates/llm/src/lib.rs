//! Chat-completion access for flashcard generation and question answering.

mod client;
mod local;

use async_trait::async_trait;
use memora_core::Result;

pub use client::{LlmClient, LlmProvider, LlmResponse, DEFAULT_OPENAI_BASE_URL, DEFAULT_TIMEOUT};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationRequest {
    pub system: Option<String>,
    pub user: String,
}

impl GenerationRequest {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            system: None,
            user: text.into(),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// One prompt in, one completion out.
///
/// Every call may cost money, so implementations never retry on their own;
/// failures come back as [`memora_core::MemoraError::GenerationUnavailable`].
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, request: &GenerationRequest) -> Result<String>;
}

#[async_trait]
impl<T: TextGenerator + ?Sized> TextGenerator for std::sync::Arc<T> {
    async fn complete(&self, request: &GenerationRequest) -> Result<String> {
        (**self).complete(request).await
    }
}

#[async_trait]
impl<T: TextGenerator + ?Sized> TextGenerator for &T {
    async fn complete(&self, request: &GenerationRequest) -> Result<String> {
        (**self).complete(request).await
    }
}
