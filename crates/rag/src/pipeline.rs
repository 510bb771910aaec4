use memora_core::{Result, TokenEncoder};
use memora_index::RetrievalIndex;
use memora_llm::TextGenerator;
use tracing::info;

use crate::prompts::answer_request;
use crate::sizer::{size_retrieval, SizerOptions};

#[derive(Debug, Clone, PartialEq)]
pub struct RagAnswer {
    pub result: String,
    /// Passages the answer was grounded on, in rank order.
    pub source_documents: Vec<String>,
    /// Retrieval breadth the sizer settled on.
    pub k: usize,
}

impl RagAnswer {
    /// All sources as one line of text.
    pub fn sources_text(&self) -> String {
        self.source_documents
            .iter()
            .flat_map(|source| source.split_whitespace())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Answer `question` from the passages of `index` that fit the token budget.
///
/// Exactly one generation call is made; its failure is returned as is.
pub async fn answer<G, I, T>(
    generator: &G,
    index: &I,
    encoder: &T,
    question: &str,
    options: &SizerOptions,
) -> Result<RagAnswer>
where
    G: TextGenerator + ?Sized,
    I: RetrievalIndex + ?Sized,
    T: TokenEncoder + ?Sized,
{
    let sized = size_retrieval(index, encoder, question, options)?;
    let source_documents: Vec<String> = sized.passages.into_iter().map(|p| p.text).collect();
    let context = source_documents.join("\n\n");
    let result = generator
        .complete(&answer_request(&context, question))
        .await?;
    info!(k = sized.k, sources = source_documents.len(), "answer generated");
    Ok(RagAnswer {
        result,
        source_documents,
        k: sized.k,
    })
}
