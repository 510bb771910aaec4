use std::ops::RangeInclusive;

use memora_core::{MemoraError, Result};
use memora_llm::TextGenerator;

use crate::prompts::{explain_request, rewrite_request};

pub const DETAIL_LEVELS: RangeInclusive<u8> = 1..=10;

/// Ask for a more detailed version of `answer`; 10 is the most detailed.
pub async fn rewrite<G>(generator: &G, answer: &str, detail_level: u8) -> Result<String>
where
    G: TextGenerator + ?Sized,
{
    if !DETAIL_LEVELS.contains(&detail_level) {
        return Err(MemoraError::InvalidConfig(format!(
            "detail level must be between 1 and 10, got {detail_level}"
        )));
    }
    generator
        .complete(&rewrite_request(answer, detail_level))
        .await
}

/// Expand a flashcard answer, addressing `question` first when one is given.
pub async fn explain<G>(generator: &G, answer: &str, question: Option<&str>) -> Result<String>
where
    G: TextGenerator + ?Sized,
{
    let question = question.map(str::trim).filter(|q| !q.is_empty());
    generator
        .complete(&explain_request(answer, question))
        .await
}
