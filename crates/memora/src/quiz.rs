//! `memora quiz`: flashcards from a bank file, one at a time.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use memora_core::FlashcardBank;
use memora_llm::TextGenerator;
use memora_rag::explain;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardChoice {
    /// 1-based, wrapping past the last card.
    Number(usize),
    Random,
}

pub fn load_bank(path: &Path) -> Result<FlashcardBank> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let bank = FlashcardBank::load(&raw)?;
    if bank.is_empty() {
        return Err(anyhow!("{} holds no flashcards", path.display()));
    }
    Ok(bank)
}

pub fn pick<'a, R: Rng + ?Sized>(
    bank: &'a FlashcardBank,
    choice: CardChoice,
    rng: &mut R,
) -> Result<(&'a str, &'a str)> {
    let card = match choice {
        CardChoice::Number(number) => bank.card(number),
        CardChoice::Random => bank.random_card(rng),
    };
    card.ok_or_else(|| anyhow!("the bank is empty"))
}

pub async fn explain_card<G>(generator: &G, answer: &str, ask: Option<&str>) -> Result<String>
where
    G: TextGenerator + ?Sized,
{
    Ok(explain(generator, answer, ask).await?)
}
