//! `memora generate`: documents in, flashcard bank file out.

use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use memora_core::{
    extract_all, spawn_reporter, BankFormat, ChannelProgress, FlashcardBank, GenerationTask,
    TextExtractor, TextSplitter,
};
use memora_llm::TextGenerator;
use memora_rag::generate_flashcards;

use crate::config::MemoraConfig;
use crate::logging;

#[derive(Debug, Clone)]
pub struct GenerateArgs {
    pub files: Vec<PathBuf>,
    pub subject: String,
    pub anki: bool,
    pub output: Option<PathBuf>,
}

#[derive(Debug)]
pub struct GeneratedBank {
    pub path: PathBuf,
    pub cards: usize,
    pub chunks: usize,
    pub failed_chunks: usize,
    pub skipped_documents: usize,
}

pub async fn generate_bank<G, E>(
    generator: &G,
    extractor: &E,
    args: &GenerateArgs,
    config: &MemoraConfig,
) -> Result<GeneratedBank>
where
    G: TextGenerator + ?Sized,
    E: TextExtractor + ?Sized,
{
    let subject = args.subject.trim();
    if subject.is_empty() {
        return Err(anyhow!("a subject name is required"));
    }
    logging::stage(
        "extract",
        format!("reading {} document(s)", args.files.len()),
    );
    let corpus = extract_all(extractor, &args.files);
    if corpus.processed.is_empty() {
        return Err(anyhow!(
            "none of the {} document(s) contained readable text",
            args.files.len()
        ));
    }
    let splitter = TextSplitter::new(config.splitter_config())?;
    let chunks = splitter.split(&corpus.text);
    logging::stage("split", format!("{} chunk(s) to process", chunks.len()));

    let tasks = GenerationTask::for_chunks(&chunks, subject);
    let (progress, rx) = ChannelProgress::new();
    let reporter = spawn_reporter(rx, |done, total| {
        logging::stage("generate", format!("{done}/{total} chunks done"));
    });
    let outcome =
        generate_flashcards(generator, tasks, config.batch_options(), &progress).await;
    // closing the channel lets the reporter log what is still queued, then exit
    drop(progress);
    if let Err(err) = reporter.await {
        tracing::warn!(error = %err, "progress reporter stopped early");
    }

    let bank = FlashcardBank::parse(&outcome.joined());
    if bank.is_empty() {
        return Err(anyhow!(
            "no flashcards were produced ({} of {} generation calls failed)",
            outcome.failed(),
            chunks.len()
        ));
    }
    let format = if args.anki {
        BankFormat::Delimited
    } else {
        BankFormat::Plain
    };
    let path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(subject));
    fs::write(&path, bank.encode(format))
        .with_context(|| format!("failed to write {}", path.display()))?;
    logging::stage(
        "write",
        format!("{} flashcard(s) written to {}", bank.len(), path.display()),
    );
    Ok(GeneratedBank {
        path,
        cards: bank.len(),
        chunks: chunks.len(),
        failed_chunks: outcome.failed(),
        skipped_documents: corpus.failures.len(),
    })
}

/// `<subject>.txt` in the working directory, with path separators replaced.
fn default_output(subject: &str) -> PathBuf {
    let name: String = subject
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    PathBuf::from(format!("{name}.txt"))
}
