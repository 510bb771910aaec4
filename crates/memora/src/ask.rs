//! `memora ask`: retrieval-augmented answers over the given documents.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use memora_core::{extract_all, TextExtractor, TextSplitter, TokenEncoder};
use memora_index::{HashEmbedder, MemoryIndex, RetrievalIndex};
use memora_llm::TextGenerator;
use memora_rag::{answer, rewrite, RagAnswer};

use crate::config::MemoraConfig;
use crate::logging;

#[derive(Debug, Clone)]
pub struct AskArgs {
    pub files: Vec<PathBuf>,
    pub question: String,
    pub detail: Option<u8>,
    pub show_sources: bool,
}

#[derive(Debug)]
pub struct AskOutcome {
    pub answer: RagAnswer,
    pub detailed: Option<String>,
}

/// Index every chunk of the readable documents.
pub fn build_index<E>(extractor: &E, files: &[PathBuf], config: &MemoraConfig) -> Result<MemoryIndex>
where
    E: TextExtractor + ?Sized,
{
    let corpus = extract_all(extractor, files);
    if corpus.processed.is_empty() {
        return Err(anyhow!("none of the documents contained readable text"));
    }
    let splitter = TextSplitter::new(config.splitter_config())?;
    let chunks = splitter.split(&corpus.text);
    let index = MemoryIndex::from_texts(
        HashEmbedder::default(),
        chunks.into_iter().map(|chunk| chunk.text),
    );
    logging::stage("index", format!("{} chunk(s) indexed", index.len()));
    Ok(index)
}

pub async fn ask<G, E, T>(
    generator: &G,
    extractor: &E,
    encoder: &T,
    args: &AskArgs,
    config: &MemoraConfig,
) -> Result<AskOutcome>
where
    G: TextGenerator + ?Sized,
    E: TextExtractor + ?Sized,
    T: TokenEncoder + ?Sized,
{
    let question = args.question.trim();
    if question.is_empty() {
        return Err(anyhow!("the question is empty"));
    }
    let index = build_index(extractor, &args.files, config)?;
    let answer = answer(generator, &index, encoder, question, &config.sizer_options()).await?;
    let detailed = match args.detail {
        Some(level) => Some(rewrite(generator, &answer.result, level).await?),
        None => None,
    };
    Ok(AskOutcome { answer, detailed })
}

pub fn render(outcome: &AskOutcome, show_sources: bool) -> String {
    let mut out = format!("Answer:\n{}\n", outcome.answer.result.trim());
    if let Some(detailed) = &outcome.detailed {
        out.push_str(&format!("\nDetailed answer:\n{}\n", detailed.trim()));
    }
    if show_sources {
        out.push_str(&format!(
            "\nBackground information:\n{}\n",
            outcome.answer.sources_text()
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use memora_core::{FileExtractor, MemoraError};
    use memora_llm::GenerationRequest;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::tempdir;

    #[derive(Default)]
    struct Stub(Mutex<Vec<GenerationRequest>>);

    #[async_trait]
    impl TextGenerator for Stub {
        async fn complete(&self, request: &GenerationRequest) -> memora_core::Result<String> {
            self.0.lock().unwrap().push(request.clone());
            if request.user.starts_with("```") {
                Ok("A much longer answer.".to_string())
            } else {
                Ok("ATP is made in mitochondria.".to_string())
            }
        }
    }

    struct Words;

    impl TokenEncoder for Words {
        fn count(&self, text: &str) -> usize {
            text.split_whitespace().count()
        }
    }

    fn notes(dir: &std::path::Path) -> PathBuf {
        let path = dir.join("notes.txt");
        let text = (0..40)
            .map(|i| format!("Fact {i}: mitochondria make ATP for cell number {i}."))
            .collect::<Vec<_>>()
            .join(" ");
        fs::write(&path, text).unwrap();
        path
    }

    fn small_chunks() -> MemoraConfig {
        MemoraConfig {
            chunk_size: 120,
            chunk_overlap: 10,
            token_limit: 200,
            ..MemoraConfig::default()
        }
    }

    #[tokio::test]
    async fn answers_and_escalates_detail() {
        let dir = tempdir().unwrap();
        let args = AskArgs {
            files: vec![notes(dir.path())],
            question: "Where is ATP made?".to_string(),
            detail: Some(8),
            show_sources: true,
        };
        let generator = Stub::default();
        let outcome = ask(&generator, &FileExtractor, &Words, &args, &small_chunks())
            .await
            .unwrap();
        assert_eq!(outcome.answer.result, "ATP is made in mitochondria.");
        assert_eq!(outcome.detailed.as_deref(), Some("A much longer answer."));
        assert!(!outcome.answer.source_documents.is_empty());
        assert_eq!(generator.0.lock().unwrap().len(), 2);
        let shown = render(&outcome, true);
        assert!(shown.contains("Detailed answer:"));
        assert!(shown.contains("Background information:"));
    }

    #[tokio::test]
    async fn budget_too_small_is_reported() {
        let dir = tempdir().unwrap();
        let args = AskArgs {
            files: vec![notes(dir.path())],
            question: "Where is ATP made?".to_string(),
            detail: None,
            show_sources: false,
        };
        let config = MemoraConfig {
            token_limit: 3,
            ..small_chunks()
        };
        let generator = Stub::default();
        let err = ask(&generator, &FileExtractor, &Words, &args, &config)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MemoraError>(),
            Some(MemoraError::RetrievalUnsatisfiable { .. })
        ));
        assert!(generator.0.lock().unwrap().is_empty());
    }
}
