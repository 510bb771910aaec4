use memora_core::{generate_batch, BatchOptions, BatchOutcome, GenerationTask, ProgressObserver};
use memora_llm::TextGenerator;
use tracing::info;

use crate::prompts::flashcard_request;

/// One flashcard generation call per task, at most
/// `options.concurrency_limit` in flight.
pub async fn generate_flashcards<G, O>(
    generator: &G,
    tasks: Vec<GenerationTask>,
    options: BatchOptions,
    observer: &O,
) -> BatchOutcome
where
    G: TextGenerator + ?Sized,
    O: ProgressObserver + ?Sized,
{
    let total = tasks.len();
    let outcome = generate_batch(
        tasks,
        |task| async move {
            generator
                .complete(&flashcard_request(&task.subject, &task.chunk))
                .await
        },
        options,
        observer,
    )
    .await;
    info!(
        total,
        completed = outcome.completed,
        failed = outcome.failed(),
        "flashcard batch finished"
    );
    outcome
}
