use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::Result;
use crate::progress::ProgressObserver;
use crate::split::Chunk;

pub const DEFAULT_CONCURRENCY_LIMIT: usize = 10;
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Upper bound on generation calls in flight; 0 behaves like 1.
    pub concurrency_limit: usize,
    /// Pause taken by every admitted task before it issues its call.
    pub settle_delay: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

/// One unit of fan-out work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTask {
    pub index: usize,
    pub chunk: String,
    pub subject: String,
}

impl GenerationTask {
    pub fn for_chunks(chunks: &[Chunk], subject: &str) -> Vec<Self> {
        chunks
            .iter()
            .enumerate()
            .map(|(index, chunk)| Self {
                index,
                chunk: chunk.text.clone(),
                subject: subject.to_string(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// One slot per task, in input order; `None` where the call failed.
    pub results: Vec<Option<String>>,
    /// Number of successful calls.
    pub completed: usize,
}

impl BatchOutcome {
    pub fn failed(&self) -> usize {
        self.results.len() - self.completed
    }

    pub fn joined(&self) -> String {
        join_results(&self.results)
    }
}

/// Run `make_call` once per task with at most `concurrency_limit` calls in
/// flight.
///
/// All tasks are polled by the calling task; nothing is spawned. A failing
/// call leaves `None` in its slot and does not disturb the others. After each
/// success the observer receives the running success count.
pub async fn generate_batch<F, Fut, O>(
    tasks: Vec<GenerationTask>,
    make_call: F,
    options: BatchOptions,
    observer: &O,
) -> BatchOutcome
where
    F: Fn(GenerationTask) -> Fut,
    Fut: Future<Output = Result<String>>,
    O: ProgressObserver + ?Sized,
{
    let total = tasks.len();
    let gate = Semaphore::new(options.concurrency_limit.max(1));
    let completed = AtomicUsize::new(0);
    let make_call = &make_call;
    let gate = &gate;
    let counter = &completed;
    let runs = tasks.into_iter().enumerate().map(|(slot, task)| async move {
        let task_index = task.index;
        let Ok(permit) = gate.acquire().await else {
            return (slot, None);
        };
        if !options.settle_delay.is_zero() {
            sleep(options.settle_delay).await;
        }
        debug!(task = task_index, "issuing generation call");
        let outcome = make_call(task).await;
        drop(permit);
        match outcome {
            Ok(text) => {
                let done = counter.fetch_add(1, Ordering::SeqCst) + 1;
                observer.on_progress(done, total);
                (slot, Some(text))
            }
            Err(err) => {
                warn!(task = task_index, error = %err, "generation call failed; slot left empty");
                (slot, None)
            }
        }
    });
    let finished = join_all(runs).await;
    let mut results: Vec<Option<String>> = vec![None; total];
    for (slot, result) in finished {
        results[slot] = result;
    }
    BatchOutcome {
        results,
        completed: completed.load(Ordering::SeqCst),
    }
}

/// Concatenate the successful outputs of a batch, skipping empty slots.
///
/// Pairs that a model ran together on one line (`... . Q: ...`) are pulled
/// apart onto their own paragraph so the codec can see every `Q:`.
pub fn join_results(results: &[Option<String>]) -> String {
    results
        .iter()
        .flatten()
        .map(|text| text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
        .replace(". Q:", ".\n\nQ:")
}
