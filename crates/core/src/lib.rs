mod bank;
mod batch;
mod error;
mod extract;
mod progress;
mod split;
mod tokens;

pub use bank::{BankFormat, FlashcardBank, AUTHORSHIP_MARKER};
pub use batch::{
    generate_batch, join_results, BatchOptions, BatchOutcome, GenerationTask,
    DEFAULT_CONCURRENCY_LIMIT, DEFAULT_SETTLE_DELAY,
};
pub use error::{MemoraError, Result};
pub use extract::{extract_all, ExtractedCorpus, FileExtractor, TextExtractor};
pub use progress::{spawn_reporter, ChannelProgress, NoProgress, ProgressObserver};
pub use split::{
    default_separators, split_text, Chunk, SplitterConfig, TextSplitter, DEFAULT_CHUNK_OVERLAP,
    DEFAULT_CHUNK_SIZE,
};
pub use tokens::{TiktokenCounter, TokenEncoder, TokenizerKind};
