//! Question answering and flashcard generation on top of an index and a
//! text generator.

mod flashcards;
mod pipeline;
pub mod prompts;
mod rewrite;
mod sizer;

pub use flashcards::generate_flashcards;
pub use pipeline::{answer, RagAnswer};
pub use rewrite::{explain, rewrite, DETAIL_LEVELS};
pub use sizer::{
    breadth_for, size_retrieval, SizedRetrieval, SizerOptions, DEFAULT_INITIAL_SPEED,
    DEFAULT_SPEED_STEP, DEFAULT_TOKEN_LIMIT,
};
