//! Nearest-neighbour retrieval over the chunks of one uploaded document set.

mod embedding;
mod store;

pub use embedding::{Embedder, HashEmbedder, HashEmbedderConfig};
pub use store::{cosine_similarity, MemoryIndex, Passage, RetrievalIndex};
