mod completion;
mod embedding;
mod review_index;

pub use completion::{ChatCompletion, TextStream};
pub use embedding::EmbeddingService;
pub use review_index::ReviewIndex;
