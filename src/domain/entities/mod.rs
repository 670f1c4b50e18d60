mod conversation;
mod embedding;
mod review;

pub use conversation::{Conversation, Message, MessageRole};
pub use embedding::Embedding;
pub use review::{format_matches, ReviewMatch, ReviewMetadata, Stars, RESULTS_HEADER};
