pub mod rag;
pub mod relay;

pub use rag::{augment_query, build_messages, RagService, Timeouts, TOP_K};
pub use relay::{relay, StreamState};
