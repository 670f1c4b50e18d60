pub mod config;
pub mod embedding;
pub mod llm;
pub mod vector_store;

pub use config::{AppConfig, Config, LogFormat, PromptsConfig, Secrets};
pub use embedding::TextEmbedding;
pub use llm::OpenAiChat;
pub use vector_store::PineconeIndex;
