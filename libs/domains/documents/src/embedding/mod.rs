mod hashing;
mod openai;
mod provider;

pub use hashing::{DEFAULT_MAX_INPUT_CHARS, HashingProvider};
pub use openai::{OpenAIConfig, OpenAIProvider};
pub use provider::EmbeddingProvider;

#[cfg(test)]
pub use provider::MockEmbeddingProvider;
