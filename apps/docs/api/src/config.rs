use core_config::{FromEnv, env_parse, server::ServerConfig};
use domain_documents::{
    DocumentConfig, EmbeddingProviderType, OpenAIConfig, QdrantConfig,
    embedding::DEFAULT_MAX_INPUT_CHARS,
};
use strum::{Display, EnumString};

pub use core_config::Environment;

/// Which vector store backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum VectorStore {
    #[default]
    Memory,
    Qdrant,
}

#[derive(Debug, Clone)]
pub enum EmbeddingSettings {
    Hashing { max_input_chars: usize },
    OpenAI(OpenAIConfig),
}

#[derive(Debug, Clone)]
pub enum StoreSettings {
    Memory,
    Qdrant(QdrantConfig),
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub server: ServerConfig,
    pub documents: DocumentConfig,
    pub embedding: EmbeddingSettings,
    pub store: StoreSettings,
}

impl Config {
    /// Reads EMBEDDING_PROVIDER (hashing|openai) and VECTOR_STORE
    /// (memory|qdrant) to decide which backend settings to load. Backend
    /// dimension and metric always follow the document settings.
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?;
        let documents = DocumentConfig::from_env()?;

        let embedding = match env_parse("EMBEDDING_PROVIDER", EmbeddingProviderType::default())? {
            EmbeddingProviderType::Hashing => EmbeddingSettings::Hashing {
                max_input_chars: env_parse(
                    "EMBEDDING_MAX_INPUT_CHARS",
                    DEFAULT_MAX_INPUT_CHARS,
                )?,
            },
            EmbeddingProviderType::OpenAI => EmbeddingSettings::OpenAI(
                OpenAIConfig::from_env()?.with_dimension(documents.dimension),
            ),
        };

        let store = match env_parse("VECTOR_STORE", VectorStore::default())? {
            VectorStore::Memory => StoreSettings::Memory,
            VectorStore::Qdrant => StoreSettings::Qdrant(QdrantConfig {
                dimension: documents.dimension,
                metric: documents.metric,
                ..QdrantConfig::from_env()?
            }),
        };

        Ok(Self {
            environment,
            server,
            documents,
            embedding,
            store,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_use_hashing_and_memory() {
        temp_env::with_vars(
            [
                ("EMBEDDING_PROVIDER", None::<&str>),
                ("VECTOR_STORE", None),
                ("EMBEDDING_DIMENSION", None),
                ("EMBEDDING_MAX_INPUT_CHARS", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.documents.dimension, 384);
                assert!(matches!(
                    config.embedding,
                    EmbeddingSettings::Hashing {
                        max_input_chars: DEFAULT_MAX_INPUT_CHARS
                    }
                ));
                assert!(matches!(config.store, StoreSettings::Memory));
            },
        );
    }

    #[test]
    fn test_backend_dimension_follows_documents() {
        temp_env::with_vars(
            [
                ("EMBEDDING_PROVIDER", Some("openai")),
                ("OPENAI_API_KEY", Some("sk-test")),
                ("OPENAI_EMBEDDING_MODEL", None),
                ("VECTOR_STORE", Some("qdrant")),
                ("EMBEDDING_DIMENSION", Some("512")),
                ("SIMILARITY_METRIC", Some("dot")),
            ],
            || {
                let config = Config::from_env().unwrap();
                match (&config.embedding, &config.store) {
                    (EmbeddingSettings::OpenAI(openai), StoreSettings::Qdrant(qdrant)) => {
                        assert_eq!(openai.dimension, 512);
                        assert_eq!(qdrant.dimension, 512);
                        assert_eq!(qdrant.metric, config.documents.metric);
                    }
                    other => panic!("unexpected backends: {other:?}"),
                }
            },
        );
    }

    #[test]
    fn test_unknown_store_rejected() {
        temp_env::with_var("VECTOR_STORE", Some("postgres"), || {
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains("VECTOR_STORE"));
        });
    }

    #[test]
    fn test_openai_requires_api_key() {
        temp_env::with_vars(
            [
                ("EMBEDDING_PROVIDER", Some("openai")),
                ("OPENAI_API_KEY", None),
            ],
            || {
                let err = Config::from_env().unwrap_err();
                assert!(err.to_string().contains("OPENAI_API_KEY"));
            },
        );
    }
}
