use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::Deserialize;

use crate::domain::DomainError;

const DEFAULT_CONFIG_PATH: &str = "config/app.yaml";
const DEFAULT_SYSTEM_PROMPT: &str = include_str!("../../prompts/system.md");

/// Everything the service needs at runtime, loaded once and shared by reference.
#[derive(Debug, Default)]
pub struct AppConfig {
    pub config: Config,
    pub prompts: PromptsConfig,
    pub secrets: Secrets,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub vector_index: VectorIndexConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub base_url: String,
    /// Deadline for the provider to accept a completion request.
    pub timeout_seconds: u64,
    /// Longest wait for the next fragment once streaming has begun.
    pub stream_idle_timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout_seconds: 30,
            stream_idle_timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    pub dimension: usize,
    pub timeout_seconds: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimension: 1536,
            timeout_seconds: 15,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VectorIndexConfig {
    pub index: String,
    pub namespace: String,
    /// Data-plane host. Resolved from the control plane when unset.
    pub host: Option<String>,
    pub controller_url: String,
    pub api_version: String,
    pub timeout_seconds: u64,
}

impl Default for VectorIndexConfig {
    fn default() -> Self {
        Self {
            index: "rag".to_string(),
            namespace: "ns1".to_string(),
            host: None,
            controller_url: "https://api.pinecone.io".to_string(),
            api_version: "2024-07".to_string(),
            timeout_seconds: 15,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    pub agent: AgentPrompts,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentPrompts {
    pub system: String,
}

impl Default for AgentPrompts {
    fn default() -> Self {
        Self {
            system: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// Provider credentials. Only ever read from the environment.
#[derive(Debug, Default)]
pub struct Secrets {
    pub openai_api_key: Option<SecretString>,
    pub vector_index_api_key: Option<SecretString>,
}

impl Secrets {
    pub fn from_env() -> Self {
        Self {
            openai_api_key: env_var("OPENAI_API_KEY").map(SecretString::from),
            vector_index_api_key: env_var("PINECONE_API_KEY").map(SecretString::from),
        }
    }

    pub fn take_openai_api_key(&mut self) -> Result<SecretString, DomainError> {
        self.openai_api_key
            .take()
            .ok_or_else(|| DomainError::config("OPENAI_API_KEY is not set"))
    }

    pub fn take_vector_index_api_key(&mut self) -> Result<SecretString, DomainError> {
        self.vector_index_api_key
            .take()
            .ok_or_else(|| DomainError::config("PINECONE_API_KEY is not set"))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    #[serde(flatten)]
    config: Config,
    prompts: PromptsConfig,
}

impl AppConfig {
    /// Defaults, then the YAML file (if any), then environment overrides.
    pub fn load() -> Result<Self, DomainError> {
        let path = env_var("APP_CONFIG").map(PathBuf::from);
        let mut app = match path {
            Some(path) => Self::from_file(&path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Self::default(),
        };

        app.apply_env();
        app.secrets = Secrets::from_env();
        Ok(app)
    }

    pub fn from_file(path: &Path) -> Result<Self, DomainError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DomainError::config(format!("reading {}: {e}", path.display())))?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, DomainError> {
        let file: FileConfig =
            serde_yaml::from_str(raw).map_err(|e| DomainError::config(e.to_string()))?;
        Ok(Self {
            config: file.config,
            prompts: file.prompts,
            secrets: Secrets::default(),
        })
    }

    fn apply_env(&mut self) {
        let cfg = &mut self.config;
        if let Some(host) = env_var("SERVER_HOST") {
            cfg.server.host = host;
        }
        if let Some(port) = env_var("SERVER_PORT").and_then(|p| p.parse().ok()) {
            cfg.server.port = port;
        }
        if let Some(url) = env_var("OPENAI_BASE_URL") {
            cfg.llm.base_url = url;
        }
        if let Some(host) = env_var("PINECONE_INDEX_HOST") {
            cfg.vector_index.host = Some(host);
        }
        if let Some(format) = env_var("LOG_FORMAT") {
            cfg.logging.format = match format.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            };
        }
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
