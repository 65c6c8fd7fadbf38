//! Configuration for the document Q&A service
//!
//! Values are layered: built-in defaults, then an optional TOML file named by
//! `RAG_CONFIG_FILE`, then environment variables read through `envy`.
//! Environment variable names are matched case-insensitively.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable naming an optional TOML config file
pub const CONFIG_FILE_ENV: &str = "RAG_CONFIG_FILE";

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Application identity and debug flag
    pub app: AppConfig,
    /// Server configuration
    pub server: ServerConfig,
    /// Hosted model provider configuration
    pub provider: ProviderConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// On-disk locations
    pub storage: StorageConfig,
    /// Vector index tuning
    pub vector_db: VectorDbConfig,
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Display name reported by the info endpoint
    pub name: String,
    /// Verbose logging
    pub debug: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "Mistral Document RAG API".to_string(),
            debug: false,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 10MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
            max_upload_size: 10 * 1024 * 1024,
        }
    }
}

/// Secret API key; redacted from `Debug` and serialized output
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Raw key, for building the Authorization header only
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

impl Serialize for ApiKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str("<redacted>")
    }
}

/// Hosted provider (Mistral AI, OpenAI-compatible) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// API key (required)
    pub api_key: ApiKey,
    /// API base URL
    pub base_url: String,
    /// Chat-completion model name
    pub chat_model: String,
    /// Embedding model name
    pub embedding_model: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// Retries for failed requests (0 = fail on first error)
    pub max_retries: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: ApiKey::default(),
            base_url: "https://api.mistral.ai/v1".to_string(),
            chat_model: "mistral-small-latest".to_string(),
            embedding_model: "mistral-embed".to_string(),
            temperature: 0.3,
            request_timeout_secs: 60,
            max_retries: 0,
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedding dimensions (1024 for mistral-embed)
    pub dimensions: usize,
    /// Texts per embedding request
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimensions: 1024,
            batch_size: 32,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between chunks in characters
    pub chunk_overlap: usize,
    /// A sentence break is only used if it falls past this fraction of the window
    pub boundary_ratio: f64,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            boundary_ratio: 0.5,
        }
    }
}

/// Storage locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the vector index and document catalog
    pub data_dir: PathBuf,
    /// Directory where raw uploads are kept
    pub upload_dir: PathBuf,
    /// Collection name reported by the stats endpoint
    pub collection_name: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            upload_dir: PathBuf::from("./uploads"),
            collection_name: "documents".to_string(),
        }
    }
}

/// HNSW index parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorDbConfig {
    /// HNSW M parameter
    pub hnsw_m: usize,
    /// HNSW ef_construction
    pub hnsw_ef_construction: usize,
    /// HNSW ef_search
    pub hnsw_ef_search: usize,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            hnsw_m: 32,
            hnsw_ef_construction: 200,
            hnsw_ef_search: 100,
        }
    }
}

/// Flat view of the recognised environment variables
///
/// `envy` lowercases variable names before matching, so `mistral_api_key`
/// also picks up `MISTRAL_API_KEY`.
#[derive(Debug, Default, Deserialize)]
struct EnvOverrides {
    rag_config_file: Option<PathBuf>,
    mistral_api_key: Option<String>,
    model_name: Option<String>,
    embedding_model: Option<String>,
    app_name: Option<String>,
    debug: Option<bool>,
    mistral_base_url: Option<String>,
    request_timeout_secs: Option<u64>,
    max_retries: Option<u32>,
    host: Option<String>,
    port: Option<u16>,
    max_upload_size: Option<usize>,
    data_dir: Option<PathBuf>,
    upload_dir: Option<PathBuf>,
    embedding_dimensions: Option<usize>,
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
}

impl EnvOverrides {
    fn apply(self, config: &mut RagConfig) {
        if let Some(key) = self.mistral_api_key {
            config.provider.api_key = ApiKey::new(key.trim());
        }
        if let Some(url) = self.mistral_base_url {
            config.provider.base_url = url.trim_end_matches('/').to_string();
        }

        let provider = &mut config.provider;
        provider.chat_model = self.model_name.unwrap_or(std::mem::take(&mut provider.chat_model));
        provider.embedding_model = self
            .embedding_model
            .unwrap_or(std::mem::take(&mut provider.embedding_model));
        provider.request_timeout_secs = self.request_timeout_secs.unwrap_or(provider.request_timeout_secs);
        provider.max_retries = self.max_retries.unwrap_or(provider.max_retries);

        let app = &mut config.app;
        app.name = self.app_name.unwrap_or(std::mem::take(&mut app.name));
        app.debug = self.debug.unwrap_or(app.debug);

        let server = &mut config.server;
        server.host = self.host.unwrap_or(std::mem::take(&mut server.host));
        server.port = self.port.unwrap_or(server.port);
        server.max_upload_size = self.max_upload_size.unwrap_or(server.max_upload_size);

        let storage = &mut config.storage;
        storage.data_dir = self.data_dir.unwrap_or(std::mem::take(&mut storage.data_dir));
        storage.upload_dir = self.upload_dir.unwrap_or(std::mem::take(&mut storage.upload_dir));

        config.embeddings.dimensions = self.embedding_dimensions.unwrap_or(config.embeddings.dimensions);
        config.chunking.chunk_size = self.chunk_size.unwrap_or(config.chunking.chunk_size);
        config.chunking.chunk_overlap = self.chunk_overlap.unwrap_or(config.chunking.chunk_overlap);
    }
}

impl RagConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        // envy::from_env panics on non-unicode variables; skip them instead
        Self::from_vars(
            std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?))),
        )
    }

    /// Load configuration from an explicit set of variables
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let overrides: EnvOverrides = envy::from_iter(vars)
            .map_err(|e| Error::Config(format!("Invalid environment: {}", e)))?;

        let mut config = match &overrides.rag_config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        overrides.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
    }

    /// Check invariants the rest of the service relies on
    pub fn validate(&self) -> Result<()> {
        if self.provider.api_key.is_empty() {
            return Err(Error::Config("MISTRAL_API_KEY is required".to_string()));
        }
        if self.chunking.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be greater than 0".to_string()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if !(0.0..1.0).contains(&self.chunking.boundary_ratio) {
            return Err(Error::Config("boundary_ratio must be in [0, 1)".to_string()));
        }
        if self.embeddings.dimensions == 0 {
            return Err(Error::Config("embedding dimensions must be greater than 0".to_string()));
        }
        if self.embeddings.batch_size == 0 {
            return Err(Error::Config("embedding batch_size must be greater than 0".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_api_key_is_required() {
        let err = RagConfig::from_vars(vars(&[])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = RagConfig::from_vars(vars(&[("MISTRAL_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_defaults_with_api_key() {
        let config = RagConfig::from_vars(vars(&[("MISTRAL_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.provider.chat_model, "mistral-small-latest");
        assert_eq!(config.provider.embedding_model, "mistral-embed");
        assert_eq!(config.provider.base_url, "https://api.mistral.ai/v1");
        assert_eq!(config.app.name, "Mistral Document RAG API");
        assert!(!config.app.debug);
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.embeddings.dimensions, 1024);
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.provider.max_retries, 0);
        assert_eq!(config.vector_db.hnsw_m, 32);
    }

    #[test]
    fn test_env_overrides() {
        let config = RagConfig::from_vars(vars(&[
            ("MISTRAL_API_KEY", "sk-test"),
            ("MODEL_NAME", "mistral-large-latest"),
            ("EMBEDDING_MODEL", "custom-embed"),
            ("APP_NAME", "Docs"),
            ("DEBUG", "true"),
            ("PORT", "9000"),
            ("MISTRAL_BASE_URL", "http://localhost:8080/v1/"),
            ("DATA_DIR", "/var/lib/doc-rag"),
        ]))
        .unwrap();
        assert_eq!(config.provider.chat_model, "mistral-large-latest");
        assert_eq!(config.provider.embedding_model, "custom-embed");
        assert_eq!(config.provider.base_url, "http://localhost:8080/v1");
        assert_eq!(config.app.name, "Docs");
        assert!(config.app.debug);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.storage.data_dir, PathBuf::from("/var/lib/doc-rag"));
        assert_eq!(config.storage.upload_dir, PathBuf::from("./uploads"));
    }

    #[test]
    fn test_variable_names_are_case_insensitive() {
        let config = RagConfig::from_vars(vars(&[
            ("mistral_api_key", "sk-lower"),
            ("Chunk_Size", "400"),
            ("chunk_overlap", "40"),
        ]))
        .unwrap();
        assert_eq!(config.provider.api_key.expose(), "sk-lower");
        assert_eq!(config.chunking.chunk_size, 400);
        assert_eq!(config.chunking.chunk_overlap, 40);
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        let err = RagConfig::from_vars(vars(&[("MISTRAL_API_KEY", "sk-test"), ("PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().to_lowercase().contains("port"));
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk_size() {
        let err = RagConfig::from_vars(vars(&[
            ("MISTRAL_API_KEY", "sk-test"),
            ("CHUNK_SIZE", "100"),
            ("CHUNK_OVERLAP", "100"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_api_key_never_printed() {
        let config = RagConfig::from_vars(vars(&[("MISTRAL_API_KEY", "sk-secret-123")])).unwrap();
        let debug = format!("{:?}", config);
        let json = serde_json::to_string(&config).unwrap();
        assert!(!debug.contains("sk-secret-123"));
        assert!(!json.contains("sk-secret-123"));
        assert_eq!(config.provider.api_key.expose(), "sk-secret-123");
    }

    #[test]
    fn test_config_file_then_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rag.toml");
        std::fs::write(
            &path,
            "[provider]\napi_key = \"sk-file\"\nchat_model = \"from-file\"\n\n[chunking]\nchunk_size = 500\nchunk_overlap = 50\n\n[vector_db]\nhnsw_m = 8\n",
        )
        .unwrap();

        let path_str = path.to_string_lossy().to_string();
        let config = RagConfig::from_vars(vars(&[
            (CONFIG_FILE_ENV, path_str.as_str()),
            ("MODEL_NAME", "from-env"),
        ]))
        .unwrap();

        assert_eq!(config.provider.api_key.expose(), "sk-file");
        assert_eq!(config.provider.chat_model, "from-env");
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.chunking.chunk_overlap, 50);
        assert_eq!(config.provider.embedding_model, "mistral-embed");
        assert_eq!(config.vector_db.hnsw_m, 8);
        assert_eq!(config.vector_db.hnsw_ef_search, 100);
    }
}
