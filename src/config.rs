//! Layered configuration
//!
//! Defaults, then the first config file found, then the environment.
//! Credentials only ever come from the environment (or `.env`).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::matching::{RecordIdScheme, Revision, MOCK_VECTOR_DIMENSION};
use crate::paths;

/// Environment variable holding the embedding service key
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// Environment variable holding the vector database key
pub const ENV_PINECONE_API_KEY: &str = "PINECONE_API_KEY";

/// Environment variable overriding the form revision
pub const ENV_REVISION: &str = "SESMATCH_REVISION";

/// Configuration for sesmatch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub embedding: EmbeddingConfig,
    pub vector_store: VectorStoreConfig,
    pub form: FormConfig,
    pub server: ServerConfig,
    /// Never read from or written to config files
    #[serde(skip)]
    pub credentials: Credentials,
}

/// Embedding service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    pub endpoint: String,
    /// Vector length, also used for the mock revision's random vectors
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-ada-002".to_string(),
            endpoint: "https://api.openai.com/v1/embeddings".to_string(),
            dimension: MOCK_VECTOR_DIMENSION,
        }
    }
}

/// Vector database settings. Index and namespace are fixed per process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreConfig {
    pub index: String,
    pub namespace: String,
    /// Control plane used to look up the index host
    pub controller_url: String,
    /// Data plane host; skips the lookup when set
    pub index_host: Option<String>,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            index: "ses-matching-test".to_string(),
            namespace: "ns1".to_string(),
            controller_url: "https://api.pinecone.io".to_string(),
            index_host: None,
        }
    }
}

/// Form behaviour
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    pub revision: Revision,
    pub record_ids: RecordIdScheme,
}

/// Form server bind address
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}

/// API keys. Missing keys are empty strings, not errors.
#[derive(Clone, Default)]
pub struct Credentials {
    pub openai_api_key: String,
    pub pinecone_api_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("pinecone_api_key", &redact(&self.pinecone_api_key))
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

impl Config {
    /// Load configuration
    ///
    /// `explicit` must exist when given. Otherwise the first existing file in
    /// [`paths::config_candidates`] is used, or defaults if there is none.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match resolve_config_file(explicit, &paths::config_candidates())? {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config file");
                Self::from_file(&path)?
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("Failed to parse config {}", path.display()))
    }

    /// Overlay environment values. `lookup` is `std::env::var` outside tests.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        self.credentials = Credentials {
            openai_api_key: lookup(ENV_OPENAI_API_KEY).unwrap_or_default(),
            pinecone_api_key: lookup(ENV_PINECONE_API_KEY).unwrap_or_default(),
        };

        if let Some(raw) = lookup(ENV_REVISION) {
            self.form.revision = raw
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))
                .with_context(|| format!("Invalid {}", ENV_REVISION))?;
        }

        Ok(())
    }
}

fn resolve_config_file(explicit: Option<&Path>, candidates: &[PathBuf]) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        return Ok(Some(path.to_path_buf()));
    }

    Ok(candidates.iter().find(|p| p.exists()).cloned())
}

/// Load `./.env` into the environment without overriding variables already set
pub fn load_dotenv() {
    load_dotenv_from(&paths::dotenv_path());
}

fn load_dotenv_from(path: &Path) {
    match dotenvy::from_path(path) {
        Ok(()) => tracing::debug!("loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "ignoring unreadable .env"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.vector_store.index, "ses-matching-test");
        assert_eq!(config.vector_store.namespace, "ns1");
        assert_eq!(config.embedding.model, "text-embedding-ada-002");
        assert_eq!(config.form.revision, Revision::Categorized);
        assert_eq!(config.form.record_ids, RecordIdScheme::Timestamp);
        assert_eq!(config.server.port, 8787);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sesmatch.toml");
        std::fs::write(
            &path,
            r#"
[form]
revision = "embedded"
record_ids = "uuid"

[vector_store]
namespace = "staging"
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.form.revision, Revision::Embedded);
        assert_eq!(config.form.record_ids, RecordIdScheme::Uuid);
        assert_eq!(config.vector_store.namespace, "staging");
        assert_eq!(config.vector_store.index, "ses-matching-test");
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[form\nrevision = ").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config"));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(Config::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_project_config_wins_over_user_config() {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join(paths::PROJECT_CONFIG_FILE);
        let user = dir.path().join("home").join("config.toml");
        std::fs::create_dir_all(user.parent().unwrap()).unwrap();
        std::fs::write(&project, "[vector_store]\nnamespace = \"project\"\n").unwrap();
        std::fs::write(&user, "[vector_store]\nnamespace = \"user\"\n").unwrap();
        let candidates = [project.clone(), user.clone()];

        let found = resolve_config_file(None, &candidates).unwrap();
        assert_eq!(found.as_deref(), Some(project.as_path()));
        assert_eq!(Config::from_file(&project).unwrap().vector_store.namespace, "project");

        std::fs::remove_file(&project).unwrap();
        let found = resolve_config_file(None, &candidates).unwrap();
        assert_eq!(found.as_deref(), Some(user.as_path()));

        std::fs::remove_file(&user).unwrap();
        assert_eq!(resolve_config_file(None, &candidates).unwrap(), None);
    }

    #[test]
    fn test_explicit_config_skips_candidates() {
        let dir = TempDir::new().unwrap();
        let explicit = dir.path().join("custom.toml");
        let project = dir.path().join(paths::PROJECT_CONFIG_FILE);
        std::fs::write(&explicit, "").unwrap();
        std::fs::write(&project, "").unwrap();

        let found = resolve_config_file(Some(&explicit), &[project]).unwrap();
        assert_eq!(found, Some(explicit));
    }

    #[test]
    fn test_dotenv_never_overrides_environment() {
        const PRESET: &str = "SESMATCH_DOTENV_TEST_PRESET";
        const FRESH: &str = "SESMATCH_DOTENV_TEST_FRESH";

        let dir = TempDir::new().unwrap();
        let dotenv = dir.path().join(".env");
        std::fs::write(&dotenv, format!("{PRESET}=from-dotenv\n{FRESH}=from-dotenv\n")).unwrap();
        std::env::set_var(PRESET, "from-env");
        std::env::remove_var(FRESH);

        load_dotenv_from(&dotenv);

        assert_eq!(std::env::var(PRESET).unwrap(), "from-env");
        assert_eq!(std::env::var(FRESH).unwrap(), "from-dotenv");
    }

    #[test]
    fn test_missing_dotenv_is_ignored() {
        let dir = TempDir::new().unwrap();
        load_dotenv_from(&dir.path().join(".env"));
    }

    #[test]
    fn test_missing_credentials_are_empty() {
        let mut config = Config::default();
        config.apply_env(|_| None).unwrap();
        assert_eq!(config.credentials.openai_api_key, "");
        assert_eq!(config.credentials.pinecone_api_key, "");
    }

    #[test]
    fn test_env_overlay() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_OPENAI_API_KEY, "sk-test"),
            (ENV_PINECONE_API_KEY, "pc-test"),
            (ENV_REVISION, "mock"),
        ]);
        let mut config = Config::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.credentials.openai_api_key, "sk-test");
        assert_eq!(config.credentials.pinecone_api_key, "pc-test");
        assert_eq!(config.form.revision, Revision::Mock);
    }

    #[test]
    fn test_invalid_revision_env() {
        let mut config = Config::default();
        let result = config.apply_env(|key| (key == ENV_REVISION).then(|| "v4".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let credentials = Credentials {
            openai_api_key: "sk-secret".to_string(),
            pinecone_api_key: String::new(),
        };
        let debug = format!("{:?}", credentials);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<redacted>"));
        assert!(debug.contains("<unset>"));
    }
}
