use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Prefix for three-letter upper-wind station codes
    pub short_code_prefix: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinksConfig {
    /// Directory for the JSONL record sink
    pub fs_dir: Option<String>,
    /// Records kept in memory for `/api/v1/records`
    pub memory_capacity: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub server: Option<ServerConfig>,
    pub decoder: Option<DecoderConfig>,
    pub sinks: Option<SinksConfig>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_MEMORY_CAPACITY: usize = 10_000;

impl AppConfig {
    /// Load configuration from AVWX_CONFIG path (TOML) if present, with reasonable defaults
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("AVWX_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from(path)
    }

    /// Load from an explicit path; a missing file yields defaults
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let cfg = if path.exists() {
            let s = fs::read_to_string(path)?;
            toml::from_str::<AppConfig>(&s)?
        } else {
            AppConfig::default()
        };
        Ok(cfg)
    }

    /// Get HTTP bind address (default 0.0.0.0:8080)
    pub fn http_bind(&self) -> String {
        self.server
            .as_ref()
            .and_then(|s| s.bind.clone())
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
    }

    /// Upper-wind short-code prefix; blank counts as unset
    pub fn short_code_prefix(&self) -> Option<String> {
        self.decoder
            .as_ref()
            .and_then(|d| d.short_code_prefix.clone())
            .filter(|p| !p.trim().is_empty())
    }

    pub fn fs_dir(&self) -> Option<PathBuf> {
        self.sinks
            .as_ref()
            .and_then(|s| s.fs_dir.as_ref())
            .map(PathBuf::from)
    }

    pub fn memory_capacity(&self) -> usize {
        self.sinks
            .as_ref()
            .and_then(|s| s.memory_capacity)
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_MEMORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.http_bind(), "0.0.0.0:8080");
        assert_eq!(cfg.short_code_prefix(), None);
        assert_eq!(cfg.fs_dir(), None);
        assert_eq!(cfg.memory_capacity(), DEFAULT_MEMORY_CAPACITY);
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AppConfig::load_from(dir.path().join("nope.toml")).unwrap();
        assert_eq!(cfg.http_bind(), DEFAULT_BIND);
    }

    #[test]
    fn reads_all_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[server]
bind = "127.0.0.1:9090"

[decoder]
short_code_prefix = "C"

[sinks]
fs_dir = "decoded"
memory_capacity = 50
"#
        )
        .unwrap();
        let cfg = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(cfg.http_bind(), "127.0.0.1:9090");
        assert_eq!(cfg.short_code_prefix().as_deref(), Some("C"));
        assert_eq!(cfg.fs_dir(), Some(PathBuf::from("decoded")));
        assert_eq!(cfg.memory_capacity(), 50);
    }

    #[test]
    fn blank_prefix_is_unset() {
        let cfg: AppConfig = toml::from_str("[decoder]\nshort_code_prefix = \"  \"\n").unwrap();
        assert_eq!(cfg.short_code_prefix(), None);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[server\nbind = 1").unwrap();
        assert!(matches!(AppConfig::load_from(file.path()), Err(ConfigError::Toml(_))));
    }
}
