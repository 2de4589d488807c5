use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;
use std::path::Path;
use std::thread;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Extensions (without the dot) catalogued on load. Empty accepts every file.
    pub text_extensions: Vec<String>,
    pub ignore_patterns: Vec<String>,
    pub worker_cap_multiplier: usize,
    /// Pool size for hashing and search. 0 means available parallelism.
    pub default_workers: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            text_extensions: vec!["txt".to_string(), "md".to_string()],
            ignore_patterns: Vec::new(),
            worker_cap_multiplier: 4,
            default_workers: 0,
        }
    }
}

impl EngineConfig {
    /// Largest worker count a caller may request for a single operation.
    pub fn max_workers(&self) -> usize {
        available_parallelism() * self.worker_cap_multiplier.max(1)
    }

    /// Pool size used for per-file hashing and search.
    pub fn io_workers(&self) -> usize {
        match self.default_workers {
            0 => available_parallelism(),
            n => n.min(self.max_workers()),
        }
    }

    /// Reject zero and anything above the cap instead of clamping.
    pub fn validate_workers(&self, workers: usize) -> Result<usize> {
        if workers == 0 {
            return Err(Error::invalid("worker count must be greater than zero"));
        }
        let cap = self.max_workers();
        if workers > cap {
            return Err(Error::invalid(format!(
                "worker count {} exceeds the maximum of {}",
                workers, cap
            )));
        }
        Ok(workers)
    }

    pub fn accepts_extension(&self, path: &Path) -> bool {
        if self.text_extensions.is_empty() {
            return true;
        }
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => self
                .text_extensions
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext)),
            None => false,
        }
    }
}

fn available_parallelism() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Load `Config.toml` from the working directory (optional) with
/// `FILE_SCOUT_*` environment overrides on top.
pub fn load_configuration() -> std::result::Result<EngineConfig, ConfigError> {
    build(ConfigFile::with_name("Config").required(false))
}

pub fn load_configuration_from(path: &Path) -> std::result::Result<EngineConfig, ConfigError> {
    build(ConfigFile::from(path).required(true))
}

fn build<S>(file: S) -> std::result::Result<EngineConfig, ConfigError>
where
    S: config::Source + Send + Sync + 'static,
{
    let builder = Config::builder()
        .add_source(file)
        .add_source(
            Environment::with_prefix("FILE_SCOUT")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("text_extensions")
                .with_list_parse_key("ignore_patterns"),
        )
        .build()?;
    builder.try_deserialize::<EngineConfig>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_validate_workers_rejects_zero() {
        let config = EngineConfig::default();
        assert!(matches!(
            config.validate_workers(0),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_validate_workers_rejects_above_cap() {
        let config = EngineConfig::default();
        let cap = config.max_workers();
        assert_eq!(config.validate_workers(cap).unwrap(), cap);
        assert!(matches!(
            config.validate_workers(cap + 1),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_accepts_extension_case_insensitive() {
        let config = EngineConfig::default();
        assert!(config.accepts_extension(Path::new("notes.TXT")));
        assert!(config.accepts_extension(Path::new("readme.md")));
        assert!(!config.accepts_extension(Path::new("image.png")));
        assert!(!config.accepts_extension(Path::new("Makefile")));
    }

    #[test]
    fn test_empty_extension_list_accepts_everything() {
        let config = EngineConfig {
            text_extensions: vec![],
            ..EngineConfig::default()
        };
        assert!(config.accepts_extension(Path::new("Makefile")));
        assert!(config.accepts_extension(Path::new("data.bin")));
    }

    #[test]
    fn test_load_configuration_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Config.toml");
        fs::write(
            &path,
            "text_extensions = [\"log\"]\nworker_cap_multiplier = 2\n",
        )
        .unwrap();

        let config = load_configuration_from(&path).unwrap();
        assert_eq!(config.text_extensions, vec!["log".to_string()]);
        assert_eq!(config.worker_cap_multiplier, 2);
        // Unset keys keep their defaults
        assert!(config.ignore_patterns.is_empty());
        assert_eq!(config.default_workers, 0);
    }
}
