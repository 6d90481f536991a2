use crate::{
    error::RefIndexError,
    properties::{EnumSet, ReferenceKind},
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    fs::{read_to_string, write},
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_MIN_COUNT_THRESHOLD: usize = 1;
pub const DEFAULT_CACHE_TTL_MS: u64 = 60_000;
pub const DEFAULT_REBUILD_COOLDOWN_MS: u64 = 1_000;

/// Tunables for the reference service. Every field falls back to its default when missing from
/// the TOML source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefConfig {
    /// Minimum number of backlinks before an anchor gets a count indicator. Values below 1
    /// are treated as 1.
    pub min_count_threshold: usize,
    pub cache_ttl_ms: u64,
    pub rebuild_cooldown_ms: u64,
    /// Run one more rebuild once a burst has gone quiet for a whole cooldown, covering the
    /// events absorbed after its leading edge. Off by default: a burst rebuilds once.
    pub rebuild_after_burst: bool,
    pub enabled_kinds: EnumSet<ReferenceKind>,
    /// Regex patterns; an anchor whose first backlink comes from a matching source path is
    /// not decorated.
    pub excluded_sources: Vec<String>,
}

impl Default for RefConfig {
    fn default() -> Self {
        RefConfig {
            min_count_threshold: DEFAULT_MIN_COUNT_THRESHOLD,
            cache_ttl_ms: DEFAULT_CACHE_TTL_MS,
            rebuild_cooldown_ms: DEFAULT_REBUILD_COOLDOWN_MS,
            rebuild_after_burst: false,
            enabled_kinds: ReferenceKind::all(),
            excluded_sources: Vec::new(),
        }
    }
}

impl RefConfig {
    pub fn from_toml_str(content: &str) -> Result<RefConfig, RefIndexError> {
        let config: RefConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, RefIndexError> {
        Ok(toml::to_string(self)?)
    }

    /// Read a config file. A missing file yields the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<RefConfig, RefIndexError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(
                "[RefConfig::load] {:?} not found, using default configuration",
                path
            );
            return Ok(RefConfig::default());
        }
        RefConfig::from_toml_str(&read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<(), RefIndexError> {
        if self.cache_ttl_ms == 0 {
            return Err(RefIndexError::Config(
                "cache_ttl_ms must be greater than zero".to_string(),
            ));
        }
        self.source_filter().map(|_| ())
    }

    pub fn min_count(&self) -> usize {
        self.min_count_threshold.max(1)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn rebuild_cooldown(&self) -> Duration {
        Duration::from_millis(self.rebuild_cooldown_ms)
    }

    pub fn source_filter(&self) -> Result<SourceFilter, RefIndexError> {
        SourceFilter::new(&self.excluded_sources)
    }
}

/// Compiled `excluded_sources` patterns.
#[derive(Debug, Clone, Default)]
pub struct SourceFilter {
    patterns: Vec<Regex>,
}

impl SourceFilter {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<SourceFilter, RefIndexError> {
        let patterns = patterns
            .iter()
            .map(|pattern| Regex::new(pattern.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SourceFilter { patterns })
    }

    pub fn is_excluded(&self, source: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(source))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

pub trait ConfigProvider: Send + Sync {
    fn get_config(&self) -> Result<RefConfig, RefIndexError>;
    fn set_config(&self, config: &RefConfig) -> Result<(), RefIndexError>;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TomlConfigProvider {
    path: PathBuf,
}

impl TomlConfigProvider {
    pub fn new(path: PathBuf) -> Self {
        TomlConfigProvider { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigProvider for TomlConfigProvider {
    fn get_config(&self) -> Result<RefConfig, RefIndexError> {
        tracing::debug!("Attempting to read config from: {:?}", &self.path);
        RefConfig::load(&self.path)
    }

    fn set_config(&self, config: &RefConfig) -> Result<(), RefIndexError> {
        tracing::debug!("Attempting to write config to: {:?}", &self.path);
        config.validate()?;
        write(&self.path, config.to_toml_string()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config = RefConfig::from_toml_str(
            r#"
            min_count_threshold = 2
            enabled_kinds = ["block", "heading"]
            "#,
        )
        .unwrap();
        assert_eq!(config.min_count(), 2);
        assert_eq!(config.cache_ttl(), Duration::from_millis(DEFAULT_CACHE_TTL_MS));
        assert_eq!(
            config.enabled_kinds,
            ReferenceKind::Block | ReferenceKind::Heading
        );
        assert!(config.excluded_sources.is_empty());
        assert!(!config.rebuild_after_burst);
        assert!(RefConfig::from_toml_str("rebuild_after_burst = true")
            .unwrap()
            .rebuild_after_burst);
    }

    #[test]
    fn test_threshold_is_clamped_and_bad_patterns_rejected() {
        let config = RefConfig::from_toml_str("min_count_threshold = 0").unwrap();
        assert_eq!(config.min_count(), 1);

        let err = RefConfig::from_toml_str(r#"excluded_sources = ["(unclosed"]"#).unwrap_err();
        assert!(matches!(err, RefIndexError::Config(_)));
        let err = RefConfig::from_toml_str("cache_ttl_ms = 0").unwrap_err();
        assert!(matches!(err, RefIndexError::Config(_)));
        let err = RefConfig::from_toml_str("min_count_threshold = \"two\"").unwrap_err();
        assert!(matches!(err, RefIndexError::Serialization(_)));
    }

    #[test]
    fn test_source_filter() {
        let filter = SourceFilter::new(&["^templates/", r"\.excalidraw$"]).unwrap();
        assert!(filter.is_excluded("templates/daily.md"));
        assert!(filter.is_excluded("drawings/x.excalidraw"));
        assert!(!filter.is_excluded("notes/templates.md"));
        assert!(SourceFilter::default().is_empty());
    }

    #[test]
    fn test_toml_provider_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let provider = TomlConfigProvider::new(dir.path().join("refs.toml"));
        assert_eq!(provider.get_config().unwrap(), RefConfig::default());

        let config = RefConfig {
            min_count_threshold: 3,
            excluded_sources: vec!["^Archive/".to_string()],
            ..Default::default()
        };
        provider.set_config(&config).unwrap();
        assert_eq!(provider.get_config().unwrap(), config);
    }
}
