use crate::error::{Result, WatchStatsError};
use crate::view::DEFAULT_DIRECTOR_LIMIT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Runtime configuration, usually read from `watchstats.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The watchlist CSV export to analyze.
    pub watchlist: Option<PathBuf>,
    /// JSON genre taxonomy (`{ "Main": ["Sub", ...] }`).
    pub genres: Option<PathBuf>,
    /// Bundled export shown when no watchlist is configured or it fails to load.
    pub sample: Option<PathBuf>,
    /// How many directors the ranking view keeps.
    pub director_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            watchlist: None,
            genres: None,
            sample: None,
            director_limit: DEFAULT_DIRECTOR_LIMIT,
        }
    }
}

impl Config {
    /// Resolve relative paths against `base` (the config file's directory).
    pub fn resolve_relative(mut self, base: &Path) -> Self {
        let resolve = |p: PathBuf| if p.is_relative() { base.join(p) } else { p };
        self.watchlist = self.watchlist.map(resolve);
        self.genres = self.genres.map(resolve);
        self.sample = self.sample.map(resolve);
        self
    }

    fn check(self) -> Result<Self> {
        if self.director_limit == 0 {
            return Err(WatchStatsError::Config(
                "director_limit must be at least 1".into(),
            ));
        }
        Ok(self)
    }
}

/// Parse a config file. Relative paths inside it are taken relative to the
/// file's own directory.
pub fn parse_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config_str(&content)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    Ok(config.resolve_relative(base))
}

/// Parse a config YAML string.
pub fn parse_config_str(content: &str) -> Result<Config> {
    // An empty file deserializes to unit, not a mapping
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    let config: Config = serde_yaml::from_str(content)?;
    config.check()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = parse_config_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.director_limit, 15);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = parse_config_str("genres: assets/genre.json\n").unwrap();
        assert_eq!(config.genres, Some(PathBuf::from("assets/genre.json")));
        assert_eq!(config.watchlist, None);
        assert_eq!(config.director_limit, 15);
    }

    #[test]
    fn test_rejects_zero_director_limit() {
        assert!(parse_config_str("director_limit: 0\n").is_err());
    }

    #[test]
    fn test_rejects_unknown_types() {
        assert!(parse_config_str("director_limit: lots\n").is_err());
    }

    #[test]
    fn test_paths_relative_to_config_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("watchstats.yaml");
        std::fs::write(
            &path,
            "watchlist: exports/watchlist.csv\ngenres: /etc/watchstats/genre.json\nsample: assets/sample.csv\ndirector_limit: 10\n",
        )
        .unwrap();

        let config = parse_config(&path).unwrap();
        assert_eq!(
            config.watchlist,
            Some(tmp.path().join("exports/watchlist.csv"))
        );
        assert_eq!(config.genres, Some(PathBuf::from("/etc/watchstats/genre.json")));
        assert_eq!(config.sample, Some(tmp.path().join("assets/sample.csv")));
        assert_eq!(config.director_limit, 10);
    }
}
