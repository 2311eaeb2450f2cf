//! Configuration file loading
//!
//! ```toml
//! team = "team-id"
//!
//! [server]
//! url = "http://localhost:8065"
//! token_env = "TAXON_TOKEN"
//!
//! [engine]
//! sort_step = 10
//!
//! [taxonomy]
//! order = ["Club Life", "Racing"]
//!
//! [taxonomy.categories]
//! "Club Life" = ["Town Square", "Club News"]
//! Racing = ["Monday Races", "Kaag Cup"]
//! ```

use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use taxon_model::{Taxonomy, TaxonomyError, TeamId};
use taxon_reconcile::EngineConfig;
use taxon_remote::HttpConfig;

/// Environment variable read when neither `token` nor `token_env` is set
pub(crate) const DEFAULT_TOKEN_ENV: &str = "TAXON_TOKEN";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors raised while loading the configuration file
#[derive(Debug, thiserror::Error)]
pub(crate) enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("no API token: set server.token or the {0} environment variable")]
    MissingToken(String),

    #[error("invalid taxonomy: {0}")]
    Taxonomy(#[from] TaxonomyError),

    #[error("engine.sort_step must be positive, got {0}")]
    SortStep(i64),
}

/// Platform connection settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ServerSection {
    pub(crate) url: String,
    #[serde(default)]
    pub(crate) token: Option<String>,
    #[serde(default)]
    pub(crate) token_env: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub(crate) timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Declared categories as written in the file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TaxonomySection {
    #[serde(default)]
    pub(crate) order: Vec<String>,
    #[serde(default)]
    pub(crate) categories: IndexMap<String, Vec<String>>,
}

impl TaxonomySection {
    pub(crate) fn build(&self) -> Result<Taxonomy, TaxonomyError> {
        Taxonomy::from_parts(&self.order, &self.categories)
    }
}

/// Whole configuration file
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct AppConfig {
    pub(crate) team: String,
    pub(crate) server: ServerSection,
    #[serde(default)]
    pub(crate) engine: EngineConfig,
    #[serde(default)]
    pub(crate) taxonomy: TaxonomySection,
}

/// Configuration with the taxonomy validated and the token resolved
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub(crate) team: TeamId,
    pub(crate) http: HttpConfig,
    pub(crate) engine: EngineConfig,
    pub(crate) taxonomy: Taxonomy,
}

impl AppConfig {
    /// Parse a configuration file
    pub(crate) fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Validate the taxonomy and resolve the token through `lookup`
    pub(crate) fn resolve<F>(self, lookup: F) -> Result<Settings, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let taxonomy = self.taxonomy.build()?;
        if self.engine.sort_step <= 0 {
            return Err(ConfigError::SortStep(self.engine.sort_step));
        }

        let token = match self.server.token {
            Some(token) => token,
            None => {
                let var = self
                    .server
                    .token_env
                    .unwrap_or_else(|| DEFAULT_TOKEN_ENV.to_string());
                lookup(&var)
                    .filter(|t| !t.trim().is_empty())
                    .ok_or(ConfigError::MissingToken(var))?
            }
        };

        let http = HttpConfig::new(self.server.url, token)
            .with_timeout(Duration::from_secs(self.server.timeout_secs));

        // Page sizes of zero would never advance
        let (channel_page, member_page) = (self.engine.channel_page_size, self.engine.member_page_size);
        let engine = self
            .engine
            .with_channel_page_size(channel_page)
            .with_member_page_size(member_page);

        Ok(Settings {
            team: TeamId::new(self.team),
            http,
            engine,
            taxonomy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const SAMPLE: &str = r#"
team = "team-1"

[server]
url = "http://localhost:8065"
token_env = "CLUB_TOKEN"
timeout_secs = 5

[engine]
sort_step = 100

[taxonomy]
order = ["Club Life", "Racing"]

[taxonomy.categories]
Racing = ["Monday Races", "Kaag Cup"]
"Club Life" = ["Town Square", "Club News"]
"#;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_and_resolve() {
        let file = write_config(SAMPLE);
        let config = AppConfig::load(file.path()).unwrap();
        let settings = config
            .resolve(|var| (var == "CLUB_TOKEN").then(|| "secret".to_string()))
            .unwrap();

        assert_eq!(settings.team, TeamId::new("team-1"));
        assert_eq!(settings.http.token, "secret");
        assert_eq!(settings.http.timeout, Duration::from_secs(5));
        assert_eq!(settings.engine.sort_step, 100);
        assert_eq!(settings.engine.sort_base, 10);
        let names: Vec<_> = settings.taxonomy.category_names().collect();
        assert_eq!(names, ["Club Life", "Racing"]);
        assert_eq!(
            settings.taxonomy.category("Racing").unwrap().channels,
            ["Monday Races", "Kaag Cup"]
        );
    }

    #[test]
    fn test_inline_token_wins() {
        let file = write_config(&SAMPLE.replace(
            "token_env = \"CLUB_TOKEN\"",
            "token = \"inline\"",
        ));
        let settings = AppConfig::load(file.path())
            .unwrap()
            .resolve(|_| Some("from-env".to_string()))
            .unwrap();
        assert_eq!(settings.http.token, "inline");
    }

    #[test]
    fn test_missing_token() {
        let file = write_config(&SAMPLE.replace("token_env = \"CLUB_TOKEN\"\n", ""));
        let err = AppConfig::load(file.path())
            .unwrap()
            .resolve(|_| None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingToken(ref var) if var == DEFAULT_TOKEN_ENV));
    }

    #[test]
    fn test_taxonomy_mismatch_rejected() {
        let file = write_config(&SAMPLE.replace(
            "order = [\"Club Life\", \"Racing\"]",
            "order = [\"Club Life\"]",
        ));
        let err = AppConfig::load(file.path())
            .unwrap()
            .resolve(|_| Some("t".to_string()))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Taxonomy(TaxonomyError::MissingFromOrder(ref name)) if name == "Racing"
        ));
    }

    #[test]
    fn test_zero_page_size_floored() {
        let file = write_config(&SAMPLE.replace("sort_step = 100", "channel_page_size = 0"));
        let settings = AppConfig::load(file.path())
            .unwrap()
            .resolve(|_| Some("t".to_string()))
            .unwrap();
        assert_eq!(settings.engine.channel_page_size, 1);
    }

    #[test]
    fn test_non_positive_sort_step_rejected() {
        for step in ["0", "-10"] {
            let file = write_config(&SAMPLE.replace("sort_step = 100", &format!("sort_step = {step}")));
            let err = AppConfig::load(file.path())
                .unwrap()
                .resolve(|_| Some("t".to_string()))
                .unwrap_err();
            assert!(matches!(err, ConfigError::SortStep(s) if s.to_string() == step));
        }
    }

    #[test]
    fn test_parse_error_names_file() {
        let file = write_config("team = ");
        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::load(Path::new("/nonexistent/taxon.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
