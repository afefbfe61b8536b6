use crate::extract::DecodePolicy;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use config::builder::DefaultState;
use serde::Deserialize;
use std::env;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    pub root: String,
    pub extension: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DecodeConfig {
    pub policy: DecodePolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StatsConfig {
    pub output_csv: String,
    pub workers: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub corpus: CorpusConfig,
    pub decode: DecodeConfig,
    pub stats: StatsConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_layered(environment())
    }

    fn load_layered(environment: Environment) -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(environment);

        builder.build()?.try_deserialize()
    }

    /// Defaults overlaid with a single explicit file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        defaults()?
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            corpus: CorpusConfig {
                root: "data/graphs".into(),
                extension: "rkyv".into(),
            },
            decode: DecodeConfig {
                policy: DecodePolicy::Strict,
            },
            stats: StatsConfig {
                output_csv: "graph_statistics.csv".into(),
                workers: 4,
            },
        }
    }
}

/// `PROTGRAPH__SECTION__KEY` overrides `section.key`.
fn environment() -> Environment {
    Environment::with_prefix("PROTGRAPH").separator("__")
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("corpus.root", "data/graphs")?
        .set_default("corpus.extension", "rkyv")?
        .set_default("decode.policy", "strict")?
        .set_default("stats.output_csv", "graph_statistics.csv")?
        .set_default("stats.workers", 4i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graphs.toml");
        std::fs::write(
            &path,
            "[corpus]\nroot = \"/srv/graphs_complex\"\n\n[decode]\npolicy = \"argmax\"\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.corpus.root, "/srv/graphs_complex");
        assert_eq!(config.corpus.extension, "rkyv");
        assert_eq!(config.decode.policy, DecodePolicy::Argmax);
        assert_eq!(config.stats.workers, 4);
    }

    #[test]
    fn test_environment_overrides() {
        let vars: HashMap<String, String> = [
            ("PROTGRAPH__CORPUS__ROOT", "/data/graphs_complex"),
            ("PROTGRAPH__DECODE__POLICY", "argmax"),
            ("PROTGRAPH__STATS__WORKERS", "8"),
            ("UNRELATED__CORPUS__ROOT", "/ignored"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let config = AppConfig::load_layered(environment().source(Some(vars))).unwrap();
        assert_eq!(config.corpus.root, "/data/graphs_complex");
        assert_eq!(config.decode.policy, DecodePolicy::Argmax);
        assert_eq!(config.stats.workers, 8);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(AppConfig::load_from(dir.path().join("absent.toml")).is_err());
    }
}
