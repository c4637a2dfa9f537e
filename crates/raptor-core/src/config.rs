use crate::error::{CoreError, CoreResult};
use crate::graph::{GraphMode, MockGraphData};
use crate::logging::DEFAULT_FILTER;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "raptor.json";
pub const DEFAULT_INITIAL_CYPHER: &str = "MATCH (n)-[r]->(m) RETURN n,r,m LIMIT 25";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub graph: GraphConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct GraphConfig {
    pub mode: GraphMode,
    pub neo4j: Neo4jConfig,
    /// JSON graph shown in mock mode; the built-in sample when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mock_file: Option<PathBuf>,
}

impl GraphConfig {
    pub fn mock_graph(&self) -> CoreResult<MockGraphData> {
        match &self.mock_file {
            Some(path) => MockGraphData::load(path),
            None => Ok(MockGraphData::sample()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
        }
    }
}

/// Connection settings handed to the graph renderer in neovis mode.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Neo4jConfig {
    pub url: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub initial_cypher: String,
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            url: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: String::new(),
            database: "neo4j".to_string(),
            initial_cypher: DEFAULT_INITIAL_CYPHER.to_string(),
        }
    }
}

impl fmt::Debug for Neo4jConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Neo4jConfig")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("initial_cypher", &self.initial_cypher)
            .finish()
    }
}

impl AppConfig {
    /// Reads `path` if it exists, otherwise starts from defaults, then layers
    /// the process environment on top.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let mut cfg = Self::from_file(path)?;
        cfg.apply_overrides(|key| std::env::var(key).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)?;
        let cfg: AppConfig = serde_json::from_str(&data)?;
        tracing::info!(path = %path.display(), mode = %cfg.graph.mode, "config loaded");
        Ok(cfg)
    }

    /// Applies `RAPTOR_GRAPH_MODE` and `NEO4J_*` overrides from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> CoreResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = lookup("RAPTOR_GRAPH_MODE") {
            self.graph.mode = mode.parse()?;
        }
        let neo4j = &mut self.graph.neo4j;
        for (key, slot) in [
            ("NEO4J_URL", &mut neo4j.url),
            ("NEO4J_USER", &mut neo4j.user),
            ("NEO4J_PASSWORD", &mut neo4j.password),
            ("NEO4J_DATABASE", &mut neo4j.database),
        ] {
            if let Some(value) = lookup(key) {
                *slot = value;
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.graph.mode == GraphMode::Neovis && self.graph.neo4j.url.trim().is_empty() {
            return Err(CoreError::Config(
                "graph.neo4j.url is required in neovis mode".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AppConfig::from_file(&dir.path().join("absent.json")).unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.graph.mode, GraphMode::Mock);
        assert_eq!(cfg.logging.filter, "info");
    }

    #[test]
    fn reads_partial_file_with_camel_case_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"graph": {{"mode": "neovis", "neo4j": {{"url": "bolt://db:7687", "initialCypher": "MATCH (n) RETURN n"}}}}}}"#
        )
        .unwrap();

        let cfg = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(cfg.graph.mode, GraphMode::Neovis);
        assert_eq!(cfg.graph.neo4j.url, "bolt://db:7687");
        assert_eq!(cfg.graph.neo4j.initial_cypher, "MATCH (n) RETURN n");
        assert_eq!(cfg.graph.neo4j.user, "neo4j");
    }

    #[test]
    fn malformed_file_is_a_serde_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            AppConfig::from_file(file.path()),
            Err(CoreError::Serde(_))
        ));
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = [
            ("RAPTOR_GRAPH_MODE", "neovis"),
            ("NEO4J_PASSWORD", "s3cret"),
            ("NEO4J_DATABASE", "rca"),
        ]
        .into_iter()
        .collect();

        let mut cfg = AppConfig::default();
        cfg.apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(cfg.graph.mode, GraphMode::Neovis);
        assert_eq!(cfg.graph.neo4j.password, "s3cret");
        assert_eq!(cfg.graph.neo4j.database, "rca");
        assert_eq!(cfg.graph.neo4j.url, "bolt://localhost:7687");
    }

    #[test]
    fn bad_mode_override_is_rejected() {
        let mut cfg = AppConfig::default();
        let result =
            cfg.apply_overrides(|k| (k == "RAPTOR_GRAPH_MODE").then(|| "3d".to_string()));
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[test]
    fn neovis_requires_url() {
        let mut cfg = AppConfig::default();
        cfg.graph.mode = GraphMode::Neovis;
        cfg.graph.neo4j.url = "  ".to_string();
        assert!(cfg.validate().is_err());

        cfg.graph.mode = GraphMode::Mock;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn mock_graph_defaults_to_sample() {
        let graph = GraphConfig::default().mock_graph().unwrap();
        assert_eq!(graph, MockGraphData::sample());
    }

    #[test]
    fn mock_graph_reads_configured_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"nodes": [{{"id": "a", "label": "Alarm", "group": "symptom"}}], "edges": []}}"#
        )
        .unwrap();

        let cfg = GraphConfig {
            mock_file: Some(file.path().to_path_buf()),
            ..GraphConfig::default()
        };
        let graph = cfg.mock_graph().unwrap();
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.node("a").map(|n| n.label.as_str()), Some("Alarm"));
    }

    #[test]
    fn missing_mock_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = GraphConfig {
            mock_file: Some(dir.path().join("graph.json")),
            ..GraphConfig::default()
        };
        assert!(matches!(cfg.mock_graph(), Err(CoreError::Io(_))));
    }

    #[test]
    fn mock_file_key_is_read_from_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"graph": {{"mock_file": "graphs/rca.json"}}}}"#).unwrap();

        let cfg = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(cfg.graph.mock_file, Some(PathBuf::from("graphs/rca.json")));
    }

    #[test]
    fn debug_redacts_password() {
        let neo4j = Neo4jConfig {
            password: "hunter2".to_string(),
            ..Neo4jConfig::default()
        };
        let rendered = format!("{:?}", neo4j);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
