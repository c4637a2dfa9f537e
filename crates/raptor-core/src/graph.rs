use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub group: String,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, label: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            group: group.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub from: String,
    pub to: String,
    pub label: String,
}

impl GraphEdge {
    pub fn new(
        id: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            label: label.into(),
        }
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.from == node_id || self.to == node_id
    }
}

/// Graph rendered in mock mode, when no database is attached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockGraphData {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl MockGraphData {
    pub fn from_json(data: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn load(path: &Path) -> CoreResult<Self> {
        let data = fs::read_to_string(path)?;
        let graph = Self::from_json(&data)?;
        tracing::debug!(
            path = %path.display(),
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "mock graph loaded"
        );
        Ok(graph)
    }

    /// Small root-cause chain rendered in mock mode when `graph.mock_file` is unset.
    pub fn sample() -> Self {
        Self {
            nodes: vec![
                GraphNode::new("n1", "Pump P-101 trip", "symptom"),
                GraphNode::new("n2", "Bearing overheating", "cause"),
                GraphNode::new("n3", "Insufficient lubrication", "cause"),
                GraphNode::new("n4", "Missed maintenance interval", "root-cause"),
                GraphNode::new("n5", "Vibration alarm", "symptom"),
            ],
            edges: vec![
                GraphEdge::new("e1", "n2", "n1", "CAUSES"),
                GraphEdge::new("e2", "n3", "n2", "CAUSES"),
                GraphEdge::new("e3", "n4", "n3", "CAUSES"),
                GraphEdge::new("e4", "n2", "n5", "CAUSES"),
            ],
        }
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edges_of<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges.iter().filter(move |e| e.touches(node_id))
    }

    /// Edges whose `from` or `to` names no node in this graph.
    pub fn dangling_edges(&self) -> Vec<&GraphEdge> {
        let ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        self.edges
            .iter()
            .filter(|e| !ids.contains(e.from.as_str()) || !ids.contains(e.to.as_str()))
            .collect()
    }

    pub fn validate(&self) -> CoreResult<()> {
        let mut seen = HashSet::new();
        for node in &self.nodes {
            if !seen.insert(node.id.as_str()) {
                return Err(CoreError::InvalidGraph(format!(
                    "duplicate node id {}",
                    node.id
                )));
            }
        }
        if let Some(edge) = self.dangling_edges().first() {
            return Err(CoreError::InvalidGraph(format!(
                "edge {} references unknown node ({} -> {})",
                edge.id, edge.from, edge.to
            )));
        }
        Ok(())
    }
}

/// Where the graph view takes its data from.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphMode {
    #[default]
    Mock,
    Neovis,
}

impl GraphMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GraphMode::Mock => "mock",
            GraphMode::Neovis => "neovis",
        }
    }
}

impl fmt::Display for GraphMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GraphMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(GraphMode::Mock),
            "neovis" => Ok(GraphMode::Neovis),
            other => Err(CoreError::Config(format!("unknown graph mode: {other}"))),
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphStatus {
    #[default]
    Ready,
    Rendering,
    Connecting,
    Error,
}

impl GraphStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GraphStatus::Ready => "ready",
            GraphStatus::Rendering => "rendering",
            GraphStatus::Connecting => "connecting",
            GraphStatus::Error => "error",
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, GraphStatus::Rendering | GraphStatus::Connecting)
    }
}

impl fmt::Display for GraphStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
