pub mod chat;
pub mod config;
pub mod error;
pub mod graph;
pub mod logging;

pub use chat::{ChatMessage, ChatRole};
pub use config::{AppConfig, GraphConfig, LoggingConfig, Neo4jConfig};
pub use error::{format_error_chain, log_error, CoreError, CoreResult};
pub use graph::{GraphEdge, GraphMode, GraphNode, GraphStatus, MockGraphData};
