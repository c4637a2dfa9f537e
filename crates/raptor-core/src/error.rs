use std::error::Error;
use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("config error: {0}")]
    Config(String),
    #[error("invalid graph: {0}")]
    InvalidGraph(String),
}

/// Renders an error followed by every `source` in its chain, one per line.
///
/// ```
/// use raptor_core::{format_error_chain, CoreError};
///
/// let err = CoreError::Config("graph.neo4j.url is required".to_string());
/// assert_eq!(format_error_chain(&err), "config error: graph.neo4j.url is required");
/// ```
pub fn format_error_chain<E: Error + ?Sized>(error: &E) -> String {
    let mut chain = vec![error.to_string()];
    let mut source = error.source();

    while let Some(err) = source {
        chain.push(format!("  caused by: {}", err));
        source = err.source();
    }

    chain.join("\n")
}

/// Logs an error with its full chain at `error` level.
pub fn log_error<E: Error + ?Sized>(context: &str, error: &E) {
    let error_chain = format_error_chain(error);
    tracing::error!(
        context = context,
        error = %error_chain,
        "error occurred"
    );
}
