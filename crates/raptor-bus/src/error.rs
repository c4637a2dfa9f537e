use thiserror::Error;

pub type BusResult<T> = Result<T, BusError>;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("failed to encode payload for {event}: {source}")]
    Encode {
        event: &'static str,
        source: serde_json::Error,
    },
}
