use thiserror::Error;

/// Integrity faults in a snapshot. Any of these aborts the tick without
/// touching match state.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DataFault {
    #[error("snapshot has no agent for self id `{0}`")]
    SelfNotFound(String),
    #[error("snapshot has {count} agents for self id `{id}`")]
    AmbiguousSelf { id: String, count: usize },
    #[error("unknown facing `{0}`")]
    UnknownFacing(String),
}

#[derive(Debug, Error)]
pub enum TickError {
    #[error("invalid json payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("malformed payload: {0}")]
    Malformed(String),
    #[error(transparent)]
    Fault(#[from] DataFault),
}

impl TickError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}
