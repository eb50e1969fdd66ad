/// Why a connection stopped delivering intents or accepting updates.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("The other side of the connection is gone")]
    Closed,
}
