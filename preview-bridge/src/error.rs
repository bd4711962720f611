use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Failed to open stream: {0}")]
    OpenFailed(String),

    #[error("Decoder operation failed: {0}")]
    DecoderFailed(String),

    #[error("Host integration failed: {0}")]
    HostFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
