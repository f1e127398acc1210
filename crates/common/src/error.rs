use thiserror::Error;

/// Top-level error type for geocoding operations.
///
/// "Nothing usable in the response" is not an error: see the extractor's
/// `Diagnostic` for that case.
#[derive(Debug, Error)]
pub enum GeoError {
    // --- Setup errors (caller misused the client) ---
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("HTTP client not initialized: {0}")]
    NotInitialized(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    // --- Upstream errors ---
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl GeoError {
    /// Whether a later identical call could succeed (network hiccup, 5xx, 429).
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Whether the error comes from the upstream service rather than local setup.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Deserialization(_))
    }
}

impl From<serde_json::Error> for GeoError {
    fn from(e: serde_json::Error) -> Self {
        Self::Deserialization(e.to_string())
    }
}

/// Result type alias for geocoding operations.
pub type Result<T> = std::result::Result<T, GeoError>;
