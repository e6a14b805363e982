/// Result alias that carries the custom [`RatingsError`] type.
pub type Result<T> = std::result::Result<T, RatingsError>;

/// Common error type for the core crate.
///
/// Windowed queries never produce an error: an empty or single-sample series
/// yields `None` ("no data") and coinciding neighbours are absorbed by the
/// interpolation epsilon. Only the recompute path and configuration loading
/// report failures through this type.
#[derive(Debug, thiserror::Error)]
pub enum RatingsError {
    /// The map has fewer notes than the analyzers need. The previously
    /// published series pair stays in place.
    #[error("ratings require {required} or more notes to analyze the map, current note count: {notes}")]
    InsufficientData { notes: usize, required: usize },
    /// An external provider failed while recomputing. Recoverable; the
    /// previous series pair stays in place.
    #[error("{provider} provider failed: {message}")]
    ProviderFailure {
        provider: &'static str,
        message: String,
    },
    /// The swing analyzer returned no analysis for the loaded difficulty.
    #[error("no analysis available for {characteristic}/{difficulty}")]
    MissingDifficulty {
        characteristic: String,
        difficulty: String,
    },
    /// A newer recompute was requested while this one was running.
    #[error("recompute generation {generation} was superseded by a newer map load")]
    Superseded { generation: u64 },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl RatingsError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    /// Wraps a failure reported by one of the external providers.
    pub fn provider<E: std::fmt::Display>(provider: &'static str, err: E) -> Self {
        Self::ProviderFailure {
            provider,
            message: err.to_string(),
        }
    }

    /// Whether the session can keep running with its previous ratings.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InsufficientData { .. }
                | Self::ProviderFailure { .. }
                | Self::MissingDifficulty { .. }
                | Self::Superseded { .. }
        )
    }
}
