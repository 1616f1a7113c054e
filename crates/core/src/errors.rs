use thiserror::Error;

/// Unified error type for the entire rate-watch-core library.
/// Every public fallible function returns `Result<T, CoreError>`.
///
/// `Clone` so that one in-flight request can hand the same outcome to
/// every caller waiting on it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    // ── API / Network ───────────────────────────────────────────────
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error {status}: {body}")]
    Server {
        status: u16,
        body: String,
    },

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ── Input ───────────────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl CoreError {
    /// True for failures where the request never produced a usable response
    /// (transport failure or non-2xx status).
    pub fn is_request_failure(&self) -> bool {
        matches!(self, CoreError::Network(_) | CoreError::Server { .. })
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors carry the full URL; keep only the path.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        if e.is_decode() {
            CoreError::Deserialization(sanitized)
        } else {
            CoreError::Network(sanitized)
        }
    }
}
