use thiserror::Error;

/// Card-level ingestion failure. Malformed fields and container entries never
/// surface here; they are logged and fall back to defaults or are skipped.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing configuration for docker card")]
    Missing,
}
