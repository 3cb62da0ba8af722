use thiserror::Error;

/// Gateway failures. Transport and API errors are transient and surfaced to
/// the user; validation errors block submission until the form is corrected.
/// None are retried automatically.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{message}")]
    Api { message: String },

    #[error("missing required field: {field}")]
    Validation { field: &'static str },
}
