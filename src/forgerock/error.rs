use thiserror::Error;

/// Possible error types while working with ForgeRock.
///
/// An authentication failure reported by the server is *not* an error:
/// it surfaces as [`LoginOutcome::Failed`](super::LoginOutcome::Failed).
#[derive(Debug, Error)]
pub enum ForgeRockError {
    #[error("request to the authenticate endpoint failed: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("authenticate endpoint returned an unusable body: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid authenticate endpoint: {0}")]
    Url(#[from] url::ParseError),
    #[error("{callback_type} at index {index} has no `{name}` output")]
    MissingOutput {
        callback_type: String,
        index: usize,
        name: &'static str,
    },
    #[error("{callback_type} at index {index} has an unusable `{name}` output")]
    InvalidOutput {
        callback_type: String,
        index: usize,
        name: &'static str,
    },
}
