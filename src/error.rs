#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Reward API error {code}: {msg}")]
    RewardApi { code: i64, msg: String },

    #[error("Reward claim for day {day} failed: {source}")]
    ClaimFailed {
        day: u32,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Whether the user may simply try the same check-in again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::ClaimFailed { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
