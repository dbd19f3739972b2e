use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid task status: {0} (expected: queued|started|finished|failed|canceled)")]
    InvalidStatus(String),
}
