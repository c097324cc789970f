//! Error type shared by the library and the CLI.

use crate::instance::PointId;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("invalid payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("unknown point {0}")]
    UnknownPoint(PointId),
    #[error("point {0} already exists")]
    DuplicatePoint(PointId),
    #[error("an edge cannot connect point {0} to itself")]
    SelfEdge(PointId),
    #[error("a run is in progress, the campus graph is frozen until it completes")]
    RunInProgress,
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}
