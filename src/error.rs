use thiserror::Error;

use crate::registry::ConnectorId;

#[derive(Debug, Error)]
pub enum DockError {
    #[error("unknown connector handle {0}")]
    UnknownConnector(ConnectorId),
    #[error("connector spacing must be finite and positive, got {0}")]
    InvalidSpacing(f32),
    #[error("group `{0}` has invalid bounds (width and height must be finite and positive)")]
    InvalidBounds(String),
    #[error("connector `{connector}` references unknown group `{group}`")]
    UnknownGroup { connector: String, group: String },
    #[error("duplicate group id `{0}`")]
    DuplicateGroup(String),
    #[error("duplicate connector id `{0}`")]
    DuplicateConnector(String),
    #[error("connector `{0}` starts and ends on the same group")]
    SelfConnection(String),
    #[error("failed to parse scene: {0}")]
    Parse(String),
}

pub type Result<T, E = DockError> = std::result::Result<T, E>;
