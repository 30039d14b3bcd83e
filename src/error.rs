/// Failures surfaced by the attendance core and the record-store gateway.
///
/// Each variant is terminal for the operation that raised it only; callers
/// keep their session and cached views at the last good value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttendanceError {
    /// Detected locally before any request is sent.
    #[error("{0}")]
    Validation(String),

    /// The store answered `success:false`, or the exchange itself failed.
    #[error("{0}")]
    Remote(String),

    /// Fetched data carries a status or date the client cannot interpret.
    #[error("{0}")]
    DataIntegrity(String),
}

impl AttendanceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote(message.into())
    }

    pub fn data_integrity(message: impl Into<String>) -> Self {
        Self::DataIntegrity(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::Remote(_) => "remote_failed",
            Self::DataIntegrity(_) => "data_integrity",
        }
    }
}

pub type AttendanceResult<T> = Result<T, AttendanceError>;
