use protocol::{Area, ErrorCode, MAX_AREA_SIZE, MAX_VARS};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("Too many items: {0} exceeds the limit of {max}", max = MAX_VARS)]
    TooManyItems(usize),
    #[error("Array needs at least 1 item")]
    EmptyBatch,
    #[error("Wrong buffer length: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("Area buffer of {0} bytes exceeds the limit of {max}", max = MAX_AREA_SIZE)]
    SizeLimitExceeded(usize),
    #[error("Area {0:?} #{1} is already registered")]
    AlreadyExists(Area, u16),
    #[error("Area {0:?} #{1} is not registered")]
    UnknownArea(Area, u16),
    #[error("Protocol error: {0}")]
    Protocol(ErrorCode),
    #[error("Session is being destroyed")]
    Destroying,
    #[error("Server not started")]
    NotStarted,
    #[error("No async runtime available")]
    NoRuntime,
    #[error("Worker dropped the task before completion")]
    WorkerLost,
    #[error("Unexpected outcome for {0}")]
    UnexpectedOutcome(&'static str),
    #[error("Response of {actual} bytes does not match the requested {expected} bytes")]
    ResponseLength { expected: usize, actual: usize },
    #[error("Read/write request was dropped without completion")]
    NotCompleted,
}

impl Error {
    /// Status code of the error in the library's numeric space.
    ///
    /// Protocol codes come back verbatim; everything else maps onto the
    /// closest client or server code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Protocol(code) => *code,
            Error::InvalidArgument(_) | Error::EmptyBatch => ErrorCode::CLI_INVALID_PARAMS,
            Error::TooManyItems(_) => ErrorCode::CLI_TOO_MANY_ITEMS,
            Error::SizeMismatch { .. } | Error::SizeLimitExceeded(_) => ErrorCode::SRV_INVALID_PARAMS,
            Error::AlreadyExists(..) => ErrorCode::SRV_AREA_ALREADY_EXISTS,
            Error::UnknownArea(..) => ErrorCode::SRV_UNKNOWN_AREA,
            Error::Destroying | Error::NoRuntime | Error::WorkerLost => ErrorCode::CLI_DESTROYING,
            Error::NotStarted => ErrorCode::SRV_CANNOT_START,
            Error::UnexpectedOutcome(_) => ErrorCode::CLI_INVALID_PLC_ANSWER,
            Error::ResponseLength { .. } | Error::NotCompleted => ErrorCode::SRV_INVALID_PARAMS,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidArgument(_)
                | Error::TooManyItems(_)
                | Error::EmptyBatch
                | Error::SizeMismatch { .. }
                | Error::SizeLimitExceeded(_)
                | Error::AlreadyExists(..)
                | Error::UnknownArea(..)
        )
    }
}

impl From<ErrorCode> for Error {
    fn from(code: ErrorCode) -> Self {
        Error::Protocol(code)
    }
}
