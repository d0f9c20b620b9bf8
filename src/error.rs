use std::io::Error as IoError;

/// The one error type this crate raises.
///
/// The engine never retries; every variant here propagates synchronously to
/// the caller of the operation that produced it.
#[derive(Debug)]
pub enum UndoError {
    /// A precondition inside an encoder was violated (e.g. a non-positive
    /// length, or a rect outside of an image's bounds). This indicates a bug
    /// in the calling editor code, not a recoverable runtime condition.
    Precondition(&'static str),

    /// A chunk could not be inverted because the live object it references
    /// no longer matches what the chunk expects (wrong type, wrong shape, or
    /// a collaborator the inverter requires to exist is gone).
    LiveObjectMismatch(&'static str),

    /// Reading or writing the on-disk configuration file failed.
    Config(IoError),
}

impl UndoError {
    pub(crate) fn precondition(reason: &'static str) -> Self {
        Self::Precondition(reason)
    }

    pub(crate) fn mismatch(reason: &'static str) -> Self {
        Self::LiveObjectMismatch(reason)
    }
}

impl From<IoError> for UndoError {
    fn from(error: IoError) -> Self {
        Self::Config(error)
    }
}

impl std::fmt::Display for UndoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Precondition(reason) => write!(f, "undo precondition violated: {}", reason),
            Self::LiveObjectMismatch(reason) => write!(f, "undo object mismatch: {}", reason),
            Self::Config(err) => write!(f, "undo config error: {}", err),
        }
    }
}

impl std::error::Error for UndoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            _ => None,
        }
    }
}

pub type UndoResult<T> = Result<T, UndoError>;
