//! Controller errors.

use loudnorm_core::GraphError;
use loudnorm_host::WaitError;
use thiserror::Error;

/// Errors that stop the controller from starting or from updating.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControllerError {
    /// A host element or the loudness metadata never appeared.
    #[error("startup aborted: {0}")]
    Wait(#[from] WaitError),

    /// The audio graph rejected a wiring change.
    #[error("audio graph: {0}")]
    Graph(#[from] GraphError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_wraps_source() {
        let err: ControllerError = WaitError::Timeout { attempts: 51 }.into();
        assert_eq!(err.to_string(), "startup aborted: timeout after 51 attempts");
    }
}
