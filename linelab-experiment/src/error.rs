use linelab_core::SessionPhase;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no playable series with at least one trial is loaded")]
    NotReady,
    #[error("no trial is active")]
    NoActiveTrial,
    #[error("operation not valid in the {0:?} phase")]
    WrongPhase(SessionPhase),
}
