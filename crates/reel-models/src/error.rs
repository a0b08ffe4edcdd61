//! Model error types.

use thiserror::Error;

use crate::JobStatus;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    #[error("Job is already terminal ({0})")]
    AlreadyTerminal(JobStatus),

    #[error("Slot {index} out of range for {len} sub-jobs")]
    SlotOutOfRange { index: usize, len: usize },

    #[error("Slot {0} is already resolved")]
    SlotAlreadyResolved(usize),
}
