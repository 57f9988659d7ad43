use thiserror::Error;

/// Failure taxonomy for submitted transforms.
///
/// The first two variants are declines: the machinery worked, the transform
/// itself said no. The worker variants mean the infrastructure failed and
/// the task may never have run. `QueueFull` and `Closed` are submission-time
/// failures; the task was never accepted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransformError {
    #[error("Unsupported transform action: {0}")]
    UnsupportedAction(String),

    #[error("Transform declined: {0}")]
    Declined(String),

    #[error("Cipher worker fault: {0}")]
    WorkerFault(String),

    #[error("Cipher worker exited before responding")]
    WorkerExited,

    #[error("Transform queue is at capacity")]
    QueueFull,

    #[error("Cipher executor is shut down")]
    Closed,
}

impl TransformError {
    /// True when the transform itself declined the request, as opposed to
    /// the machinery running it having failed.
    pub fn is_declined(&self) -> bool {
        matches!(
            self,
            TransformError::UnsupportedAction(_) | TransformError::Declined(_)
        )
    }
}
