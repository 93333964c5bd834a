use thiserror::Error;

/// Input problems that block a submission and are shown next to the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please paste at least one valid YouTube link.")]
    NoValidLinks,
    #[error("These links are already in the queue.")]
    AlreadyQueued,
}
