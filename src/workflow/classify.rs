// Error classification - maps collaborator failures to step dispositions

/// How a failed external call affects the step that made it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The external system reported that the target state already holds.
    /// The step checkpoints the `"ok"` sentinel and counts as done.
    IdempotentSuccess,
    /// Anything else. The step writes no checkpoint, so the next invocation
    /// of the workflow retries it.
    Fatal,
}

/// Implemented by each collaborator's error enum as a total match over its
/// variants. Keeping classification on the error type means a new
/// collaborator extends the mapping without touching the step runner.
pub trait Classify {
    fn disposition(&self) -> Disposition;
}
