//=========================================================================
// State Stack Errors
//=========================================================================
//
// Failures reported synchronously by stack mutations.
//
// Every failure represents caller misuse. Nothing is retried and the
// stack is left unmutated by the change that failed.
//
//=========================================================================

//=== ErrorKind ===========================================================

/// Broad classification of a [`StackError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A supplied value can never be accepted.
    InvalidArgument,

    /// The operation is not allowed in the current state.
    InvalidOperation,
}

//=== StackError ==========================================================

/// Errors raised while pushing states or applying queued changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackError {
    /// The state is already owned by a stack.
    AlreadyAttached,

    /// The state does not belong to any live stack.
    NotAttached,

    /// The owning stack is mid `update`/`draw` traversal.
    TraversalInProgress,

    /// The state was removed from a stack and has not been reset.
    Retired,
}

impl StackError {
    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyAttached
            | Self::NotAttached
            | Self::TraversalInProgress
            | Self::Retired => ErrorKind::InvalidOperation,
        }
    }
}

impl std::fmt::Display for StackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyAttached => write!(f, "State already in a stack"),
            Self::NotAttached => write!(f, "State not associated with a stack"),
            Self::TraversalInProgress => {
                write!(f, "Stack cannot be mutated while it is being traversed")
            }
            Self::Retired => write!(f, "State was removed from a stack and must be reset"),
        }
    }
}

impl std::error::Error for StackError {}

//=========================================================================
// Unit Tests
//=========================================================================
