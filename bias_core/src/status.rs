//! Lock status returned from each control cycle.

use crate::error::LockError;

#[derive(Debug, Clone, PartialEq)]
pub enum LockStatus {
    /// Outside tolerance; fine tracking is still moving.
    Searching,
    /// Within tolerance of the target.
    Converged,
    /// A rail was hit and coarse acquisition re-anchored the lock.
    Reacquired,
    /// The lock attempt failed; the actuator holds its last step.
    Aborted(LockError),
}

/// Controller phase carried between cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Acquiring,
    Searching,
    Converged,
}
