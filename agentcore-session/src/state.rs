//! Session lifecycle state (§4.5).

/// Where a session currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Constructed but no turn has run yet.
    Idle,
    /// The loop is actively driving a turn.
    Running,
    /// Suspended while tool calls execute.
    WaitingForTool,
    /// Suspended waiting for a user-facing callback (permission, question).
    WaitingForUser,
    /// Suspended while the compaction sub-call runs.
    Compacting,
    /// The loop exited normally.
    Completed,
    /// The loop exited after a fatal error.
    Failed,
    /// The loop exited because `cancel()` was called.
    Cancelled,
}
