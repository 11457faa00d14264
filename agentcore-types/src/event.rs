//! Session-lifecycle events (§4.5), distinct from the per-token
//! [`crate::StreamEvent`] vocabulary: one fires per session/tool-call
//! milestone rather than per decoded chunk.

/// A session-lifecycle milestone a caller may want to observe independent
/// of the message/callback list — e.g. to drive a UI notification or an
/// external event log.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A session came into existence, either freshly constructed or
    /// rehydrated via resume.
    SessionCreated {
        /// The session's id.
        session_id: String,
    },
    /// A tool call began executing, after its permission check passed.
    ToolCallStarted {
        /// The call's id.
        id: String,
        /// The tool name.
        name: String,
    },
    /// A tool call finished executing (successfully or with a tool-level
    /// error).
    ToolCallCompleted {
        /// The call's id.
        id: String,
        /// The tool name.
        name: String,
        /// Whether the call succeeded.
        success: bool,
    },
    /// A pruning pass reclaimed at least `prune_minimum_tokens`.
    ContextCompacted {
        /// Estimated token total before pruning.
        before_tokens: u64,
        /// Estimated token total after pruning.
        after_tokens: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_carry_their_fields() {
        let e = SessionEvent::ToolCallCompleted { id: "1".into(), name: "bash".into(), success: true };
        match e {
            SessionEvent::ToolCallCompleted { id, name, success } => {
                assert_eq!(id, "1");
                assert_eq!(name, "bash");
                assert!(success);
            }
            _ => panic!("wrong variant"),
        }
    }
}
