//! In-place pruning of old tool-result output (§4.5).

use std::collections::HashSet;

use agentcore_types::{Message, MessagePart};

const CHARS_PER_TOKEN: u64 = 4;
const CLEARED_PLACEHOLDER: &str = "[Old tool result content cleared]";

/// Before/after token totals for a pruning pass, for a `ContextCompacted`
/// event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PruneReport {
    pub before_tokens: u64,
    pub after_tokens: u64,
}

impl PruneReport {
    /// Tokens reclaimed by this pass.
    pub fn reclaimed(&self) -> u64 {
        self.before_tokens.saturating_sub(self.after_tokens)
    }
}

/// Walk `messages` newest to oldest, clearing non-compacted tool-result
/// output once the trailing "protected" window exceeds `protect_tokens`.
/// Tools named in `protected_tools` (e.g. skill results) are never cleared.
///
/// Always mutates in place and returns the before/after totals; the caller
/// decides whether `report.reclaimed() >= prune_minimum_tokens` warrants
/// emitting a `ContextCompacted` event (§4.5).
pub fn prune(messages: &mut [Message], protect_tokens: u64, protected_tools: &HashSet<String>, now: i64) -> PruneReport {
    let before_tokens = total_tool_result_tokens(messages);

    let mut protected_so_far = 0u64;
    for message in messages.iter_mut().rev() {
        for part in message.parts.iter_mut() {
            let MessagePart::ToolResult { tool_name, output, compacted, compacted_at, .. } = part else { continue };
            if *compacted {
                continue;
            }
            let tokens = chars_to_tokens(output.len());
            if protected_so_far < protect_tokens {
                protected_so_far += tokens;
                continue;
            }
            if protected_tools.contains(tool_name.as_str()) {
                continue;
            }
            *compacted = true;
            *compacted_at = Some(now);
            *output = CLEARED_PLACEHOLDER.to_string();
        }
    }

    let after_tokens = total_tool_result_tokens(messages);
    PruneReport { before_tokens, after_tokens }
}

fn total_tool_result_tokens(messages: &[Message]) -> u64 {
    messages
        .iter()
        .flat_map(|m| m.parts.iter())
        .filter_map(|p| match p {
            MessagePart::ToolResult { output, compacted: false, .. } => Some(chars_to_tokens(output.len())),
            _ => None,
        })
        .sum()
}

fn chars_to_tokens(chars: usize) -> u64 {
    (chars as u64).div_ceil(CHARS_PER_TOKEN)
}
