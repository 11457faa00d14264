//! Token estimation (§4.5): 4 characters ≈ 1 token.

use agentcore_types::{Message, MessagePart};

const CHARS_PER_TOKEN: u64 = 4;

/// Estimate the token count of a message sequence by summing visible text
/// and the output of non-compacted tool-result parts, at 4 chars/token.
pub fn estimate_tokens(messages: &[Message]) -> u64 {
    messages.iter().map(estimate_message_tokens).sum()
}

fn estimate_message_tokens(message: &Message) -> u64 {
    message
        .parts
        .iter()
        .map(|part| match part {
            MessagePart::Text { text } => chars_to_tokens(text.len()),
            MessagePart::ToolResult { output, compacted, .. } if !compacted => chars_to_tokens(output.len()),
            _ => 0,
        })
        .sum()
}

fn chars_to_tokens(chars: usize) -> u64 {
    (chars as u64).div_ceil(CHARS_PER_TOKEN)
}

/// Whether context-estimated tokens exceed 80% of the model's context
/// window — the compaction trigger (§4.5).
pub fn should_compact(messages: &[Message], context_window: u32) -> bool {
    estimate_tokens(messages) > (context_window as u64 * 4) / 5
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentcore_types::Role;

    #[test]
    fn empty_messages_estimate_to_zero() {
        assert_eq!(estimate_tokens(&[]), 0);
    }

    #[test]
    fn text_part_counts_four_chars_per_token() {
        let m = Message::with_text("m1", Role::User, "s1", 0, "12345678");
        assert_eq!(estimate_tokens(&[m]), 2);
    }

    #[test]
    fn compacted_tool_result_contributes_nothing() {
        let mut m = Message::new("m1", Role::User, "s1", 0);
        m.add_tool_result("t1", "echo", "x".repeat(400), false);
        if let MessagePart::ToolResult { compacted, .. } = &mut m.parts[0] {
            *compacted = true;
        }
        assert_eq!(estimate_tokens(&[m]), 0);
    }

    #[test]
    fn should_compact_trips_at_eighty_percent_of_window() {
        // context_window=10000 tokens, 80% threshold = 8000; 8001 tokens ≈ 32004 chars (§8 S4).
        let m = Message::with_text("m1", Role::User, "s1", 0, "a".repeat(32004));
        assert!(should_compact(&[m], 10000));
        let small = Message::with_text("m2", Role::User, "s1", 0, "a".repeat(100));
        assert!(!should_compact(&[small], 10000));
    }
}
