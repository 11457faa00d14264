//! Tool-call execution for one assistant turn (§4.5 "Tool execution").

use std::path::Path;

use agentcore_tool::{truncate_output, ChildSessionFactory, ToolContext, ToolRegistry};
use agentcore_types::{sanitize_utf8, AgentConfig, ContextConfig, Message, MessagePart, Permission, Role, SessionEvent};
use tokio_util::sync::CancellationToken;

use crate::callbacks::SessionCallbacks;
use crate::doom_loop::RecentCalls;
use crate::permission::PermissionCache;

/// Everything tool execution needs beyond the assistant message it is
/// draining and the mutable caches it updates in place.
pub(crate) struct ToolExecDeps<'a> {
    pub tools: &'a ToolRegistry,
    pub agent_config: &'a AgentConfig,
    pub context_config: &'a ContextConfig,
    pub working_dir: &'a Path,
    pub session_id: &'a str,
    pub cancellation: &'a CancellationToken,
    pub child_session_factory: Option<ChildSessionFactory>,
    pub callbacks: &'a SessionCallbacks,
}

fn mark_started(part: &mut MessagePart) {
    if let MessagePart::ToolCall { started, .. } = part {
        *started = true;
    }
}

fn mark_completed(part: &mut MessagePart) {
    if let MessagePart::ToolCall { completed, .. } = part {
        *completed = true;
    }
}

/// Execute every uncompleted tool call on `assistant`, in the order its
/// parts appear, producing the user message carrying their results (§4.5
/// steps 1-6, §8 property 5 "tool-result pairing").
pub(crate) async fn drain_tool_calls(
    assistant: &mut Message,
    deps: &ToolExecDeps<'_>,
    recent_calls: &mut RecentCalls,
    permission_cache: &mut PermissionCache,
    result_message_id: String,
    now: i64,
) -> Message {
    let mut result = Message::new(result_message_id.clone(), Role::User, deps.session_id.to_string(), now);

    let call_indices: Vec<usize> = assistant
        .parts
        .iter()
        .enumerate()
        .filter_map(|(i, p)| match p {
            MessagePart::ToolCall { completed, .. } if !completed => Some(i),
            _ => None,
        })
        .collect();

    for idx in call_indices {
        let (id, name, arguments) = match &assistant.parts[idx] {
            MessagePart::ToolCall { id, name, arguments, .. } => (id.clone(), name.clone(), arguments.clone()),
            _ => continue,
        };
        let canonical_args = serde_json::to_string(&arguments).unwrap_or_default();

        // 1. Doom-loop check: logged, never itself blocking.
        if recent_calls.is_doom_loop(&name, &canonical_args) {
            tracing::warn!(tool = %name, args = %canonical_args, "doom loop detected");
        }

        // 2. Resolve the tool.
        let Some(tool) = deps.tools.get(&name) else {
            mark_started(&mut assistant.parts[idx]);
            result.add_tool_result(&id, &name, format!("tool not found: {name}"), true);
            mark_completed(&mut assistant.parts[idx]);
            recent_calls.push(name.clone(), canonical_args);
            continue;
        };

        // 3. Permission check.
        let permission = ToolRegistry::permission_for(deps.agent_config, &name);
        let allowed = match permission {
            Permission::Allow => true,
            Permission::Deny => false,
            Permission::Ask => {
                if let Some(cached) = permission_cache.cached(&name) {
                    cached
                } else if let Some(handler) = &deps.callbacks.permission_handler {
                    let granted = handler(Permission::Ask, format!("Allow tool call: {name}?")).await;
                    if granted {
                        permission_cache.allow(&name);
                    } else {
                        permission_cache.deny(&name);
                    }
                    granted
                } else {
                    false
                }
            }
        };
        if !allowed {
            mark_started(&mut assistant.parts[idx]);
            result.add_tool_result(&id, &name, format!("permission denied: {name}"), true);
            mark_completed(&mut assistant.parts[idx]);
            recent_calls.push(name.clone(), canonical_args);
            continue;
        }

        // 4. Build the execution context; mark started.
        mark_started(&mut assistant.parts[idx]);
        let ctx = ToolContext {
            session_id: deps.session_id.to_string(),
            message_id: result_message_id.clone(),
            working_dir: deps.working_dir.to_path_buf(),
            cancellation: deps.cancellation.clone(),
            permission: deps.callbacks.permission_handler.clone(),
            subagent_event: None,
            child_session_factory: deps.child_session_factory.clone(),
            question_handler: deps.callbacks.question_handler.clone(),
        };

        // 5. Execute, truncate, sanitize.
        let (output, is_error) = match tool.call(arguments, ctx).await {
            Ok(outcome) => (outcome.output, outcome.is_error),
            Err(e) => (e.to_string(), true),
        };
        let truncated = match truncate_output(&output, deps.working_dir, deps.context_config.truncate_max_lines, deps.context_config.truncate_max_bytes).await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "truncation spool failed; forwarding output untruncated");
                output
            }
        };
        let sanitized = sanitize_utf8(truncated.as_bytes());

        result.add_tool_result(&id, &name, sanitized.clone(), is_error);
        if let Some(cb) = &deps.callbacks.on_tool_result {
            cb(&id, &name, &sanitized, is_error);
        }
        if let Some(cb) = &deps.callbacks.on_event {
            cb(&SessionEvent::ToolCallCompleted { id: id.clone(), name: name.clone(), success: !is_error });
        }
        tracing::info!(id = %id, name = %name, is_error, "tool call completed");

        // 6. Mark completed; push the ring buffer.
        mark_completed(&mut assistant.parts[idx]);
        recent_calls.push(name, canonical_args);
    }

    result
}
