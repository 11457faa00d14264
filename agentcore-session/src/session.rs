//! The session engine: the `Session` struct and its main loop (§4.5).

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use agentcore_context::{compact, prune, should_compact};
use agentcore_state_fs::{FsStore, SessionMeta};
use agentcore_tool::{ChildSessionFactory, SessionHandle, ToolRegistry};
use agentcore_types::{
    AgentConfig, CompletionRequest, ContextConfig, FinishReason, LoopError, Message, MessagePart,
    Provider, ProviderError, Role, SessionError, SessionEvent, SessionId, ToolDefinition, UsageTotals,
};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::callbacks::SessionCallbacks;
use crate::doom_loop::RecentCalls;
use crate::permission::PermissionCache;
use crate::prompt::assemble;
use crate::provider_select::{select_provider, ProviderLookup};
use crate::state::SessionState;
use crate::stream_accum::StepAccumulator;
use crate::tool_exec::{drain_tool_calls, ToolExecDeps};

const MAX_LOOP_ITERATIONS: usize = 100;
const TITLE_MAX_CHARS: usize = 50;

/// Derive a display title from a user prompt's text, truncated to
/// [`TITLE_MAX_CHARS`] characters (§4.5 "Session-level metadata").
fn derive_title(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.chars().count() <= TITLE_MAX_CHARS {
        return Some(trimmed.to_string());
    }
    Some(trimmed.chars().take(TITLE_MAX_CHARS).collect())
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn context_window(provider: &dyn Provider, model: &str) -> u32 {
    provider.models().iter().find(|m| m.id == model).map(|m| m.context_window).unwrap_or(100_000)
}

/// Per-request knobs that `AgentConfig` doesn't carry (§4.5 "Request
/// construction ... temperature/stop sequences, from configuration when
/// provided"). Not named by the agent profile itself, so a session
/// configures them separately.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Sampling temperature, if set.
    pub temperature: Option<f32>,
    /// Stop sequences, if any.
    pub stop_sequences: Vec<String>,
}

/// One conversational agent session: state machine, provider binding, tool
/// registry, context management, and persistence, all wired together (§4.5).
pub struct Session {
    id: SessionId,
    parent_id: Option<SessionId>,
    agent_config: AgentConfig,
    provider: Arc<dyn Provider>,
    tools: ToolRegistry,
    store: Option<Arc<FsStore>>,
    context_config: ContextConfig,
    working_dir: PathBuf,
    system_prompt: String,
    cancellation: CancellationToken,
    state: SessionState,
    messages: Vec<Message>,
    recent_calls: RecentCalls,
    permission_cache: PermissionCache,
    callbacks: SessionCallbacks,
    protected_tools: HashSet<String>,
    options: SessionOptions,
    child_session_factory: Option<ChildSessionFactory>,
    total_usage: UsageTotals,
    title: Option<String>,
    created_at: i64,
}

impl Session {
    /// Construct a fresh session: bind a provider by the agent's model via
    /// [`select_provider`], and assemble its system prompt via
    /// [`assemble`] (§4.5 "Provider selection", "System-prompt assembly").
    pub fn new(
        lookup: &dyn ProviderLookup,
        agent_config: AgentConfig,
        tools: ToolRegistry,
        context_config: ContextConfig,
        working_dir: PathBuf,
        store: Option<Arc<FsStore>>,
        home_dir: Option<PathBuf>,
    ) -> Result<Self, SessionError> {
        let provider = select_provider(lookup, &agent_config.model)
            .ok_or_else(|| SessionError::NoProvider(agent_config.model.clone()))?;
        let system_prompt = assemble(&agent_config.system_prompt, &working_dir, home_dir.as_deref());
        let created = now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            parent_id: None,
            agent_config,
            provider,
            tools,
            store,
            context_config,
            working_dir,
            system_prompt,
            cancellation: CancellationToken::new(),
            state: SessionState::Idle,
            messages: Vec::new(),
            recent_calls: RecentCalls::new(),
            permission_cache: PermissionCache::new(),
            callbacks: SessionCallbacks::default(),
            protected_tools: HashSet::new(),
            options: SessionOptions::default(),
            child_session_factory: None,
            total_usage: UsageTotals::default(),
            title: None,
            created_at: created,
        })
    }

    /// Attach callbacks (builder style).
    pub fn with_callbacks(mut self, callbacks: SessionCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Set per-request temperature/stop-sequence options (builder style).
    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Declare tool ids whose output pruning must never clear (builder
    /// style). Neither `AgentConfig` nor `ContextConfig` name which tools
    /// count as "skill" tools (§4.5 "skill-tool protection"); callers supply
    /// the set explicitly.
    pub fn with_protected_tools(mut self, tools: HashSet<String>) -> Self {
        self.protected_tools = tools;
        self
    }

    /// Attach the factory tools use to spawn child sessions (builder
    /// style).
    pub fn with_child_session_factory(mut self, factory: ChildSessionFactory) -> Self {
        self.child_session_factory = Some(factory);
        self
    }

    /// Set the session's display title and persist it immediately (§4.5
    /// "Session-level metadata ... is written whenever ... the title is
    /// set").
    pub async fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
        self.persist_meta().await;
    }

    /// This session's id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// This session's parent, if it was spawned as a child.
    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Full in-memory message history.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Current display title, if set.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Cumulative token usage across every turn.
    pub fn total_usage(&self) -> UsageTotals {
        self.total_usage
    }

    /// Raise the session's cancellation flag and forward it to the bound
    /// provider (§4.5 "Cancellation").
    pub fn cancel(&self) {
        self.cancellation.cancel();
        self.provider.cancel();
    }

    /// Submit plain text as a new user turn and drive the loop to
    /// completion (§4.5 "Submitting a turn").
    pub async fn prompt(&mut self, text: &str) -> Result<(), SessionError> {
        let message = Message::with_text(Uuid::new_v4().to_string(), Role::User, self.id.clone(), now(), text);
        self.prompt_message(message).await
    }

    /// Submit a fully-constructed message (e.g. one carrying tool results)
    /// as a new turn and drive the loop to completion.
    pub async fn prompt_message(&mut self, message: Message) -> Result<(), SessionError> {
        self.add_message(message).await;
        self.run_loop().await
    }

    /// Spawn a child session sharing this session's provider, tools, store,
    /// working directory, and callbacks, with its own message history and a
    /// cancellation token derived from this one via
    /// [`CancellationToken::child_token`] — cancelling the parent cancels
    /// every descendant (§4.5 "Child sessions", substituting a token tree
    /// for the weak-pointer list sketched there; see DESIGN.md).
    pub fn create_child(&self, agent_config: AgentConfig) -> Session {
        let system_prompt = assemble(&agent_config.system_prompt, &self.working_dir, None);
        let child = Session {
            id: Uuid::new_v4().to_string(),
            parent_id: Some(self.id.clone()),
            agent_config,
            provider: self.provider.clone(),
            tools: self.tools.clone(),
            store: self.store.clone(),
            context_config: self.context_config,
            working_dir: self.working_dir.clone(),
            system_prompt,
            cancellation: self.cancellation.child_token(),
            state: SessionState::Idle,
            messages: Vec::new(),
            recent_calls: RecentCalls::new(),
            permission_cache: PermissionCache::new(),
            callbacks: self.callbacks.clone(),
            protected_tools: self.protected_tools.clone(),
            options: self.options.clone(),
            child_session_factory: self.child_session_factory.clone(),
            total_usage: UsageTotals::default(),
            title: None,
            created_at: now(),
        };
        if let Some(cb) = &child.callbacks.on_event {
            cb(&SessionEvent::SessionCreated { session_id: child.id.clone() });
        }
        child
    }

    /// Rehydrate a previously-persisted session from `store` (§4.5
    /// "Resume"). Returns `Ok(None)` if no metadata exists for `session_id`.
    /// A corrupt `messages.json` is logged and treated as an empty history
    /// rather than failing resume outright. `callbacks` is attached before
    /// the `SessionCreated` event fires, since the event would otherwise
    /// be unobservable — unlike `create_child`, there is no live parent
    /// session to inherit callbacks from.
    #[allow(clippy::too_many_arguments)]
    pub async fn resume(
        store: Arc<FsStore>,
        session_id: &str,
        lookup: &dyn ProviderLookup,
        agent_config: AgentConfig,
        tools: ToolRegistry,
        context_config: ContextConfig,
        working_dir: PathBuf,
        home_dir: Option<PathBuf>,
        callbacks: SessionCallbacks,
    ) -> Result<Option<Session>, SessionError> {
        let all_meta = store.load_sessions().await.map_err(SessionError::Storage)?;
        let Some(meta) = all_meta.into_iter().find(|m| m.id == session_id) else {
            return Ok(None);
        };

        let mut session = Session::new(lookup, agent_config, tools, context_config, working_dir, Some(store.clone()), home_dir)?;
        session.id = meta.id.clone();
        session.parent_id = meta.parent_id;
        session.title = meta.title;
        session.created_at = meta.created_at;
        session.total_usage = meta.total_usage;
        session.agent_config.kind = meta.agent_type;
        session.callbacks = callbacks;

        session.messages = match store.load_messages(&session.id).await {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!(session_id = %session.id, error = %e, "resume: corrupt messages.json replaced with empty history");
                Vec::new()
            }
        };

        tracing::info!(session_id = %session.id, message_count = session.messages.len(), "session resumed");
        if let Some(cb) = &session.callbacks.on_event {
            cb(&SessionEvent::SessionCreated { session_id: session.id.clone() });
        }
        Ok(Some(session))
    }

    /// Newest finished summary onward, or the full history if there is no
    /// summary yet (§4.5 "Context selection").
    fn get_context_messages(&self) -> Vec<Message> {
        match self.messages.iter().rposition(|m| m.is_summary && m.finished) {
            Some(idx) => self.messages[idx..].to_vec(),
            None => self.messages.clone(),
        }
    }

    fn build_request(&self, messages: Vec<Message>) -> CompletionRequest {
        let tools: Vec<ToolDefinition> = self
            .tools
            .for_agent(&self.agent_config)
            .iter()
            .map(|t| ToolDefinition { name: t.id().to_string(), description: t.description().to_string(), input_schema: t.input_schema() })
            .collect();
        CompletionRequest {
            model: self.agent_config.model.clone(),
            messages,
            system: Some(self.system_prompt.clone()),
            tools,
            temperature: self.options.temperature,
            stop_sequences: self.options.stop_sequences.clone(),
            max_tokens: self.agent_config.max_tokens,
        }
    }

    async fn add_message(&mut self, message: Message) {
        if self.title.is_none() && message.role == Role::User {
            self.title = derive_title(&message.text());
        }
        self.total_usage.accumulate(&message.usage);
        if let Some(cb) = &self.callbacks.on_message {
            cb(&message);
        }
        if let Some(store) = &self.store {
            if let Err(e) = store.save_message(&self.id, &message).await {
                tracing::warn!(error = %e, "failed to persist message");
            }
        }
        self.messages.push(message);
        self.persist_meta().await;
    }

    async fn persist_meta(&self) {
        let Some(store) = &self.store else { return };
        let meta = SessionMeta {
            id: self.id.clone(),
            title: self.title.clone(),
            parent_id: self.parent_id.clone(),
            agent_type: self.agent_config.kind,
            created_at: self.created_at,
            updated_at: now(),
            total_usage: self.total_usage,
        };
        if let Err(e) = store.save_session_meta(meta).await {
            tracing::warn!(error = %e, "failed to persist session metadata");
        }
    }

    /// Stream one assistant step and accumulate it into a finished message
    /// (§4.5 "Stream a step").
    async fn stream_step(&self) -> Result<Message, SessionError> {
        let ctx = self.get_context_messages();
        let request = self.build_request(ctx);
        let mut stream = self
            .provider
            .complete_stream(request)
            .await
            .map_err(|e| SessionError::Loop(LoopError::Provider(e)))?;

        let mut acc = StepAccumulator::new();
        while let Some(event) = stream.next().await {
            acc.apply(event, &self.callbacks);
        }

        if let Some(error) = acc.error().map(str::to_string) {
            return Err(SessionError::Loop(LoopError::Provider(ProviderError::StreamError(error))));
        }

        let id = Uuid::new_v4().to_string();
        Ok(acc.into_message(id, self.id.clone(), now()))
    }

    /// Execute every uncompleted tool call on the assistant message with id
    /// `assistant_id`, appending the resulting tool-result message if it
    /// carries at least one result (§4.5 steps 5/7, "Tool execution").
    async fn drain_and_append(&mut self, assistant_id: String) {
        self.state = SessionState::WaitingForTool;
        let result_id = Uuid::new_v4().to_string();
        let stamp = now();

        let result_message = {
            let deps = ToolExecDeps {
                tools: &self.tools,
                agent_config: &self.agent_config,
                context_config: &self.context_config,
                working_dir: &self.working_dir,
                session_id: &self.id,
                cancellation: &self.cancellation,
                child_session_factory: self.child_session_factory.clone(),
                callbacks: &self.callbacks,
            };
            let Some(assistant) = self.messages.iter_mut().find(|m| m.id == assistant_id) else {
                self.state = SessionState::Running;
                return;
            };
            drain_tool_calls(assistant, &deps, &mut self.recent_calls, &mut self.permission_cache, result_id, stamp).await
        };

        self.state = SessionState::Running;
        if !result_message.parts.is_empty() {
            self.add_message(result_message).await;
        }
    }

    /// Run the compaction sub-call over the current context, append its
    /// summary on success, and always follow with a pruning pass — a
    /// failed sub-call falls through to pruning-only rather than failing
    /// the loop (§4.5 "Compaction"; §9 open question, resolved in
    /// DESIGN.md).
    async fn run_compaction(&mut self) {
        self.state = SessionState::Compacting;
        let ctx = self.get_context_messages();
        let summary_id = Uuid::new_v4().to_string();
        match compact(self.provider.as_ref(), &self.agent_config.model, &ctx, &self.id, now(), summary_id).await {
            Ok(summary) => self.add_message(summary).await,
            Err(e) => tracing::warn!(error = %e, "compaction sub-call failed; falling back to pruning only"),
        }
        self.run_pruning().await;
        self.state = SessionState::Running;
    }

    /// Clear old tool-result output beyond the protected window, persisting
    /// every message it actually mutated (§4.5 "Pruning").
    async fn run_pruning(&mut self) {
        let stamp = now();
        let report = prune(&mut self.messages, self.context_config.prune_protect_tokens, &self.protected_tools, stamp);
        if report.reclaimed() >= self.context_config.prune_minimum_tokens {
            tracing::info!(before = report.before_tokens, after = report.after_tokens, reclaimed = report.reclaimed(), "context pruned");
            if let Some(cb) = &self.callbacks.on_event {
                cb(&SessionEvent::ContextCompacted { before_tokens: report.before_tokens, after_tokens: report.after_tokens });
            }
        }
        let Some(store) = &self.store else { return };
        let mutated: Vec<Message> = self
            .messages
            .iter()
            .filter(|m| m.parts.iter().any(|p| matches!(p, MessagePart::ToolResult { compacted_at: Some(t), .. } if *t == stamp)))
            .cloned()
            .collect();
        for message in mutated {
            if let Err(e) = store.update_message(&self.id, &message).await {
                tracing::warn!(error = %e, "failed to persist pruned message");
            }
        }
    }

    /// Drive the 7-step loop until termination, cancellation, or a fatal
    /// error (§4.5 "The main loop"). Always finalizes state, prunes,
    /// persists, and fires `on_complete`/`on_error` before returning,
    /// regardless of which exit path was taken.
    async fn run_loop(&mut self) -> Result<(), SessionError> {
        if self.cancellation.is_cancelled() {
            self.cancellation = CancellationToken::new();
        }
        self.state = SessionState::Running;

        let mut failure: Option<SessionError> = None;

        for _ in 0..MAX_LOOP_ITERATIONS {
            if self.cancellation.is_cancelled() {
                self.state = SessionState::Cancelled;
                break;
            }

            let ctx = self.get_context_messages();
            let last_assistant = ctx.iter().rev().find(|m| m.role == Role::Assistant).cloned();
            let needs_response = ctx.last().map(|m| m.role == Role::User).unwrap_or(true);

            // 3. Termination.
            if !needs_response {
                if let Some(last) = &last_assistant {
                    if last.finished && last.finish_reason != FinishReason::ToolCalls {
                        self.state = SessionState::Completed;
                        break;
                    }
                }
            }

            // 4. Compaction.
            let window = context_window(self.provider.as_ref(), &self.agent_config.model);
            if should_compact(&ctx, window) {
                self.run_compaction().await;
                continue;
            }

            // 5. Drain tool calls left over from a prior (possibly
            // interrupted) step.
            if !needs_response {
                if let Some(last) = &last_assistant {
                    if last.finish_reason == FinishReason::ToolCalls {
                        self.drain_and_append(last.id.clone()).await;
                        continue;
                    }
                }
            }

            // 6. Stream a step.
            match self.stream_step().await {
                Ok(assistant_message) => {
                    let finish_reason = assistant_message.finish_reason;
                    let assistant_id = assistant_message.id.clone();
                    self.add_message(assistant_message).await;

                    // 7. Inline shortcut: drain immediately rather than
                    // waiting for the next iteration's step 5 to notice.
                    if finish_reason == FinishReason::ToolCalls {
                        self.drain_and_append(assistant_id).await;
                    }
                }
                Err(e) => {
                    self.state = SessionState::Failed;
                    failure = Some(e);
                    break;
                }
            }
        }

        if self.state == SessionState::Running {
            self.state = SessionState::Failed;
            failure.get_or_insert(SessionError::Loop(LoopError::MaxIterations(MAX_LOOP_ITERATIONS)));
        }

        self.run_pruning().await;
        self.persist_meta().await;

        let reason = match self.state {
            SessionState::Cancelled => FinishReason::Cancelled,
            SessionState::Failed => FinishReason::Error,
            _ => FinishReason::Stop,
        };
        if let Some(cb) = &self.callbacks.on_complete {
            cb(reason);
        }
        if self.state == SessionState::Failed {
            if let (Some(cb), Some(e)) = (&self.callbacks.on_error, &failure) {
                cb(&e.to_string());
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl SessionHandle for Session {
    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentcore_tool::{ToolContext, ToolDyn, ToolResult};
    use agentcore_types::{AgentKind, ModelInfo, Permission, StreamEvent};
    use std::collections::{HashMap, VecDeque};
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    struct ScriptedProvider {
        models: Vec<ModelInfo>,
        scripts: Mutex<VecDeque<Vec<StreamEvent>>>,
    }

    #[async_trait::async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }
        fn models(&self) -> &[ModelInfo] {
            &self.models
        }
        async fn complete(&self, _request: CompletionRequest) -> Result<agentcore_types::CompletionResponse, ProviderError> {
            unimplemented!()
        }
        async fn complete_stream(&self, _request: CompletionRequest) -> Result<agentcore_types::EventStream, ProviderError> {
            let events = self.scripts.lock().unwrap().pop_front().unwrap_or_default();
            Ok(futures::stream::iter(events).boxed())
        }
        fn cancel(&self) {}
    }

    struct FakeLookup(Arc<ScriptedProvider>);
    impl ProviderLookup for FakeLookup {
        fn get(&self, _name: &str) -> Option<Arc<dyn Provider>> {
            Some(self.0.clone())
        }
    }

    fn model() -> ModelInfo {
        ModelInfo { id: "claude-sonnet-4-20250514".into(), provider: "anthropic".into(), context_window: 10_000, max_output_tokens: 4096, supports_vision: true, supports_tools: true }
    }

    fn agent_config() -> AgentConfig {
        AgentConfig {
            id: "main".into(),
            kind: AgentKind::General,
            model: "claude-sonnet-4-20250514".into(),
            system_prompt: "You are helpful.".into(),
            permissions: HashMap::new(),
            default_permission: Permission::Allow,
            max_tokens: None,
            allowed_tools: vec![],
            denied_tools: vec![],
        }
    }

    struct EchoTool;
    impl ToolDyn for EchoTool {
        fn id(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "echoes"
        }
        fn parameters(&self) -> &[agentcore_tool::ToolParam] {
            &[]
        }
        fn call(&self, _args: serde_json::Value, _ctx: ToolContext) -> Pin<Box<dyn Future<Output = Result<ToolResult, agentcore_types::ToolError>> + Send + '_>> {
            Box::pin(async move { Ok(ToolResult::ok("echoed")) })
        }
    }

    #[tokio::test]
    async fn simple_text_turn_produces_one_assistant_message_and_completes() {
        let events = vec![
            StreamEvent::TextDelta { text: "Hello".into() },
            StreamEvent::TextDelta { text: ", world!".into() },
            StreamEvent::FinishStep { reason: FinishReason::Stop, usage: UsageTotals::default() },
        ];
        let provider = Arc::new(ScriptedProvider { models: vec![model()], scripts: Mutex::new(VecDeque::from(vec![events])) });
        let lookup = FakeLookup(provider);

        let mut session = Session::new(&lookup, agent_config(), ToolRegistry::new(), ContextConfig::default(), std::env::temp_dir(), None, None).unwrap();
        session.prompt("hi").await.unwrap();

        assert_eq!(session.state(), SessionState::Completed);
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.messages()[1].text(), "Hello, world!");
        assert_eq!(session.messages()[1].finish_reason, FinishReason::Stop);
    }

    #[tokio::test]
    async fn tool_call_turn_drains_inline_then_streams_a_final_answer() {
        let first = vec![
            StreamEvent::ToolCallComplete { id: "t1".into(), name: "echo".into(), arguments: serde_json::json!({}) },
            StreamEvent::FinishStep { reason: FinishReason::ToolCalls, usage: UsageTotals::default() },
        ];
        let second = vec![
            StreamEvent::TextDelta { text: "done".into() },
            StreamEvent::FinishStep { reason: FinishReason::Stop, usage: UsageTotals::default() },
        ];
        let provider = Arc::new(ScriptedProvider { models: vec![model()], scripts: Mutex::new(VecDeque::from(vec![first, second])) });
        let lookup = FakeLookup(provider);

        let tools = ToolRegistry::new();
        tools.register(Arc::new(EchoTool));

        let mut session = Session::new(&lookup, agent_config(), tools, ContextConfig::default(), std::env::temp_dir(), None, None).unwrap();
        session.prompt("run the tool").await.unwrap();

        assert_eq!(session.state(), SessionState::Completed);
        let roles: Vec<Role> = session.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User, Role::Assistant]);
        assert_eq!(session.messages()[2].tool_results().count(), 1);
        assert_eq!(session.messages()[3].text(), "done");
    }

    #[tokio::test]
    async fn cancelling_before_prompting_ends_the_loop_cancelled() {
        let provider = Arc::new(ScriptedProvider { models: vec![model()], scripts: Mutex::new(VecDeque::new()) });
        let lookup = FakeLookup(provider);
        let mut session = Session::new(&lookup, agent_config(), ToolRegistry::new(), ContextConfig::default(), std::env::temp_dir(), None, None).unwrap();
        session.cancel();
        session.prompt("hi").await.unwrap();
        assert_eq!(session.state(), SessionState::Cancelled);
    }

    #[tokio::test]
    async fn resume_returns_none_for_an_unknown_session_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FsStore::new(dir.path()));
        let provider = Arc::new(ScriptedProvider { models: vec![model()], scripts: Mutex::new(VecDeque::new()) });
        let lookup = FakeLookup(provider);
        let result = Session::resume(store, "missing", &lookup, agent_config(), ToolRegistry::new(), ContextConfig::default(), std::env::temp_dir(), None, SessionCallbacks::default()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn resume_restores_stored_messages_and_agent_type() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FsStore::new(dir.path()));
        store
            .save_session_meta(SessionMeta { id: "s1".into(), title: Some("t".into()), parent_id: None, agent_type: AgentKind::ReadOnly, created_at: 5, updated_at: 5, total_usage: UsageTotals::default() })
            .await
            .unwrap();
        store.save_message("s1", &Message::with_text("m1", Role::User, "s1", 5, "hi")).await.unwrap();

        let provider = Arc::new(ScriptedProvider { models: vec![model()], scripts: Mutex::new(VecDeque::new()) });
        let lookup = FakeLookup(provider);
        let session = Session::resume(store, "s1", &lookup, agent_config(), ToolRegistry::new(), ContextConfig::default(), std::env::temp_dir(), None, SessionCallbacks::default()).await.unwrap().unwrap();

        assert_eq!(session.id(), "s1");
        assert_eq!(session.title(), Some("t"));
        assert_eq!(session.messages().len(), 1);
    }

    #[test]
    fn create_child_derives_a_child_cancellation_token() {
        let provider = Arc::new(ScriptedProvider { models: vec![model()], scripts: Mutex::new(VecDeque::new()) });
        let lookup = FakeLookup(provider);
        let parent = Session::new(&lookup, agent_config(), ToolRegistry::new(), ContextConfig::default(), std::env::temp_dir(), None, None).unwrap();
        let child = parent.create_child(agent_config());
        assert_eq!(child.parent_id(), Some(parent.id()));
        assert!(!child.cancellation.is_cancelled());
        parent.cancel();
        assert!(child.cancellation.is_cancelled());
    }

    #[test]
    fn derive_title_truncates_to_fifty_chars() {
        let long = "x".repeat(80);
        let title = derive_title(&long).unwrap();
        assert_eq!(title.chars().count(), TITLE_MAX_CHARS);
    }

    #[test]
    fn derive_title_returns_none_for_blank_text() {
        assert_eq!(derive_title("   "), None);
    }

    #[tokio::test]
    async fn first_user_prompt_derives_the_title_when_unset() {
        let events = vec![StreamEvent::FinishStep { reason: FinishReason::Stop, usage: UsageTotals::default() }];
        let provider = Arc::new(ScriptedProvider { models: vec![model()], scripts: Mutex::new(VecDeque::from(vec![events])) });
        let lookup = FakeLookup(provider);
        let mut session = Session::new(&lookup, agent_config(), ToolRegistry::new(), ContextConfig::default(), std::env::temp_dir(), None, None).unwrap();
        session.prompt("plan the migration").await.unwrap();
        assert_eq!(session.title(), Some("plan the migration"));
    }

    #[tokio::test]
    async fn explicit_set_title_is_not_overwritten_by_later_prompts() {
        let events = vec![StreamEvent::FinishStep { reason: FinishReason::Stop, usage: UsageTotals::default() }];
        let provider = Arc::new(ScriptedProvider { models: vec![model()], scripts: Mutex::new(VecDeque::from(vec![events])) });
        let lookup = FakeLookup(provider);
        let mut session = Session::new(&lookup, agent_config(), ToolRegistry::new(), ContextConfig::default(), std::env::temp_dir(), None, None).unwrap();
        session.set_title("custom title").await;
        session.prompt("hi").await.unwrap();
        assert_eq!(session.title(), Some("custom title"));
    }

    #[test]
    fn create_child_fires_session_created_event() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let provider = Arc::new(ScriptedProvider { models: vec![model()], scripts: Mutex::new(VecDeque::new()) });
        let lookup = FakeLookup(provider);
        let fired = Arc::new(AtomicBool::new(false));
        let fired2 = fired.clone();
        let callbacks = SessionCallbacks { on_event: Some(Arc::new(move |_event| fired2.store(true, Ordering::SeqCst))), ..Default::default() };
        let parent = Session::new(&lookup, agent_config(), ToolRegistry::new(), ContextConfig::default(), std::env::temp_dir(), None, None)
            .unwrap()
            .with_callbacks(callbacks);
        let _child = parent.create_child(agent_config());
        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn resume_fires_session_created_event() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FsStore::new(dir.path()));
        store
            .save_session_meta(SessionMeta { id: "s1".into(), title: None, parent_id: None, agent_type: AgentKind::General, created_at: 5, updated_at: 5, total_usage: UsageTotals::default() })
            .await
            .unwrap();

        let provider = Arc::new(ScriptedProvider { models: vec![model()], scripts: Mutex::new(VecDeque::new()) });
        let lookup = FakeLookup(provider);
        let fired = Arc::new(AtomicBool::new(false));
        let fired2 = fired.clone();
        let callbacks = SessionCallbacks { on_event: Some(Arc::new(move |event| {
            assert!(matches!(event, SessionEvent::SessionCreated { session_id } if session_id == "s1"));
            fired2.store(true, Ordering::SeqCst);
        })), ..Default::default() };

        let resumed = Session::resume(store, "s1", &lookup, agent_config(), ToolRegistry::new(), ContextConfig::default(), std::env::temp_dir(), None, callbacks).await.unwrap().unwrap();
        assert_eq!(resumed.id(), "s1");
        assert!(fired.load(Ordering::SeqCst));
    }
}
