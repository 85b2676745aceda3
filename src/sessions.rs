//! Conversation state for one chat window.
//!
//! Owns the active session id and the transcript. The transcript is written
//! only after an exchange resolves or fails; token and workflow callbacks touch
//! the transient typing buffer and progress map only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{ChatError, Result};
use crate::streaming::FallbackController;
use crate::transport::ChatTransport;
use crate::types::{ChatRequest, ChatResult, WorkflowStep};

/// Shown when both the stream and the fallback failed.
pub const FAILURE_MESSAGE: &str = "Sorry, I couldn't reach the assistant. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    /// Synthesized locally after a total failure.
    Error,
}

/// A message in the transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl TranscriptEntry {
    fn local(role: Role, content: &str) -> Self {
        Self {
            role,
            content: content.to_string(),
            timestamp: Utc::now(),
            message_id: None,
            action: None,
            blocks: None,
            suggestions: Vec::new(),
        }
    }

    fn from_result(result: ChatResult) -> Self {
        Self {
            role: Role::Assistant,
            content: result.reply,
            timestamp: Utc::now(),
            message_id: result.message_id,
            action: result.action,
            blocks: result.blocks,
            suggestions: result.suggestions.unwrap_or_default(),
        }
    }
}

pub struct ChatSession<T: ChatTransport + ?Sized> {
    client: FallbackController<T>,
    active_session_id: Option<String>,
    encouragement_mode: bool,
    transcript: Vec<TranscriptEntry>,
    typing: String,
    workflows: HashMap<String, WorkflowStep>,
    last_result: Option<ChatResult>,
}

impl<T: ChatTransport + ?Sized> ChatSession<T> {
    pub fn new(client: FallbackController<T>) -> Self {
        Self {
            client,
            active_session_id: None,
            encouragement_mode: false,
            transcript: Vec::new(),
            typing: String::new(),
            workflows: HashMap::new(),
            last_result: None,
        }
    }

    pub fn from_transport(transport: Arc<T>) -> Self {
        Self::new(FallbackController::new(transport))
    }

    pub fn with_encouragement(mut self, enabled: bool) -> Self {
        self.encouragement_mode = enabled;
        self
    }

    /// Continue an existing server-side conversation.
    pub fn resume(&mut self, session_id: impl Into<String>) {
        self.active_session_id = Some(session_id.into());
    }

    /// Forget the current conversation; the next send creates a new session.
    pub fn new_conversation(&mut self) {
        self.active_session_id = None;
        self.transcript.clear();
        self.typing.clear();
        self.workflows.clear();
        self.last_result = None;
    }

    pub fn active_session_id(&self) -> Option<&str> {
        self.active_session_id.as_deref()
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    /// Tokens received so far for the in-flight reply.
    pub fn typing(&self) -> &str {
        &self.typing
    }

    /// Latest step seen per workflow id in the most recent exchange.
    pub fn workflow_progress(&self) -> &HashMap<String, WorkflowStep> {
        &self.workflows
    }

    pub fn last_result(&self) -> Option<&ChatResult> {
        self.last_result.as_ref()
    }

    pub fn last_suggestions(&self) -> &[String] {
        self.last_result
            .as_ref()
            .and_then(|r| r.suggestions.as_deref())
            .unwrap_or_default()
    }

    pub async fn send_user_message(&mut self, text: &str) -> Result<&TranscriptEntry> {
        self.send_user_message_with(text, |_| {}, |_| {}).await
    }

    /// Send `text`, forwarding tokens and workflow steps to the callbacks as
    /// they arrive. Returns the assistant entry appended to the transcript.
    pub async fn send_user_message_with<OnToken, OnStep>(
        &mut self,
        text: &str,
        mut on_token: OnToken,
        mut on_workflow_step: OnStep,
    ) -> Result<&TranscriptEntry>
    where
        OnToken: FnMut(&str),
        OnStep: FnMut(&WorkflowStep),
    {
        self.transcript.push(TranscriptEntry::local(Role::User, text));
        self.typing.clear();
        self.workflows.clear();

        let request = ChatRequest::new(text, self.active_session_id.clone())
            .with_encouragement(self.encouragement_mode);

        let Self {
            client,
            typing,
            workflows,
            ..
        } = &mut *self;
        let outcome = client
            .send_request(
                &request,
                |token| {
                    typing.push_str(token);
                    on_token(token);
                },
                |step| {
                    workflows.insert(step.workflow_id.clone(), step.clone());
                    on_workflow_step(step);
                },
            )
            .await;

        self.typing.clear();
        match outcome {
            Ok(result) => Ok(self.reconcile(result)),
            Err(err) => Err(self.record_failure(err)),
        }
    }

    fn reconcile(&mut self, result: ChatResult) -> &TranscriptEntry {
        if self.active_session_id.is_none() {
            if let Some(ref id) = result.session_id {
                tracing::info!(session_id = %id, "adopted new session");
                self.active_session_id = Some(id.clone());
            }
        }
        self.last_result = Some(result.clone());
        self.transcript.push(TranscriptEntry::from_result(result));
        &self.transcript[self.transcript.len() - 1]
    }

    fn record_failure(&mut self, err: ChatError) -> ChatError {
        tracing::error!(error = %err, "chat exchange failed");
        self.transcript
            .push(TranscriptEntry::local(Role::Error, FAILURE_MESSAGE));
        err
    }
}
