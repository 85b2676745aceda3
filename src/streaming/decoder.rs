//! Typed decoding of assembled frames.

use super::assembler::Frame;
use crate::error::{ChatError, Result};
use crate::types::{ChatResult, TokenPayload, WorkflowStep};

/// One application event carried by the stream.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedEvent {
    /// Incremental fragment of the assistant reply.
    Token(String),
    /// Progress of a multi-step workflow.
    WorkflowStep(WorkflowStep),
    /// Terminal, authoritative result.
    Done(ChatResult),
}

impl DecodedEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DecodedEvent::Done(_))
    }
}

/// Decode a frame.
///
/// Malformed `token` and `workflow_step` frames and unknown event types yield
/// `Ok(None)`. Only a `done` frame that fails to parse is an error.
pub fn decode(frame: &Frame) -> Result<Option<DecodedEvent>> {
    match frame.event.as_str() {
        "token" => match serde_json::from_str::<TokenPayload>(&frame.data) {
            Ok(payload) => Ok(Some(DecodedEvent::Token(payload.t))),
            Err(e) => {
                tracing::debug!(error = %e, "dropping malformed token frame");
                Ok(None)
            }
        },
        "workflow_step" => match serde_json::from_str::<WorkflowStep>(&frame.data) {
            Ok(step) => Ok(Some(DecodedEvent::WorkflowStep(step))),
            Err(e) => {
                tracing::debug!(error = %e, "dropping malformed workflow_step frame");
                Ok(None)
            }
        },
        "done" => serde_json::from_str::<ChatResult>(&frame.data)
            .map(|result| Some(DecodedEvent::Done(result)))
            .map_err(ChatError::MalformedDone),
        other => {
            tracing::trace!(event = other, "ignoring unknown event type");
            Ok(None)
        }
    }
}
