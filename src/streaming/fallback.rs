//! Streaming with a one-shot fallback to the synchronous endpoint.
//!
//! For each message:
//! 1. Open a fresh [`StreamController`] against `POST /chat/stream`
//! 2. On any failure, classify it as a [`FallbackReason`] and log it
//! 3. Re-issue the same request against `POST /chat` and return that result
//!
//! The synchronous attempt is never retried; its error goes to the caller as is.
//! Tokens already delivered before a fallback are not retracted.

use std::fmt;
use std::sync::Arc;

use super::controller::StreamController;
use crate::error::{ChatError, Result};
use crate::transport::ChatTransport;
use crate::types::{ChatRequest, ChatResult, WorkflowStep};

/// Why a streaming attempt was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    Unauthorized,
    Status(u16),
    Network,
    Incomplete,
    MalformedDone,
    Other,
}

impl FallbackReason {
    pub fn classify(err: &ChatError) -> Self {
        match err {
            ChatError::Unauthorized(_) => Self::Unauthorized,
            ChatError::Status { status, .. } => Self::Status(*status),
            ChatError::Network(_) => Self::Network,
            ChatError::Incomplete => Self::Incomplete,
            ChatError::MalformedDone(_) => Self::MalformedDone,
            ChatError::Json(_) | ChatError::ControllerReused(_) => Self::Other,
        }
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::Status(code) => write!(f, "status {}", code),
            Self::Network => write!(f, "network"),
            Self::Incomplete => write!(f, "incomplete stream"),
            Self::MalformedDone => write!(f, "malformed done"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Which path produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Streamed,
    Fallback(FallbackReason),
    /// Streaming was disabled; the synchronous endpoint was used directly.
    Direct,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SendOutcome {
    pub result: ChatResult,
    pub via: Delivery,
}

pub struct FallbackController<T: ChatTransport + ?Sized> {
    transport: Arc<T>,
    streaming_enabled: bool,
}

impl<T: ChatTransport + ?Sized> Clone for FallbackController<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            streaming_enabled: self.streaming_enabled,
        }
    }
}

impl<T: ChatTransport + ?Sized> FallbackController<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            streaming_enabled: true,
        }
    }

    /// Skip the streaming attempt and always use the synchronous endpoint.
    pub fn with_streaming(mut self, enabled: bool) -> Self {
        self.streaming_enabled = enabled;
        self
    }

    pub fn streaming_enabled(&self) -> bool {
        self.streaming_enabled
    }

    /// Send `text` in `session_id` (a new session when `None`).
    pub async fn send<OnToken, OnStep>(
        &self,
        text: &str,
        session_id: Option<&str>,
        on_token: OnToken,
        on_workflow_step: OnStep,
    ) -> Result<ChatResult>
    where
        OnToken: FnMut(&str),
        OnStep: FnMut(&WorkflowStep),
    {
        let request = ChatRequest::new(text, session_id.map(str::to_string));
        self.send_request(&request, on_token, on_workflow_step).await
    }

    pub async fn send_request<OnToken, OnStep>(
        &self,
        request: &ChatRequest,
        on_token: OnToken,
        on_workflow_step: OnStep,
    ) -> Result<ChatResult>
    where
        OnToken: FnMut(&str),
        OnStep: FnMut(&WorkflowStep),
    {
        self.send_detailed(request, on_token, on_workflow_step)
            .await
            .map(|outcome| outcome.result)
    }

    /// Like [`send_request`](Self::send_request), also reporting which path
    /// produced the result.
    pub async fn send_detailed<OnToken, OnStep>(
        &self,
        request: &ChatRequest,
        on_token: OnToken,
        on_workflow_step: OnStep,
    ) -> Result<SendOutcome>
    where
        OnToken: FnMut(&str),
        OnStep: FnMut(&WorkflowStep),
    {
        if !self.streaming_enabled {
            let result = self.send_sync(request).await?;
            return Ok(SendOutcome {
                result,
                via: Delivery::Direct,
            });
        }

        let mut controller = StreamController::new(self.transport.clone());
        match controller.open(request, on_token, on_workflow_step).await {
            Ok(result) => Ok(SendOutcome {
                result,
                via: Delivery::Streamed,
            }),
            Err(err) => {
                let reason = FallbackReason::classify(&err);
                tracing::warn!(%reason, error = %err, "streaming failed, falling back to /chat");
                let result = self.send_sync(request).await?;
                Ok(SendOutcome {
                    result,
                    via: Delivery::Fallback(reason),
                })
            }
        }
    }

    /// Call the synchronous endpoint directly.
    pub async fn send_sync(&self, request: &ChatRequest) -> Result<ChatResult> {
        self.transport.send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_covers_every_trigger() {
        assert_eq!(
            FallbackReason::classify(&ChatError::Unauthorized(String::new())),
            FallbackReason::Unauthorized
        );
        assert_eq!(
            FallbackReason::classify(&ChatError::Status {
                status: 503,
                body: String::new()
            }),
            FallbackReason::Status(503)
        );
        assert_eq!(
            FallbackReason::classify(&ChatError::Network("reset".into())),
            FallbackReason::Network
        );
        assert_eq!(
            FallbackReason::classify(&ChatError::Incomplete),
            FallbackReason::Incomplete
        );
        let bad = serde_json::from_str::<ChatResult>("{").unwrap_err();
        assert_eq!(
            FallbackReason::classify(&ChatError::MalformedDone(bad)),
            FallbackReason::MalformedDone
        );
    }

    #[test]
    fn reason_display() {
        assert_eq!(FallbackReason::Status(502).to_string(), "status 502");
        assert_eq!(FallbackReason::Incomplete.to_string(), "incomplete stream");
    }
}
