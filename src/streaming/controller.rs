use futures_util::StreamExt;
use std::sync::Arc;

use super::assembler::FrameAssembler;
use super::decoder::{DecodedEvent, decode};
use crate::error::{ChatError, Result};
use crate::transport::ChatTransport;
use crate::types::{ChatRequest, ChatResult, WorkflowStep};

/// Lifecycle of a [`StreamController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Opening,
    Streaming,
    Completed,
    Failed,
}

impl StreamState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Opening => "opening",
            Self::Streaming => "streaming",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Drives one streaming exchange from open to `done`.
///
/// A controller handles exactly one message; build a new one per request.
pub struct StreamController<T: ChatTransport + ?Sized> {
    transport: Arc<T>,
    state: StreamState,
}

impl<T: ChatTransport + ?Sized> StreamController<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            state: StreamState::Idle,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Open the stream and pull until a `done` frame arrives.
    ///
    /// Tokens and workflow steps are handed to the callbacks as they are
    /// decoded. The stream only succeeds if a well-formed `done` frame is seen
    /// before the body ends; nothing after it is read.
    pub async fn open<OnToken, OnStep>(
        &mut self,
        request: &ChatRequest,
        mut on_token: OnToken,
        mut on_workflow_step: OnStep,
    ) -> Result<ChatResult>
    where
        OnToken: FnMut(&str),
        OnStep: FnMut(&WorkflowStep),
    {
        if self.state != StreamState::Idle {
            return Err(ChatError::ControllerReused(self.state.as_str()));
        }

        self.state = StreamState::Opening;
        let result = self
            .pull(request, &mut on_token, &mut on_workflow_step)
            .await;
        self.state = match result {
            Ok(_) => StreamState::Completed,
            Err(_) => StreamState::Failed,
        };
        result
    }

    async fn pull<OnToken, OnStep>(
        &mut self,
        request: &ChatRequest,
        on_token: &mut OnToken,
        on_workflow_step: &mut OnStep,
    ) -> Result<ChatResult>
    where
        OnToken: FnMut(&str),
        OnStep: FnMut(&WorkflowStep),
    {
        let mut stream = self.transport.open_stream(request).await?;
        self.state = StreamState::Streaming;

        let mut assembler = FrameAssembler::new();
        let mut tokens = 0usize;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            for frame in assembler.feed(&chunk)? {
                match decode(&frame)? {
                    Some(DecodedEvent::Token(text)) => {
                        tokens += 1;
                        on_token(&text);
                    }
                    Some(DecodedEvent::WorkflowStep(step)) => on_workflow_step(&step),
                    Some(DecodedEvent::Done(result)) => {
                        tracing::info!(
                            tokens,
                            session_id = result.session_id.as_deref().unwrap_or("-"),
                            "stream completed"
                        );
                        return Ok(result);
                    }
                    None => {}
                }
            }
        }

        tracing::debug!(
            tokens,
            pending = assembler.pending_len(),
            "stream ended before done"
        );
        Err(ChatError::Incomplete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ByteStream;
    use async_trait::async_trait;
    use bytes::Bytes;
    use futures_util::stream;

    struct Chunks(Vec<&'static str>);

    #[async_trait]
    impl ChatTransport for Chunks {
        async fn open_stream(&self, _request: &ChatRequest) -> Result<ByteStream> {
            let chunks: Vec<Result<Bytes>> = self
                .0
                .iter()
                .copied()
                .map(|c| Ok(Bytes::from_static(c.as_bytes())))
                .collect();
            Ok(stream::iter(chunks).boxed())
        }

        async fn send(&self, _request: &ChatRequest) -> Result<ChatResult> {
            unreachable!("controller never calls the sync endpoint")
        }
    }

    #[tokio::test]
    async fn token_split_across_chunks() {
        let transport = Arc::new(Chunks(vec![
            "event: token\ndata: {\"t\": \"Hel",
            "lo\"}\n\nevent: done\ndata: {\"reply\": \"Hello\", \"session_id\": \"s1\"}\n\n",
        ]));
        let mut controller = StreamController::new(transport);
        let mut tokens = Vec::new();

        let result = controller
            .open(
                &ChatRequest::new("hi", None),
                |t| tokens.push(t.to_string()),
                |_| {},
            )
            .await
            .unwrap();

        assert_eq!(tokens, vec!["Hello"]);
        assert_eq!(result.reply, "Hello");
        assert_eq!(result.session_id.as_deref(), Some("s1"));
        assert_eq!(controller.state(), StreamState::Completed);
    }

    #[tokio::test]
    async fn nothing_after_done_is_dispatched() {
        let transport = Arc::new(Chunks(vec![
            "event: done\ndata: {\"reply\": \"ok\"}\n\nevent: token\ndata: {\"t\": \"late\"}\n\n",
            "event: token\ndata: {\"t\": \"later\"}\n\n",
        ]));
        let mut controller = StreamController::new(transport);
        let mut tokens = 0;

        let result = controller
            .open(&ChatRequest::new("hi", None), |_| tokens += 1, |_| {})
            .await
            .unwrap();

        assert_eq!(result.reply, "ok");
        assert_eq!(tokens, 0);
    }

    #[tokio::test]
    async fn end_without_done_fails() {
        let transport = Arc::new(Chunks(vec!["event: token\ndata: {\"t\": \"a\"}\n\n"]));
        let mut controller = StreamController::new(transport);

        let err = controller
            .open(&ChatRequest::new("hi", None), |_| {}, |_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::Incomplete));
        assert_eq!(controller.state(), StreamState::Failed);
    }

    #[tokio::test]
    async fn controller_cannot_be_reopened() {
        let transport = Arc::new(Chunks(vec!["event: done\ndata: {\"reply\": \"ok\"}\n\n"]));
        let mut controller = StreamController::new(transport);
        let request = ChatRequest::new("hi", None);

        controller.open(&request, |_| {}, |_| {}).await.unwrap();
        let err = controller.open(&request, |_| {}, |_| {}).await.unwrap_err();

        assert!(matches!(err, ChatError::ControllerReused("completed")));
        assert_eq!(controller.state(), StreamState::Completed);
    }
}
