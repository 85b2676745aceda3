//! Streaming chat transport.
//!
//! Turns the chunked body of `POST /chat/stream` into typed events and a
//! final [`ChatResult`](crate::types::ChatResult). The body is line-oriented
//! SSE:
//!
//! ```text
//! event: token
//! data: {"t": "Hel"}
//!
//! event: workflow_step
//! data: {"workflow_id": "wf", "step_index": 0, "total_steps": 3, "label": "Parsing", "status": "running"}
//!
//! event: done
//! data: {"reply": "Hello", "session_id": "s1"}
//!
//! ```
//!
//! Lines starting with `:` are keep-alives. `\r\n` and `\n` are both accepted.
//! A stream is successful only if a well-formed `done` frame arrives before
//! the body ends.

mod assembler;
mod controller;
mod decoder;
mod fallback;

pub use assembler::{Frame, FrameAssembler, MAX_LINE_BYTES};
pub use controller::{StreamController, StreamState};
pub use decoder::{DecodedEvent, decode};
pub use fallback::{Delivery, FallbackController, FallbackReason, SendOutcome};

/// Decode the events of a complete body, up to and including the first
/// `done`. Anything after it is ignored, as the controller does.
pub fn decode_all(body: &[u8]) -> crate::error::Result<Vec<DecodedEvent>> {
    let mut assembler = FrameAssembler::new();
    let mut events = Vec::new();
    for frame in assembler.feed(body)? {
        if let Some(event) = decode(&frame)? {
            let terminal = event.is_terminal();
            events.push(event);
            if terminal {
                break;
            }
        }
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_all_stops_at_done() {
        let body = b"event: token\ndata: {\"t\":\"a\"}\n\nevent: done\ndata: {\"reply\":\"a\"}\n\nevent: token\ndata: {\"t\":\"late\"}\n\nevent: done\ndata: not json\n\n";
        let events = decode_all(body).unwrap();
        assert_eq!(events.len(), 2);
        assert!(events[1].is_terminal());
    }

    #[test]
    fn decode_all_without_done_returns_everything() {
        let body = b"event: token\ndata: {\"t\":\"a\"}\n\nevent: token\ndata: {\"t\":\"b\"}\n\n";
        assert_eq!(
            decode_all(body).unwrap(),
            vec![
                DecodedEvent::Token("a".into()),
                DecodedEvent::Token("b".into())
            ]
        );
    }
}
