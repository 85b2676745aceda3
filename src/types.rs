//! Wire types shared by the streaming and synchronous chat endpoints.

use serde::{Deserialize, Serialize};

/// Body of `POST /chat` and `POST /chat/stream`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encouragement_mode: Option<bool>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, session_id: Option<String>) -> Self {
        Self {
            message: message.into(),
            session_id,
            encouragement_mode: None,
        }
    }

    pub fn with_encouragement(mut self, enabled: bool) -> Self {
        // Only sent when turned on; the server default is off.
        self.encouragement_mode = enabled.then_some(true);
        self
    }
}

/// Final structured outcome of one exchange.
///
/// Parsed from the `done` frame of a stream and from the `POST /chat`
/// response alike.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatResult {
    pub reply: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_status: Option<String>,
}

/// Status of one workflow step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
    #[serde(other)]
    Unknown,
}

/// Progress notification for a long-running multi-step operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub workflow_id: String,
    pub step_index: u32,
    pub total_steps: u32,
    pub label: String,
    pub status: StepStatus,
}

impl WorkflowStep {
    /// Whether this is the last step and it has stopped running.
    pub fn is_final(&self) -> bool {
        self.step_index >= self.total_steps.saturating_sub(1)
            && matches!(
                self.status,
                StepStatus::Completed | StepStatus::Failed | StepStatus::Skipped
            )
    }

    /// Fraction of steps finished, in `0.0..=1.0`.
    pub fn progress(&self) -> f32 {
        if self.total_steps == 0 {
            return 0.0;
        }
        let done = match self.status {
            StepStatus::Completed | StepStatus::Skipped => self.step_index.saturating_add(1),
            _ => self.step_index,
        };
        (done as f32 / self.total_steps as f32).min(1.0)
    }
}

/// Payload of a `token` frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenPayload {
    pub t: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_omits_absent_fields() {
        let body = serde_json::to_value(ChatRequest::new("hi", None)).unwrap();
        assert_eq!(body, json!({ "message": "hi" }));

        let body = serde_json::to_value(
            ChatRequest::new("hi", Some("s1".into())).with_encouragement(true),
        )
        .unwrap();
        assert_eq!(
            body,
            json!({ "message": "hi", "session_id": "s1", "encouragement_mode": true })
        );
    }

    #[test]
    fn result_requires_reply() {
        let err = serde_json::from_value::<ChatResult>(json!({ "session_id": "s1" }));
        assert!(err.is_err());

        let result: ChatResult = serde_json::from_value(json!({
            "reply": "Found 3 candidates",
            "action": { "type": "navigate", "to": "/candidates" },
            "suggestions": ["Show more", "Email them"],
            "session_id": "s1",
            "unknown_field": 1
        }))
        .unwrap();
        assert_eq!(result.reply, "Found 3 candidates");
        assert_eq!(result.suggestions.as_ref().map(Vec::len), Some(2));
        assert_eq!(result.action.unwrap()["type"], "navigate");
    }

    #[test]
    fn unknown_step_status_is_tolerated() {
        let step: WorkflowStep = serde_json::from_value(json!({
            "workflow_id": "wf",
            "step_index": 1,
            "total_steps": 3,
            "label": "Scoring",
            "status": "paused"
        }))
        .unwrap();
        assert_eq!(step.status, StepStatus::Unknown);
        assert!(!step.is_final());
    }

    #[test]
    fn step_progress() {
        let mut step = WorkflowStep {
            workflow_id: "wf".into(),
            step_index: 2,
            total_steps: 3,
            label: "Sending emails".into(),
            status: StepStatus::Running,
        };
        assert!((step.progress() - 2.0 / 3.0).abs() < f32::EPSILON);
        assert!(!step.is_final());

        step.status = StepStatus::Completed;
        assert_eq!(step.progress(), 1.0);
        assert!(step.is_final());
    }

    #[test]
    fn step_index_at_u32_max_does_not_overflow() {
        let step: WorkflowStep = serde_json::from_value(json!({
            "workflow_id": "wf",
            "step_index": u32::MAX,
            "total_steps": 3,
            "label": "Runaway",
            "status": "completed"
        }))
        .unwrap();
        assert_eq!(step.step_index, u32::MAX);
        assert_eq!(step.progress(), 1.0);
        assert!(step.is_final());

        let step = WorkflowStep {
            total_steps: u32::MAX,
            status: StepStatus::Running,
            ..step
        };
        assert!(!step.is_final());
        assert!(step.progress() <= 1.0);
    }
}
