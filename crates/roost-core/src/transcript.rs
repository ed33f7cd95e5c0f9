//! Ordered conversation transcript with single-flight submission.
//!
//! The controller owns the turn list and enforces the interaction
//! discipline: one outstanding agent request at a time, a `Pending` reply
//! appended the moment a prompt is accepted, and resolution into either a
//! parsed document or a failure message.

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::document::AgentDocument;
use crate::parser;

/// Error produced by a collaborator while completing a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollaboratorError {
    /// HTTP status when the failure came off the wire.
    pub status: Option<u16>,
    pub message: String,
}

impl CollaboratorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }
}

impl fmt::Display for CollaboratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "HTTP {status}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for CollaboratorError {}

/// Anything that can turn a user prompt into raw agent text.
///
/// The transcript layer only ever sees opaque text; decoding into a
/// document happens after the reply lands.
pub trait AgentCollaborator: Send + Sync {
    fn complete(&self, prompt: String) -> BoxFuture<'static, Result<String, CollaboratorError>>;
}

/// State of the agent's reply within a turn.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentReply {
    /// Submitted, no response yet.
    Pending,
    /// Response received and decoded.
    Parsed(AgentDocument),
    /// Request failed; the message is user-presentable.
    Failed { message: String },
}

/// One entry in the conversation, in submission order.
#[derive(Debug, Clone, PartialEq)]
pub enum Turn {
    User { content: String },
    Agent { reply: AgentReply },
}

/// Rejection reasons for [`TranscriptController::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// Prompt was empty or whitespace-only.
    EmptyPrompt,
    /// A previous submission has not resolved yet.
    Busy,
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::EmptyPrompt => write!(f, "prompt is empty"),
            SubmitError::Busy => write!(f, "a request is already in flight"),
        }
    }
}

impl std::error::Error for SubmitError {}

/// Owns the ordered turn list and the single in-flight agent request.
pub struct TranscriptController {
    collaborator: Arc<dyn AgentCollaborator>,
    turns: Vec<Turn>,
    in_flight: Option<JoinHandle<Result<String, CollaboratorError>>>,
}

impl TranscriptController {
    pub fn new(collaborator: Arc<dyn AgentCollaborator>) -> Self {
        Self {
            collaborator,
            turns: Vec::new(),
            in_flight: None,
        }
    }

    /// Whether a submitted prompt is still awaiting its reply.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// All turns in submission order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Point-in-time copy of the transcript.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.clone()
    }

    /// Accepts a prompt and dispatches it to the collaborator.
    ///
    /// On acceptance the user turn (verbatim, untrimmed) and a `Pending`
    /// agent turn are appended atomically from the caller's perspective.
    /// Whitespace-only prompts and overlapping submissions are rejected
    /// without touching the transcript.
    pub fn submit(&mut self, prompt: &str) -> Result<(), SubmitError> {
        if prompt.trim().is_empty() {
            return Err(SubmitError::EmptyPrompt);
        }
        if self.in_flight.is_some() {
            return Err(SubmitError::Busy);
        }

        self.turns.push(Turn::User {
            content: prompt.to_string(),
        });
        self.turns.push(Turn::Agent {
            reply: AgentReply::Pending,
        });

        let fut = self.collaborator.complete(prompt.to_string());
        self.in_flight = Some(tokio::spawn(fut));
        Ok(())
    }

    /// Waits for the in-flight request and resolves the pending turn.
    ///
    /// A no-op returning `None` when nothing is in flight; otherwise
    /// returns the resolved reply. The controller is ready for the next
    /// `submit` as soon as this returns.
    pub async fn wait_for_reply(&mut self) -> Option<AgentReply> {
        let handle = self.in_flight.take()?;
        let reply = match handle.await {
            Ok(Ok(text)) => AgentReply::Parsed(parser::parse(&text)),
            Ok(Err(err)) => AgentReply::Failed {
                message: err.to_string(),
            },
            Err(err) => AgentReply::Failed {
                message: format!("agent task failed: {err}"),
            },
        };
        self.resolve_pending(reply.clone());
        Some(reply)
    }

    /// Replaces the most recent `Pending` turn with `reply`. If none exists
    /// the reply is appended so it is never lost.
    fn resolve_pending(&mut self, reply: AgentReply) {
        for turn in self.turns.iter_mut().rev() {
            if matches!(
                turn,
                Turn::Agent {
                    reply: AgentReply::Pending
                }
            ) {
                *turn = Turn::Agent { reply };
                return;
            }
        }
        warn!("no pending turn to resolve, appending reply");
        self.turns.push(Turn::Agent { reply });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Card;

    struct CannedCollaborator {
        response: Result<String, CollaboratorError>,
    }

    impl CannedCollaborator {
        fn ok(text: &str) -> Arc<Self> {
            Arc::new(Self {
                response: Ok(text.to_string()),
            })
        }

        fn failing(err: CollaboratorError) -> Arc<Self> {
            Arc::new(Self { response: Err(err) })
        }
    }

    impl AgentCollaborator for CannedCollaborator {
        fn complete(
            &self,
            _prompt: String,
        ) -> BoxFuture<'static, Result<String, CollaboratorError>> {
            let response = self.response.clone();
            Box::pin(async move { response })
        }
    }

    #[tokio::test]
    async fn submit_appends_user_and_pending_turns() {
        let mut controller = TranscriptController::new(CannedCollaborator::ok("hi"));
        controller.submit("  hello there  ").unwrap();
        assert_eq!(
            controller.turns(),
            &[
                Turn::User {
                    content: "  hello there  ".to_string()
                },
                Turn::Agent {
                    reply: AgentReply::Pending
                },
            ]
        );
        assert!(controller.is_busy());
    }

    #[tokio::test]
    async fn whitespace_prompt_is_rejected_without_side_effects() {
        let mut controller = TranscriptController::new(CannedCollaborator::ok("hi"));
        assert_eq!(controller.submit("   \n\t "), Err(SubmitError::EmptyPrompt));
        assert!(controller.turns().is_empty());
        assert!(!controller.is_busy());
    }

    #[tokio::test]
    async fn second_submit_while_pending_is_rejected() {
        let mut controller = TranscriptController::new(CannedCollaborator::ok("hi"));
        controller.submit("first").unwrap();
        assert_eq!(controller.submit("second"), Err(SubmitError::Busy));
        assert_eq!(controller.turns().len(), 2);
    }

    #[tokio::test]
    async fn successful_reply_resolves_into_parsed_document() {
        let raw = "PROFILE_CARD::\nUsername: @a\nBio: b\nImageURL: https://x.com/p.png\n";
        let mut controller = TranscriptController::new(CannedCollaborator::ok(raw));
        controller.submit("look up @a").unwrap();

        let reply = controller.wait_for_reply().await.unwrap();
        let AgentReply::Parsed(doc) = &reply else {
            panic!("expected parsed reply");
        };
        assert!(matches!(doc.cards(), [Card::Profile(_)]));
        assert_eq!(controller.turns()[1], Turn::Agent { reply });
        assert!(!controller.is_busy());
    }

    #[tokio::test]
    async fn failed_reply_keeps_user_turn_and_records_message() {
        let err = CollaboratorError::http(502, "upstream unavailable");
        let mut controller = TranscriptController::new(CannedCollaborator::failing(err));
        controller.submit("anything").unwrap();

        let reply = controller.wait_for_reply().await.unwrap();
        assert_eq!(
            reply,
            AgentReply::Failed {
                message: "HTTP 502: upstream unavailable".to_string()
            }
        );
        assert_eq!(
            controller.turns()[0],
            Turn::User {
                content: "anything".to_string()
            }
        );
        // Busy cleared, the next submission goes through.
        assert!(controller.submit("retry").is_ok());
    }

    #[tokio::test]
    async fn submit_is_accepted_again_after_resolution() {
        let mut controller = TranscriptController::new(CannedCollaborator::ok("plain"));
        controller.submit("one").unwrap();
        controller.wait_for_reply().await.unwrap();
        controller.submit("two").unwrap();
        assert_eq!(controller.turns().len(), 4);
    }

    #[tokio::test]
    async fn wait_without_submission_is_a_no_op() {
        let mut controller = TranscriptController::new(CannedCollaborator::ok("hi"));
        assert_eq!(controller.wait_for_reply().await, None);
    }
}
