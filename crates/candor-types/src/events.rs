use crate::models::{Feedback, FeedbackComment, FeedbackRequest};

/// State transitions that fan out a notification to the opposite party.
/// Raised only after the triggering write has committed.
#[derive(Debug, Clone)]
pub enum NotificationEvent {
    /// New feedback was submitted; the receiver is told.
    FeedbackCreated { feedback: Feedback },

    /// The receiver acknowledged feedback; the giver is told.
    FeedbackAcknowledged { feedback: Feedback },

    /// A user asked for feedback; their manager, if any, is told.
    FeedbackRequested { request: FeedbackRequest },

    /// Someone commented; whichever party did not write the comment is told.
    CommentAdded {
        feedback: Feedback,
        comment: FeedbackComment,
    },
}

impl NotificationEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FeedbackCreated { .. } => "feedback_created",
            Self::FeedbackAcknowledged { .. } => "feedback_acknowledged",
            Self::FeedbackRequested { .. } => "feedback_requested",
            Self::CommentAdded { .. } => "comment_added",
        }
    }
}
