//! Score submission
//!
//! The leaderboard write is an external collaborator. The game only hands it a
//! [`ScoreSubmission`] on explicit player action; the outcome is tracked in a
//! [`SubmissionTracker`] for the presentation layer and never touches the
//! session.

use tracing::{info, warn};

use crate::core::GameSession;
use crate::notify::HostError;

/// Player identity attached to a leaderboard entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerProfile {
    pub username: String,
    pub fid: u64,
    pub avatar_url: String,
}

impl Default for PlayerProfile {
    fn default() -> Self {
        Self {
            username: "Anonymous".to_string(),
            fid: 0,
            avatar_url: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreSubmission {
    pub score: u32,
    pub level: u32,
    pub elapsed_secs: u32,
    pub profile: PlayerProfile,
}

impl ScoreSubmission {
    /// Payload for the session's current result: the final score after game
    /// over, the running score otherwise.
    pub fn from_session(session: &GameSession, profile: PlayerProfile) -> Self {
        Self {
            score: session.submission_score(),
            level: session.level(),
            elapsed_secs: session.elapsed_secs(),
            profile,
        }
    }
}

/// Acknowledgement returned by a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    /// Transaction hash or other reference from the backend.
    pub reference: String,
}

pub trait ScoreSubmitter {
    fn submit(&mut self, submission: &ScoreSubmission) -> Result<SubmissionReceipt, HostError>;
}

/// Submitter that logs and hands out sequential references.
#[derive(Debug, Clone, Default)]
pub struct LoggingSubmitter {
    submitted: u32,
}

impl LoggingSubmitter {
    pub fn submitted(&self) -> u32 {
        self.submitted
    }
}

impl ScoreSubmitter for LoggingSubmitter {
    fn submit(&mut self, submission: &ScoreSubmission) -> Result<SubmissionReceipt, HostError> {
        self.submitted += 1;
        info!(
            score = submission.score,
            level = submission.level,
            elapsed_secs = submission.elapsed_secs,
            username = %submission.profile.username,
            "score submitted"
        );
        Ok(SubmissionReceipt {
            reference: format!("local-{}", self.submitted),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Submitting,
    Succeeded(SubmissionReceipt),
    Failed(String),
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Idle => "idle",
            SubmissionStatus::Submitting => "submitting",
            SubmissionStatus::Succeeded(_) => "succeeded",
            SubmissionStatus::Failed(_) => "failed",
        }
    }
}

/// Tracks one submission at a time.
#[derive(Debug, Clone, Default)]
pub struct SubmissionTracker {
    status: SubmissionStatus,
}

impl SubmissionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &SubmissionStatus {
        &self.status
    }

    /// Mark a submission as in flight. Returns `false` while another one is.
    pub fn begin(&mut self) -> bool {
        if self.status == SubmissionStatus::Submitting {
            return false;
        }
        self.status = SubmissionStatus::Submitting;
        true
    }

    pub fn finish(&mut self, result: Result<SubmissionReceipt, HostError>) {
        self.status = match result {
            Ok(receipt) => SubmissionStatus::Succeeded(receipt),
            Err(err) => {
                warn!(error = %err, "score submission failed");
                SubmissionStatus::Failed(err.to_string())
            }
        };
    }

    /// Run a blocking submission through `submitter`.
    pub fn submit<S>(&mut self, submitter: &mut S, submission: &ScoreSubmission) -> &SubmissionStatus
    where
        S: ScoreSubmitter + ?Sized,
    {
        if self.begin() {
            let result = submitter.submit(submission);
            self.finish(result);
        }
        &self.status
    }

    pub fn reset(&mut self) {
        self.status = SubmissionStatus::Idle;
    }
}
