//! Host collaborators - everything the game talks to but does not own
//!
//! - [`notify`]: fire-and-forget platform notifications (`ready`, `game over`,
//!   haptic pulse) fed from the session's event queue
//! - [`submit`]: leaderboard score submission and its status tracking
//! - [`autoplay`]: next-move suggestions for the headless bot
//!
//! Failures of these collaborators are logged and never change game state.

pub mod autoplay;
pub mod notify;
pub mod submit;

pub use base_stack_core as core;
pub use base_stack_types as types;

pub use autoplay::{suggest_action, suggest_selection};
pub use notify::{dispatch, DispatchStats, HostError, HostPlatform, LoggingHost};
pub use submit::{
    LoggingSubmitter, PlayerProfile, ScoreSubmission, ScoreSubmitter, SubmissionReceipt,
    SubmissionStatus, SubmissionTracker,
};
