//! Platform notifications
//!
//! The session queues [`GameEvent`]s; [`dispatch`] forwards the ones the host
//! platform cares about. Delivery is best effort: a failing call is logged at
//! `warn` and the remaining events are still delivered.

use thiserror::Error;
use tracing::{debug, warn};

use crate::types::GameEvent;

/// Errors reported by host collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The platform bridge is not attached (e.g. running outside the host app).
    #[error("host platform unavailable")]
    Unavailable,

    /// The platform refused a call.
    #[error("host rejected {call}: {reason}")]
    Rejected {
        /// Name of the refused call.
        call: &'static str,
        /// Reason given by the platform.
        reason: String,
    },

    /// Score submission failed (wallet, network or contract error).
    #[error("score submission failed: {0}")]
    Submission(String),
}

/// Outbound notifications to the embedding platform.
pub trait HostPlatform {
    /// A level board is ready (session start or reset).
    fn ready(&mut self, level: u32) -> Result<(), HostError>;

    /// The game ended with `final_score`.
    fn game_over(&mut self, final_score: u32) -> Result<(), HostError>;

    /// Short vibration pulse.
    fn haptic_feedback(&mut self) -> Result<(), HostError>;
}

/// Platform that only logs. Used when no bridge is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHost;

impl HostPlatform for LoggingHost {
    fn ready(&mut self, level: u32) -> Result<(), HostError> {
        tracing::info!(level, "host: ready");
        Ok(())
    }

    fn game_over(&mut self, final_score: u32) -> Result<(), HostError> {
        tracing::info!(final_score, "host: game over");
        Ok(())
    }

    fn haptic_feedback(&mut self) -> Result<(), HostError> {
        tracing::info!("host: haptic feedback");
        Ok(())
    }
}

/// Delivery counters of one [`dispatch`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchStats {
    pub delivered: u32,
    pub failed: u32,
    /// Events with no platform counterpart.
    pub skipped: u32,
}

/// Forward session events to the platform, swallowing failures.
pub fn dispatch<P, I>(platform: &mut P, events: I) -> DispatchStats
where
    P: HostPlatform + ?Sized,
    I: IntoIterator<Item = GameEvent>,
{
    let mut stats = DispatchStats::default();

    for event in events {
        let (call, result) = match event {
            GameEvent::Ready { level } => ("ready", platform.ready(level)),
            GameEvent::GameOver { final_score } => ("game_over", platform.game_over(final_score)),
            GameEvent::Haptic => ("haptic_feedback", platform.haptic_feedback()),
            other => {
                debug!(?other, "event not forwarded to host");
                stats.skipped += 1;
                continue;
            }
        };

        match result {
            Ok(()) => stats.delivered += 1,
            Err(err) => {
                warn!(call, error = %err, "host notification failed");
                stats.failed += 1;
            }
        }
    }

    stats
}
