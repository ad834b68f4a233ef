//! Game-loop driver shared by the binaries.
//!
//! [`App`] owns the session and the host collaborators. It turns adapter
//! commands and clock steps into session calls, and session changes into
//! outbound protocol messages. It has no I/O of its own, so the whole loop can
//! be exercised without a socket.

use tracing::{debug, info};

use crate::adapter::protocol::{create_ack, create_notification, AckMessage};
use crate::adapter::{build_observation, ClientCommand, InboundCommand, InboundPayload, OutboundMessage};
use crate::core::{GameSession, GameSnapshot, SessionConfig};
use crate::host::{
    dispatch, DispatchStats, HostPlatform, PlayerProfile, ScoreSubmission, ScoreSubmitter,
    SubmissionStatus, SubmissionTracker,
};
use crate::types::{GameAction, GameEvent};

pub struct App<P, S> {
    session: GameSession,
    host: P,
    submitter: S,
    tracker: SubmissionTracker,
    profile: PlayerProfile,
    snapshot: GameSnapshot,
    out_seq: u64,
    dispatched: DispatchStats,
}

impl<P, S> App<P, S>
where
    P: HostPlatform,
    S: ScoreSubmitter,
{
    pub fn new(config: SessionConfig, host: P, submitter: S) -> Self {
        Self {
            session: GameSession::with_config(config),
            host,
            submitter,
            tracker: SubmissionTracker::new(),
            profile: PlayerProfile::default(),
            snapshot: GameSnapshot::default(),
            out_seq: 0,
            dispatched: DispatchStats::default(),
        }
    }

    pub fn with_profile(mut self, profile: PlayerProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn host(&self) -> &P {
        &self.host
    }

    pub fn submission_status(&self) -> &SubmissionStatus {
        self.tracker.status()
    }

    /// Totals of all host notifications so far.
    pub fn dispatched(&self) -> DispatchStats {
        self.dispatched
    }

    /// Handle one command from the adapter, appending replies to `out`.
    pub fn handle_inbound(&mut self, inbound: InboundCommand, out: &mut Vec<OutboundMessage>) {
        match inbound.payload {
            InboundPayload::SnapshotRequest => {
                self.session.snapshot_into(&mut self.snapshot);
                let seq = self.next_seq();
                let obs = build_observation(&self.snapshot, seq);
                out.push(OutboundMessage::ToClientObservation {
                    client_id: inbound.client_id,
                    obs,
                });
            }
            InboundPayload::Command(cmd) => {
                let ack = self.apply_command(cmd, inbound.seq);
                out.push(OutboundMessage::ToClientAck {
                    client_id: inbound.client_id,
                    ack,
                });
                self.flush(true, out);
            }
        }
    }

    /// Advance the session clock by one loop step.
    pub fn step(&mut self, elapsed_ms: u32, out: &mut Vec<OutboundMessage>) {
        let changed = self.session.tick(elapsed_ms);
        self.flush(changed, out);
    }

    fn apply_command(&mut self, cmd: ClientCommand, seq: u64) -> AckMessage {
        match cmd {
            ClientCommand::Action(GameAction::Hint) => {
                let outcome = self.session.use_hint();
                with_message(create_ack(seq, outcome.applied()), outcome.message())
            }
            ClientCommand::Action(GameAction::FreezeTime) => {
                let outcome = self.session.freeze_time();
                with_message(create_ack(seq, outcome.applied()), outcome.message())
            }
            ClientCommand::Action(action) => {
                let applied = self.session.apply_action(action);
                debug!(action = action.as_str(), applied, "command applied");
                create_ack(seq, applied)
            }
            ClientCommand::SubmitScore => {
                let submission = ScoreSubmission::from_session(&self.session, self.profile.clone());
                let status = self.tracker.submit(&mut self.submitter, &submission);
                let ack = create_ack(seq, matches!(status, SubmissionStatus::Succeeded(_)));
                match status {
                    SubmissionStatus::Succeeded(receipt) => with_message(ack, &receipt.reference),
                    SubmissionStatus::Failed(reason) => with_message(ack, reason),
                    other => with_message(ack, other.as_str()),
                }
            }
        }
    }

    /// Forward queued events and, if anything changed, a fresh observation.
    fn flush(&mut self, changed: bool, out: &mut Vec<OutboundMessage>) {
        let events: Vec<GameEvent> = self.session.drain_events().collect();
        for event in &events {
            if let GameEvent::GameOver { final_score } = event {
                info!(final_score, level = self.session.level(), "game over");
            }
            let note = create_notification(self.next_seq(), event);
            out.push(OutboundMessage::BroadcastNotification { note });
        }
        if events.iter().any(|e| matches!(e, GameEvent::Ready { .. })) {
            // New game: the previous submission no longer applies.
            self.tracker.reset();
        }

        let stats = dispatch(&mut self.host, events.iter().copied());
        self.dispatched.delivered += stats.delivered;
        self.dispatched.failed += stats.failed;
        self.dispatched.skipped += stats.skipped;

        if changed || !events.is_empty() {
            self.session.snapshot_into(&mut self.snapshot);
            let seq = self.next_seq();
            let obs = build_observation(&self.snapshot, seq);
            out.push(OutboundMessage::BroadcastObservation { obs });
        }
    }

    fn next_seq(&mut self) -> u64 {
        self.out_seq += 1;
        self.out_seq
    }
}

fn with_message(mut ack: AckMessage, message: &str) -> AckMessage {
    ack.message = Some(message.to_string());
    ack
}
