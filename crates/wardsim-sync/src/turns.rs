use crate::callbacks::UiSink;
use std::time::Duration;
use tokio::time::Instant;
use wardsim_core::{DiagnosisEntry, QuestionEntry, TurnSignal};

#[derive(Debug)]
enum ReleasePayload {
    TurnData {
        diagnoses: Option<Vec<DiagnosisEntry>>,
        questions: Option<Vec<QuestionEntry>>,
    },
    SimulationEnd,
}

#[derive(Debug)]
struct ScheduledRelease {
    at: Instant,
    payload: ReleasePayload,
}

/// Buffers clinical snapshots that arrive mid-turn and releases them only
/// after the turn boundary, further delayed until the turn's audio has
/// finished playing. The backend reports "turn done" before the user has
/// heard the audio out; reflowing the dashboard early would spoil the
/// still-playing utterance.
#[derive(Debug, Default)]
pub struct TurnCoordinator {
    pending_diagnoses: Option<Vec<DiagnosisEntry>>,
    pending_questions: Option<Vec<QuestionEntry>>,
    releases: Vec<ScheduledRelease>,
}

impl TurnCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest-wins: a new snapshot overwrites whatever was pending.
    pub fn store_diagnoses(&mut self, diagnoses: Vec<DiagnosisEntry>) {
        tracing::debug!(count = diagnoses.len(), "buffered diagnoses until turn boundary");
        self.pending_diagnoses = Some(diagnoses);
    }

    pub fn store_questions(&mut self, questions: Vec<QuestionEntry>) {
        tracing::debug!(count = questions.len(), "buffered questions until turn boundary");
        self.pending_questions = Some(questions);
    }

    /// A turn finished. The signal goes out immediately; the pending data
    /// snapshots are taken now and emitted once `delay` (the remaining
    /// audio of this turn) has elapsed.
    pub fn on_turn_boundary(&mut self, delay: Duration, ui: &dyn UiSink) {
        ui.on_turn_cycle(TurnSignal::FinishCycle);

        let diagnoses = self.pending_diagnoses.take();
        let questions = self.pending_questions.take();
        if diagnoses.is_none() && questions.is_none() {
            tracing::debug!("turn boundary with nothing pending");
            return;
        }

        tracing::debug!(?delay, "scheduling clinical data release after audio");
        self.releases.push(ScheduledRelease {
            at: Instant::now() + delay,
            payload: ReleasePayload::TurnData {
                diagnoses,
                questions,
            },
        });
    }

    /// The simulation is over; the end signal itself waits for the audio.
    pub fn on_simulation_end(&mut self, delay: Duration) {
        tracing::debug!(?delay, "scheduling simulation-end signal after audio");
        self.releases.push(ScheduledRelease {
            at: Instant::now() + delay,
            payload: ReleasePayload::SimulationEnd,
        });
    }

    /// Fire every release whose time has come.
    pub fn poll(&mut self, now: Instant, ui: &dyn UiSink) {
        let mut i = 0;
        while i < self.releases.len() {
            if self.releases[i].at <= now {
                let release = self.releases.remove(i);
                Self::fire(release.payload, ui);
            } else {
                i += 1;
            }
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.releases.iter().map(|r| r.at).min()
    }

    /// Drop pending slots and cancel scheduled releases.
    pub fn clear(&mut self) {
        self.pending_diagnoses = None;
        self.pending_questions = None;
        self.releases.clear();
    }

    fn fire(payload: ReleasePayload, ui: &dyn UiSink) {
        match payload {
            ReleasePayload::TurnData {
                diagnoses,
                questions,
            } => {
                if let Some(diagnoses) = diagnoses {
                    tracing::debug!(count = diagnoses.len(), "applying diagnoses");
                    ui.on_diagnoses(&diagnoses);
                }
                if let Some(questions) = questions {
                    tracing::debug!(count = questions.len(), "applying questions");
                    ui.on_questions(&questions);
                }
            }
            ReleasePayload::SimulationEnd => {
                tracing::debug!("audio finished, signaling simulation end");
                ui.on_turn_cycle(TurnSignal::End);
            }
        }
    }
}
