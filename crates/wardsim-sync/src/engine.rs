use crate::callbacks::UiSink;
use crate::correlation::CorrelationStore;
use crate::display::{DisplayScheduler, ReadyTranscript};
use crate::turns::TurnCoordinator;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use wardsim_audio::{decode_base64_pcm, AudioSink};
use wardsim_core::{
    AudioChunkEvent, ConnectionStatus, ProtocolError, SyncConfig, TranscriptEvent, TurnSignal,
    WireEvent,
};

const PARSE_FAILURE_CAPACITY: usize = 64;

/// A malformed frame kept for diagnostics; the raw payload is preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseFailure {
    pub raw: String,
    pub error: String,
}

#[derive(Debug)]
struct PendingTranscript {
    id: Option<String>,
    ready: ReadyTranscript,
}

#[derive(Debug)]
struct QueuedTranscript {
    id: Option<String>,
    ready: ReadyTranscript,
}

/// An absent id on either side matches anything. Safe while utterances are
/// strictly sequential; revisit if concurrent speakers ever become
/// possible.
fn ids_compatible(transcript_id: &Option<String>, audio_id: &Option<String>) -> bool {
    match (transcript_id, audio_id) {
        (Some(t), Some(a)) => t == a,
        _ => true,
    }
}

/// The synchronization engine: classifies inbound events and renders them
/// to the UI in strict audio-paced order, whatever order they arrive in.
///
/// All state lives here explicitly; `new`/`reset` are plain state
/// transitions, so the engine can be driven deterministically in tests
/// with a manual audio sink. One logical task mutates it (see
/// `SyncService`), so each handler runs to completion atomically.
pub struct SyncEngine {
    sink: Box<dyn AudioSink>,
    ui: Arc<dyn UiSink>,

    correlation: CorrelationStore,
    display: DisplayScheduler,
    turns: TurnCoordinator,

    /// Transcript waiting for its first audio chunk.
    pending: Option<PendingTranscript>,
    /// Transcript matched to audio; later chunks keep extending its
    /// show-at time until it is released.
    queued: Option<QueuedTranscript>,
    grace_deadline: Option<Instant>,

    grace_period: Duration,
    min_wake: Duration,
    parse_failures: VecDeque<ParseFailure>,
}

impl SyncEngine {
    pub fn new(sink: Box<dyn AudioSink>, ui: Arc<dyn UiSink>, config: &SyncConfig) -> Self {
        Self {
            sink,
            ui,
            correlation: CorrelationStore::new(),
            display: DisplayScheduler::new(),
            turns: TurnCoordinator::new(),
            pending: None,
            queued: None,
            grace_deadline: None,
            grace_period: Duration::from_millis(config.grace_period_ms),
            min_wake: Duration::from_millis(config.min_wake_ms),
            parse_failures: VecDeque::new(),
        }
    }

    /// Handle one raw inbound frame. Never fatal: unrecognized kinds are
    /// logged and dropped, malformed frames are kept for diagnostics and
    /// the stream continues.
    pub fn handle_raw(&mut self, raw: &str) {
        match WireEvent::parse(raw) {
            Ok(event) => self.handle_event(event),
            Err(ProtocolError::UnknownKind(kind)) => {
                tracing::warn!(kind = %kind, "unrecognized event kind, dropping");
            }
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed frame");
                self.record_failure(raw, e.to_string());
            }
        }
    }

    pub fn handle_event(&mut self, event: WireEvent) {
        match event {
            WireEvent::Transcript(t) => self.handle_transcript(t),
            WireEvent::Audio(a) => self.handle_audio(a),
            WireEvent::System { message } => self.ui.on_system(&message),
            WireEvent::Clinical(value) => self.ui.on_clinical(&value),
            WireEvent::Diagnosis(list) => self.turns.store_diagnoses(list),
            WireEvent::Questions(list) => self.turns.store_questions(list),
            WireEvent::Turn(TurnSignal::FinishCycle) => {
                let delay = self.audio_delay();
                self.turns.on_turn_boundary(delay, self.ui.as_ref());
            }
            WireEvent::Turn(TurnSignal::End) => {
                let delay = self.audio_delay();
                self.turns.on_simulation_end(delay);
            }
        }
    }

    fn handle_transcript(&mut self, t: TranscriptEvent) {
        self.grace_deadline = None;
        let ready = ReadyTranscript {
            speaker: t.speaker,
            text: t.text,
            highlights: t.highlights,
        };

        // Audio may already have arrived under this id; if so the span end
        // is the show-at time and the entry is consumed.
        if let Some(span) = t
            .id
            .as_deref()
            .and_then(|id| self.correlation.take_timing(id))
        {
            tracing::debug!(
                show_at = span.end,
                "transcript arrived after its audio, queuing at span end"
            );
            self.pending = None;
            self.queued = None;
            self.display.enqueue(ready, span.end);
            return;
        }

        if let Some(previous) = self.pending.take() {
            tracing::warn!(text = %previous.ready.text, "superseding transcript that never saw audio");
        }
        self.queued = None;
        self.pending = Some(PendingTranscript { id: t.id, ready });
        self.grace_deadline = Some(Instant::now() + self.grace_period);
    }

    fn handle_audio(&mut self, a: AudioChunkEvent) {
        let samples = match decode_base64_pcm(&a.data) {
            Ok(samples) => samples,
            Err(e) => {
                tracing::warn!(error = %e, "dropping undecodable audio chunk");
                self.record_failure(&a.data, e.to_string());
                return;
            }
        };

        let timing = self.sink.schedule_chunk(&samples);
        self.ui.on_audio(&a.data);

        let matches_pending = self
            .pending
            .as_ref()
            .is_some_and(|p| ids_compatible(&p.id, &a.id));
        let matches_queued = self
            .queued
            .as_ref()
            .is_some_and(|q| ids_compatible(&q.id, &a.id));

        let matched = if matches_pending {
            self.grace_deadline = None;
            if let Some(pending) = self.pending.take() {
                tracing::debug!("transcript matched to audio, showing after utterance ends");
                self.queued = Some(QueuedTranscript {
                    id: pending.id,
                    ready: pending.ready,
                });
            }
            true
        } else if matches_queued {
            tracing::debug!(end = timing.end, "additional chunk extends current utterance");
            true
        } else if let Some(id) = &a.id {
            // Audio before its transcript: remember the span for later.
            self.correlation.record_timing(id, timing);
            false
        } else {
            tracing::debug!("untagged audio with nothing pending, playback only");
            false
        };

        // Each matched chunk pushes the queued transcript's show-at out to
        // the new end time.
        if matched {
            if let Some(queued) = &self.queued {
                self.display.enqueue(queued.ready.clone(), timing.end);
            }
        }
    }

    /// Release everything that has come due: display items against the
    /// audio clock, the grace timeout, and delayed turn releases.
    pub fn poll(&mut self) {
        let released = self.display.release_due(self.sink.now(), self.ui.as_ref());
        if let Some(queued) = &self.queued {
            if released.iter().any(|text| *text == queued.ready.text) {
                self.queued = None;
            }
        }

        let now = Instant::now();
        if self.grace_deadline.is_some_and(|deadline| now >= deadline) {
            self.fire_grace();
        }

        self.turns.poll(now, self.ui.as_ref());
    }

    fn fire_grace(&mut self) {
        self.grace_deadline = None;
        if let Some(pending) = self.pending.take() {
            tracing::info!(
                text = %pending.ready.text,
                "no audio within grace period, showing transcript unsynced"
            );
            self.ui.on_transcript(
                pending.ready.speaker,
                &pending.ready.text,
                &pending.ready.highlights,
            );
        }
    }

    /// How long the driver may sleep before the next `poll`. `None` means
    /// nothing is scheduled and only a new event can create work.
    pub fn next_wake(&self) -> Option<Duration> {
        let now = Instant::now();
        let mut wake: Option<Duration> = None;

        if let Some(show_at) = self.display.next_deadline() {
            // The audio clock advances 1:1 with wall time while the device
            // is live; the driver re-checks on wake in case it lagged.
            let until = Duration::from_secs_f64((show_at - self.sink.now()).max(0.0));
            wake = Some(until);
        }
        if let Some(deadline) = self.grace_deadline {
            let until = deadline.saturating_duration_since(now);
            wake = Some(wake.map_or(until, |w| w.min(until)));
        }
        if let Some(deadline) = self.turns.next_deadline() {
            let until = deadline.saturating_duration_since(now);
            wake = Some(wake.map_or(until, |w| w.min(until)));
        }

        wake.map(|w| w.max(self.min_wake))
    }

    /// Remaining audio of the current turn, for delaying clinical updates.
    fn audio_delay(&self) -> Duration {
        Duration::from_secs_f64((self.sink.last_end() - self.sink.now()).max(0.0))
    }

    /// Report a transport status change. Going down clears all pending
    /// synchronization state; in-flight emissions are dropped, not
    /// completed.
    pub fn set_status(&mut self, status: ConnectionStatus) {
        self.ui.on_status(status);
        if matches!(
            status,
            ConnectionStatus::Disconnected | ConnectionStatus::Error
        ) {
            tracing::info!(?status, "transport down, clearing sync state");
            self.reset();
        }
    }

    /// Clear all queues, maps, pending slots and deadlines for a new
    /// session. Cancellation is synchronous: nothing fires after this.
    pub fn reset(&mut self) {
        self.correlation.clear();
        self.display.clear();
        self.turns.clear();
        self.pending = None;
        self.queued = None;
        self.grace_deadline = None;
        self.parse_failures.clear();
        self.sink.reset();
    }

    /// Malformed frames seen so far, oldest first.
    pub fn parse_failures(&self) -> impl Iterator<Item = &ParseFailure> {
        self.parse_failures.iter()
    }

    fn record_failure(&mut self, raw: &str, error: String) {
        if self.parse_failures.len() == PARSE_FAILURE_CAPACITY {
            self.parse_failures.pop_front();
        }
        self.parse_failures.push_back(ParseFailure {
            raw: raw.to_string(),
            error,
        });
    }
}
