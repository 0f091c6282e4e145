use std::sync::Mutex;
use wardsim_core::{
    ConnectionStatus, DiagnosisEntry, Highlight, QuestionEntry, Speaker, TurnSignal,
};

/// The callback surface consumed by the presentation layer. Implementations
/// must be cheap and non-blocking; the engine invokes them from its driver
/// task.
pub trait UiSink: Send + Sync {
    /// A transcript has become eligible for display.
    fn on_transcript(&self, speaker: Speaker, text: &str, highlights: &[Highlight]);

    /// An audio payload was received. Informational only; playback has
    /// already been scheduled by the time this fires.
    fn on_audio(&self, payload: &str) {
        let _ = payload;
    }

    fn on_system(&self, message: &str);

    /// Legacy single-diagnosis clinical frame, passed through verbatim.
    fn on_clinical(&self, raw: &serde_json::Value) {
        let _ = raw;
    }

    fn on_diagnoses(&self, diagnoses: &[DiagnosisEntry]);

    fn on_questions(&self, questions: &[QuestionEntry]);

    fn on_turn_cycle(&self, signal: TurnSignal);

    fn on_status(&self, status: ConnectionStatus);
}

// ── RecordingSink ─────────────────────────────────────────────

/// Everything a sink can observe, as owned data.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Transcript {
        speaker: Speaker,
        text: String,
        highlights: Vec<Highlight>,
    },
    Audio(String),
    System(String),
    Clinical(serde_json::Value),
    Diagnoses(Vec<DiagnosisEntry>),
    Questions(Vec<QuestionEntry>),
    TurnCycle(TurnSignal),
    Status(ConnectionStatus),
}

/// A sink that records every callback in order. Used by this crate's own
/// tests and handy for hosts that want to assert on engine output.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<UiEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<UiEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Drain recorded events.
    pub fn take(&self) -> Vec<UiEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    /// Only the released transcript texts, in release order.
    pub fn transcript_texts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::Transcript { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: UiEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl UiSink for RecordingSink {
    fn on_transcript(&self, speaker: Speaker, text: &str, highlights: &[Highlight]) {
        self.push(UiEvent::Transcript {
            speaker,
            text: text.to_string(),
            highlights: highlights.to_vec(),
        });
    }

    fn on_audio(&self, payload: &str) {
        self.push(UiEvent::Audio(payload.to_string()));
    }

    fn on_system(&self, message: &str) {
        self.push(UiEvent::System(message.to_string()));
    }

    fn on_clinical(&self, raw: &serde_json::Value) {
        self.push(UiEvent::Clinical(raw.clone()));
    }

    fn on_diagnoses(&self, diagnoses: &[DiagnosisEntry]) {
        self.push(UiEvent::Diagnoses(diagnoses.to_vec()));
    }

    fn on_questions(&self, questions: &[QuestionEntry]) {
        self.push(UiEvent::Questions(questions.to_vec()));
    }

    fn on_turn_cycle(&self, signal: TurnSignal) {
        self.push(UiEvent::TurnCycle(signal));
    }

    fn on_status(&self, status: ConnectionStatus) {
        self.push(UiEvent::Status(status));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_preserves_order() {
        let sink = RecordingSink::new();
        sink.on_system("one");
        sink.on_turn_cycle(TurnSignal::FinishCycle);
        sink.on_system("two");
        let events = sink.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], UiEvent::System("one".to_string()));
        assert_eq!(events[1], UiEvent::TurnCycle(TurnSignal::FinishCycle));
        assert_eq!(events[2], UiEvent::System("two".to_string()));
    }

    #[test]
    fn test_recording_sink_take_drains() {
        let sink = RecordingSink::new();
        sink.on_system("one");
        assert_eq!(sink.take().len(), 1);
        assert!(sink.events().is_empty());
    }
}
