use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};

// ── Inbound wire events ────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Speaker {
    Nurse,
    Patient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightLevel {
    Warning,
    Info,
}

/// A span of transcript text the backend wants emphasized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    pub level: HighlightLevel,
    pub text: String,
}

/// One utterance of nurse or patient speech.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TranscriptEvent {
    /// Correlation id grouping this transcript with its audio chunk(s).
    #[serde(default)]
    pub id: Option<String>,
    pub speaker: Speaker,
    pub text: String,
    #[serde(default)]
    pub highlights: Vec<Highlight>,
}

/// A base64-wrapped chunk of PCM16LE mono 24kHz audio. An utterance may be
/// split across several chunks sharing one correlation id.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AudioChunkEvent {
    #[serde(default)]
    pub id: Option<String>,
    pub data: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Probability {
    Low,
    Medium,
    High,
}

/// One ranked differential-diagnosis entry from the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisEntry {
    #[serde(rename = "did")]
    pub id: String,
    #[serde(rename = "diagnosis")]
    pub label: String,
    #[serde(rename = "indicators_point", default)]
    pub supporting_points: Vec<String>,
    #[serde(rename = "indicators_count", default)]
    pub supporting_count: u32,
    #[serde(default)]
    pub probability: Option<Probability>,
    #[serde(default)]
    pub rank: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionStatus {
    Asked,
    Deleted,
}

/// One entry of the backend's interview question list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionEntry {
    #[serde(rename = "qid")]
    pub id: String,
    #[serde(default)]
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub rank: u32,
    #[serde(default)]
    pub status: Option<QuestionStatus>,
    #[serde(default)]
    pub answer: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnSignal {
    #[serde(rename = "finish cycle")]
    FinishCycle,
    #[serde(rename = "end")]
    End,
}

/// A classified inbound event. Field names on the wire match the backend's
/// JSON protocol; see `WireEvent::parse`.
#[derive(Debug, Clone, PartialEq)]
pub enum WireEvent {
    Transcript(TranscriptEvent),
    Audio(AudioChunkEvent),
    System { message: String },
    /// Legacy single-diagnosis form, passed through to the UI untouched.
    Clinical(serde_json::Value),
    Diagnosis(Vec<DiagnosisEntry>),
    Questions(Vec<QuestionEntry>),
    Turn(TurnSignal),
}

#[derive(Deserialize)]
struct SystemPayload {
    message: String,
}

#[derive(Deserialize)]
struct DataPayload<T> {
    data: T,
}

impl WireEvent {
    /// Parse one raw frame. `UnknownKind` is recoverable (log and drop);
    /// other errors mean a malformed frame worth keeping for diagnostics.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        let kind = value
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or(ProtocolError::MissingKind)?
            .to_string();

        let bad_payload = |source| ProtocolError::BadPayload {
            kind: kind.clone(),
            source,
        };

        match kind.as_str() {
            "transcript" => serde_json::from_value(value)
                .map(WireEvent::Transcript)
                .map_err(bad_payload),
            "audio" => serde_json::from_value(value)
                .map(WireEvent::Audio)
                .map_err(bad_payload),
            "system" => serde_json::from_value::<SystemPayload>(value)
                .map(|p| WireEvent::System { message: p.message })
                .map_err(bad_payload),
            "clinical" => Ok(WireEvent::Clinical(value)),
            "diagnosis" => serde_json::from_value::<DataPayload<Vec<DiagnosisEntry>>>(value)
                .map(|p| WireEvent::Diagnosis(p.data))
                .map_err(bad_payload),
            "questions" => serde_json::from_value::<DataPayload<Vec<QuestionEntry>>>(value)
                .map(|p| WireEvent::Questions(p.data))
                .map_err(bad_payload),
            "turn" => serde_json::from_value::<DataPayload<TurnSignal>>(value)
                .map(|p| WireEvent::Turn(p.data))
                .map_err(bad_payload),
            _ => Err(ProtocolError::UnknownKind(kind)),
        }
    }
}

// ── Outbound ───────────────────────────────────────────────────

/// The single outbound frame, sent by the caller on connection open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartCommand {
    #[serde(rename = "type")]
    kind: &'static str,
    pub patient_id: String,
    pub gender: String,
}

impl StartCommand {
    pub fn new(patient_id: impl Into<String>, gender: impl Into<String>) -> Self {
        Self {
            kind: "start",
            patient_id: patient_id.into(),
            gender: gender.into(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Transport state as reported to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}
