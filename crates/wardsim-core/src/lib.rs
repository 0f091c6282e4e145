pub mod clinical;
pub mod config;
pub mod error;
pub mod events;

pub use clinical::{checklist_from_questions, confidence_score, ChecklistItem};
pub use config::{AppConfig, AudioConfig, GeneralConfig, SessionConfig, SyncConfig};
pub use error::{AudioError, ConfigError, ProtocolError};
pub use events::{
    AudioChunkEvent, ConnectionStatus, DiagnosisEntry, Highlight, HighlightLevel, Probability,
    QuestionEntry, QuestionStatus, Speaker, StartCommand, TranscriptEvent, TurnSignal, WireEvent,
};
