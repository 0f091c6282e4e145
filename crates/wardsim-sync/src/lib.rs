//! Real-time audio/transcript/clinical-data synchronization engine.
//!
//! Receives an interleaved stream of transcript events, audio chunks and
//! clinical-state snapshots and renders them to the UI in strict,
//! audio-paced order, whatever order they arrive in.

pub mod callbacks;
pub mod correlation;
pub mod display;
pub mod engine;
pub mod service;
pub mod turns;

pub use callbacks::{RecordingSink, UiEvent, UiSink};
pub use correlation::CorrelationStore;
pub use display::{DisplayScheduler, ReadyTranscript};
pub use engine::{ParseFailure, SyncEngine};
pub use service::SyncService;
pub use turns::TurnCoordinator;
