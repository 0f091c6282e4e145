use std::collections::HashMap;
use wardsim_audio::ChunkTiming;

/// Matches audio timing to transcripts that share a correlation id,
/// independent of arrival order. Only holds spans for audio that arrived
/// before its transcript; an entry is consumed by the first transcript
/// that claims it.
#[derive(Debug, Default)]
pub struct CorrelationStore {
    spans: HashMap<String, ChunkTiming>,
}

impl CorrelationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a chunk's timing under `id`. A first chunk creates the span;
    /// later chunks only extend its end, the start stays fixed.
    pub fn record_timing(&mut self, id: &str, timing: ChunkTiming) {
        match self.spans.get_mut(id) {
            Some(span) => {
                span.end = timing.end;
                tracing::debug!(id, end = timing.end, "extended correlated audio span");
            }
            None => {
                self.spans.insert(id.to_string(), timing);
                tracing::debug!(id, start = timing.start, end = timing.end, "recorded audio before transcript");
            }
        }
    }

    /// Return and remove the span for `id`, if one exists.
    pub fn take_timing(&mut self, id: &str) -> Option<ChunkTiming> {
        self.spans.remove(id)
    }

    pub fn clear(&mut self) {
        self.spans.clear();
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}
