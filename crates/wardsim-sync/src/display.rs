use crate::callbacks::UiSink;
use std::collections::VecDeque;
use wardsim_core::{Highlight, Speaker};

/// A transcript whose audio pairing has been resolved, ready to queue.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadyTranscript {
    pub speaker: Speaker,
    pub text: String,
    pub highlights: Vec<Highlight>,
}

#[derive(Debug, Clone)]
struct ScheduledItem {
    transcript: ReadyTranscript,
    show_at: f64,
}

/// Time-gated FIFO queue of (transcript, show-at) pairs. Items are emitted
/// strictly in insertion order: only the front is ever tested against the
/// clock, so a timing anomaly on a later item can never reorder display.
#[derive(Debug, Default)]
pub struct DisplayScheduler {
    queue: VecDeque<ScheduledItem>,
}

impl DisplayScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a transcript for display once the audio clock reaches
    /// `show_at`. If the same transcript (by exact text) is already queued,
    /// its show-at time is revised in place, since later audio chunks extend an
    /// utterance's known end time.
    pub fn enqueue(&mut self, transcript: ReadyTranscript, show_at: f64) {
        if let Some(existing) = self
            .queue
            .iter_mut()
            .find(|item| item.transcript.text == transcript.text)
        {
            tracing::debug!(show_at, "revised show-at time for queued transcript");
            existing.show_at = show_at;
            existing.transcript = transcript;
        } else {
            tracing::debug!(show_at, "queued transcript for display");
            self.queue.push_back(ScheduledItem {
                transcript,
                show_at,
            });
        }
    }

    /// Emit every due item from the front of the queue. Returns the texts
    /// released, in release order.
    pub fn release_due(&mut self, now: f64, ui: &dyn UiSink) -> Vec<String> {
        let mut released = Vec::new();
        while self
            .queue
            .front()
            .is_some_and(|front| front.show_at <= now)
        {
            if let Some(item) = self.queue.pop_front() {
                tracing::debug!(now, scheduled_for = item.show_at, "displaying transcript");
                ui.on_transcript(
                    item.transcript.speaker,
                    &item.transcript.text,
                    &item.transcript.highlights,
                );
                released.push(item.transcript.text);
            }
        }
        released
    }

    /// Audio-clock instant of the next release, if anything is queued.
    pub fn next_deadline(&self) -> Option<f64> {
        self.queue.front().map(|item| item.show_at)
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
