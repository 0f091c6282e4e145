use crate::engine::SyncEngine;
use std::time::Duration;
use tokio::sync::mpsc;
use wardsim_core::ConnectionStatus;

#[derive(Debug)]
enum Command {
    Event(String),
    Status(ConnectionStatus),
    Reset,
    Shutdown,
}

/// Drives a `SyncEngine` on a single tokio task: one inbox for inbound
/// frames and control messages, and an event-driven timer that sleeps
/// exactly until the engine's next deadline (display release, grace
/// timeout or turn release) instead of polling on a fixed interval.
///
/// Because the task is the only mutator, every handler and poll runs
/// atomically with respect to the engine's state.
pub struct SyncService {
    tx: mpsc::UnboundedSender<Command>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl SyncService {
    pub fn spawn(mut engine: SyncEngine) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(async move {
            loop {
                engine.poll();
                tokio::select! {
                    cmd = rx.recv() => match cmd {
                        Some(Command::Event(raw)) => engine.handle_raw(&raw),
                        Some(Command::Status(status)) => engine.set_status(status),
                        Some(Command::Reset) => engine.reset(),
                        Some(Command::Shutdown) | None => break,
                    },
                    _ = wake_after(engine.next_wake()) => {}
                }
            }
            tracing::debug!("sync service task exiting");
        });

        Self {
            tx,
            task: Some(task),
        }
    }

    /// Hand one raw inbound frame to the engine.
    pub fn feed(&self, raw: impl Into<String>) {
        let _ = self.tx.send(Command::Event(raw.into()));
    }

    pub fn set_status(&self, status: ConnectionStatus) {
        let _ = self.tx.send(Command::Status(status));
    }

    /// Clear all synchronization state for a new session.
    pub fn reset(&self) {
        let _ = self.tx.send(Command::Reset);
    }

    /// Stop the driver task. Safe to call more than once.
    pub async fn shutdown(&mut self) {
        let _ = self.tx.send(Command::Shutdown);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

async fn wake_after(duration: Option<Duration>) {
    match duration {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending().await,
    }
}
