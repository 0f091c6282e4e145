use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use wardsim_audio::{AudioSink, DeviceSink, NullSink, PlaybackClock, PlaybackNode};
use wardsim_core::{
    checklist_from_questions, confidence_score, ConnectionStatus, DiagnosisEntry, Highlight,
    QuestionEntry, Speaker, StartCommand, TurnSignal,
};
use wardsim_sync::{SyncEngine, SyncService, UiSink};

#[derive(Parser)]
#[command(
    name = "wardsim",
    about = "Clinical-training sync engine: replays a backend event stream with audio-paced display"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Newline-delimited JSON event file to replay (defaults to stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,
}

/// Stand-in for the presentation layer: renders callbacks to the console.
struct ConsoleSink;

impl UiSink for ConsoleSink {
    fn on_transcript(&self, speaker: Speaker, text: &str, highlights: &[Highlight]) {
        let tag = match speaker {
            Speaker::Nurse => "NURSE",
            Speaker::Patient => "PATIENT",
        };
        println!("[{tag}] {text}");
        for highlight in highlights {
            println!("        ~ {:?}: {}", highlight.level, highlight.text);
        }
    }

    fn on_system(&self, message: &str) {
        println!("* {message}");
    }

    fn on_diagnoses(&self, diagnoses: &[DiagnosisEntry]) {
        for entry in diagnoses {
            println!(
                "  dx #{} {}: {} finding(s), confidence {}%",
                entry.rank,
                entry.label,
                entry.supporting_count,
                confidence_score(entry.supporting_count)
            );
        }
    }

    fn on_questions(&self, questions: &[QuestionEntry]) {
        for item in checklist_from_questions(questions) {
            let mark = if item.completed { "x" } else { " " };
            println!("  [{mark}] {}", item.text);
        }
    }

    fn on_turn_cycle(&self, signal: TurnSignal) {
        tracing::info!(?signal, "turn cycle");
    }

    fn on_status(&self, status: ConnectionStatus) {
        tracing::info!(?status, "connection status");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = if cli.config.exists() {
        wardsim_core::AppConfig::load_from_file(&cli.config)
            .with_context(|| format!("failed to load config from {:?}", cli.config))?
    } else {
        wardsim_core::AppConfig::default()
    };

    let env_filter =
        EnvFilter::try_new(&config.general.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("wardsim starting");

    // Keeps the cpal stream alive for the whole run; the engine only holds
    // the Send half (producer + clock).
    let mut playback_node: Option<PlaybackNode> = None;
    let mut playback_clock: Option<PlaybackClock> = None;

    let sink: Box<dyn AudioSink> = if config.audio.enabled {
        match open_device_sink(&config.audio) {
            Ok((node, sink, clock)) => {
                playback_node = Some(node);
                playback_clock = Some(clock);
                Box::new(sink)
            }
            Err(e) => {
                tracing::warn!("audio unavailable, continuing without playback: {e}");
                Box::new(NullSink::new())
            }
        }
    } else {
        tracing::info!("audio disabled by config");
        Box::new(NullSink::new())
    };

    let engine = SyncEngine::new(sink, Arc::new(ConsoleSink), &config.sync);
    let mut service = SyncService::spawn(engine);

    // The transport itself is the caller's concern; replaying a captured
    // stream stands in for it here.
    service.set_status(ConnectionStatus::Connecting);
    let start = StartCommand::new(
        config.session.patient_id.as_str(),
        config.session.gender.as_str(),
    );
    tracing::info!(
        command = %start.to_json().context("failed to serialize start command")?,
        "would send start command"
    );
    service.set_status(ConnectionStatus::Connected);

    match &cli.input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open input file {path:?}"))?;
            feed_lines(&service, BufReader::new(file)).await?;
        }
        None => {
            feed_lines(&service, BufReader::new(tokio::io::stdin())).await?;
        }
    }

    // Let trailing audio, grace timeouts and turn releases play out.
    tokio::time::sleep(std::time::Duration::from_secs(3)).await;

    if playback_clock.as_ref().is_some_and(|c| !c.is_healthy()) {
        tracing::warn!("output stream reported errors during playback, timings may have drifted");
    }

    service.set_status(ConnectionStatus::Disconnected);
    service.shutdown().await;
    drop(playback_node);
    tracing::info!("wardsim exiting");
    Ok(())
}

fn open_device_sink(
    audio: &wardsim_core::AudioConfig,
) -> Result<(PlaybackNode, DeviceSink, PlaybackClock), wardsim_core::AudioError> {
    let device = wardsim_audio::open_output_device(&audio.device_name)?;
    tracing::info!("using output device: {}", audio.device_name);

    let ring_capacity = audio.sample_rate as usize * audio.queue_secs as usize;
    let (producer, consumer) = wardsim_audio::create_ring_buffer(ring_capacity);
    let (node, clock) = PlaybackNode::new(&device, consumer, audio.sample_rate, audio.buffer_size)?;
    let sink = DeviceSink::new(producer, clock.clone(), audio.sample_rate);
    Ok((node, sink, clock))
}

async fn feed_lines<R>(service: &SyncService, reader: BufReader<R>) -> Result<()>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await.context("failed to read input")? {
        if line.trim().is_empty() {
            continue;
        }
        service.feed(line);
    }
    Ok(())
}
