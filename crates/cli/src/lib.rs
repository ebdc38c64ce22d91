//! SmartDrive Fusion CLI
//!
//! Replays recorded producer output through the fusion engine. Each
//! channel gets its own task, mirroring the live vision, bus, and
//! driver-monitor producers.

use anyhow::Context;
use clap::{Parser, Subcommand};
use event_fusion::{
    BusSample, FatigueSample, FusionEngine, FusionSettings, Sensor, SnapshotFormat, VisionSample,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Parser)]
#[command(name = "smartdrive-fusion", version, about = "Sensor fusion and risk assessment")]
pub struct Cli {
    /// Settings file (TOML, YAML, or JSON); FUSION_* variables override it
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, default_value = "info")]
    pub log_level: Level,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Replay a JSON-lines recording and print the resulting assessment
    Replay {
        /// Recording with one tagged record per line
        input: PathBuf,

        /// Write a snapshot of histories, weights, and thresholds
        #[arg(long)]
        export: Option<PathBuf>,

        /// Snapshot format, overriding the configured one
        #[arg(long)]
        format: Option<SnapshotFormat>,

        /// Write the final assessment to a file
        #[arg(long)]
        save_assessment: Option<PathBuf>,

        /// Serve Prometheus metrics on this address while replaying
        #[arg(long)]
        metrics_addr: Option<SocketAddr>,
    },

    /// Print the effective settings
    ShowConfig,
}

/// One line of a recording
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "channel", rename_all = "lowercase")]
pub enum Record {
    Vision(VisionSample),
    Obd(BusSample),
    Fatigue(FatigueSample),
    /// Per-sensor confidence for weight re-normalization. Replay applies
    /// every confidence record, in file order, before any sample is
    /// ingested, so placement within the recording has no effect.
    Confidence(HashMap<Sensor, f64>),
}

/// Recording split by channel, arrival order kept within each channel
#[derive(Debug, Default)]
pub struct Recording {
    pub vision: Vec<VisionSample>,
    pub obd: Vec<BusSample>,
    pub fatigue: Vec<FatigueSample>,
    pub confidence: Vec<HashMap<Sensor, f64>>,
}

/// Initialize logging to stderr
pub fn init_logging(level: Level, json: bool) -> anyhow::Result<()> {
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    let installed = if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    installed.context("Failed to set tracing subscriber")
}

/// Parse a JSON-lines recording; blank lines and `#` comments are skipped
pub fn parse_recording(text: &str) -> anyhow::Result<Recording> {
    let mut recording = Recording::default();

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let record: Record = serde_json::from_str(line)
            .with_context(|| format!("line {}: malformed record", index + 1))?;
        match record {
            Record::Vision(sample) => recording.vision.push(sample),
            Record::Obd(sample) => recording.obd.push(sample),
            Record::Fatigue(sample) => recording.fatigue.push(sample),
            Record::Confidence(confidence) => recording.confidence.push(confidence),
        }
    }

    Ok(recording)
}

/// Feed a recording into the engine with one task per channel.
///
/// Confidence records are applied before the producers start. Invalid
/// samples are logged and skipped. Returns the number of rejected samples.
pub async fn replay(engine: Arc<FusionEngine>, recording: Recording) -> anyhow::Result<usize> {
    for confidence in &recording.confidence {
        engine.adjust_weights(confidence);
    }

    let vision = spawn_producer(engine.clone(), recording.vision, |e, s| e.ingest_vision(s));
    let obd = spawn_producer(engine.clone(), recording.obd, |e, s| e.ingest_obd(s));
    let fatigue = spawn_producer(engine, recording.fatigue, |e, s| e.ingest_fatigue(s));

    let mut rejected = 0;
    for handle in [vision, obd, fatigue] {
        rejected += handle.await.context("producer task panicked")?;
    }
    Ok(rejected)
}

fn spawn_producer<T, F>(
    engine: Arc<FusionEngine>,
    samples: Vec<T>,
    ingest: F,
) -> tokio::task::JoinHandle<usize>
where
    T: Send + 'static,
    F: Fn(&FusionEngine, T) -> Result<(), event_fusion::FusionError> + Send + 'static,
{
    tokio::spawn(async move {
        let mut rejected = 0;
        for sample in samples {
            if let Err(e) = ingest(engine.as_ref(), sample) {
                warn!("Skipping sample: {}", e);
                rejected += 1;
            }
            tokio::task::yield_now().await;
        }
        rejected
    })
}

/// Execute a parsed command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut settings = FusionSettings::load(cli.config.as_deref())?;

    match cli.command {
        Command::ShowConfig => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        Command::Replay {
            input,
            export,
            format,
            save_assessment,
            metrics_addr,
        } => {
            if let Some(addr) = metrics_addr {
                metrics_exporter_prometheus::PrometheusBuilder::new()
                    .with_http_listener(addr)
                    .install()
                    .context("Failed to install Prometheus exporter")?;
                event_fusion::describe_metrics();
                info!("Serving metrics on {}", addr);
            }
            if let Some(format) = format {
                settings.export.format = format;
            }

            let engine = Arc::new(FusionEngine::new(&settings)?);
            let recording = read_recording(&input)?;
            info!(
                "Replaying {} vision, {} obd, {} fatigue samples",
                recording.vision.len(),
                recording.obd.len(),
                recording.fatigue.len()
            );

            let rejected = replay(engine.clone(), recording).await?;
            if rejected > 0 {
                warn!("{} sample(s) rejected", rejected);
            }

            let assessment = engine.generate_assessment();
            info!("Summary: {:?}", engine.summary());
            println!("{}", serde_json::to_string_pretty(&assessment)?);

            if let Some(path) = save_assessment {
                engine.save_assessment(&assessment, &path)?;
            }
            if let Some(path) = export {
                engine.export_snapshot(&path)?;
            }
        }
    }

    Ok(())
}

fn read_recording(path: &Path) -> anyhow::Result<Recording> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_recording(&text)
}
