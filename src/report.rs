//! # Reporting Module
//!
//! Questo modulo gestisce le notifiche verso l'utente e l'output strutturato.
//!
//! ## Responsabilità:
//! - Traduce ogni `JobOutcome` nella notifica prevista (o nessuna)
//! - Definisce gli eventi del batch (`BatchEvent`) serializzabili in JSON
//! - Definisce il trait `ReportSink` e le implementazioni disponibili
//!
//! ## Notifiche per file:
//! - successo: nessun messaggio
//! - warning: "Skipping {filename}: Input file not found."
//! - warning: "Skipping {filename}: Unsupported image format."
//! - warning: "Could not compress {filename} to target size."
//! - error: "Unexpected error compressing {filename}: {details}"
//! - a fine batch, sempre: info "Image compression completed successfully."
//!
//! ## Sink disponibili:
//! - `LogSink`: Log via `tracing`
//! - `JsonSink`: Una riga JSON per evento su stdout (per GUI/processi esterni)
//! - `MemorySink`: Raccoglie gli eventi in memoria (embedding e test)

use crate::compressor::JobOutcome;
use crate::progress::BatchStats;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{error, info, warn};

pub const COMPLETION_MESSAGE: &str = "Image compression completed successfully.";

/// Severity of a user-facing notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// One user-facing message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn warning(message: String) -> Self {
        Self {
            level: NoticeLevel::Warning,
            title: "Warning".to_string(),
            message,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: "Error".to_string(),
            message,
        }
    }

    /// Final notice, emitted once per batch whatever happened to the files
    pub fn completed() -> Self {
        Self {
            level: NoticeLevel::Info,
            title: "Compression Complete".to_string(),
            message: COMPLETION_MESSAGE.to_string(),
        }
    }

    /// Notice for a per-file outcome; successes produce none
    pub fn for_outcome(filename: &str, outcome: &JobOutcome) -> Option<Self> {
        match outcome {
            JobOutcome::Success { .. } => None,
            JobOutcome::SkippedMissing => Some(Self::warning(format!(
                "Skipping {}: Input file not found.",
                filename
            ))),
            JobOutcome::SkippedUnsupported => Some(Self::warning(format!(
                "Skipping {}: Unsupported image format.",
                filename
            ))),
            JobOutcome::SizeNotReached { .. } => Some(Self::warning(format!(
                "Could not compress {} to target size.",
                filename
            ))),
            JobOutcome::UnexpectedError { message } => Some(Self::error(format!(
                "Unexpected error compressing {}: {}",
                filename, message
            ))),
        }
    }
}

/// Events emitted while a batch runs
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BatchEvent {
    /// Batch accepted, entries listed
    Start {
        input_dir: PathBuf,
        output_dir: PathBuf,
        total_files: usize,
        target_bytes: u64,
        workers: usize,
    },
    /// One file finished
    FileComplete {
        filename: String,
        input_size: Option<u64>,
        #[serde(flatten)]
        outcome: JobOutcome,
    },
    /// A user-facing notice
    Notice(Notice),
    /// Batch finished
    Complete {
        #[serde(flatten)]
        stats: BatchStats,
        duration_seconds: f64,
    },
}

/// Receives batch events
pub trait ReportSink: Send + Sync {
    fn emit(&self, event: &BatchEvent);
}

/// Logs events through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ReportSink for LogSink {
    fn emit(&self, event: &BatchEvent) {
        match event {
            BatchEvent::Start {
                input_dir,
                output_dir,
                total_files,
                target_bytes,
                workers,
            } => {
                info!(
                    "🎯 Compressing {} entries from {} into {} (target: {} bytes, workers: {})",
                    total_files,
                    input_dir.display(),
                    output_dir.display(),
                    target_bytes,
                    workers
                );
            }
            BatchEvent::FileComplete { filename, outcome, .. } => {
                if let JobOutcome::Success {
                    quality, output_size, ..
                } = outcome
                {
                    info!("✅ {}: quality {}, {} bytes", filename, quality, output_size);
                }
            }
            BatchEvent::Notice(notice) => match notice.level {
                NoticeLevel::Info => info!("{}: {}", notice.title, notice.message),
                NoticeLevel::Warning => warn!("{}: {}", notice.title, notice.message),
                NoticeLevel::Error => error!("{}: {}", notice.title, notice.message),
            },
            BatchEvent::Complete {
                stats,
                duration_seconds,
            } => {
                info!("📊 {} in {:.2}s", stats.format_summary(), duration_seconds);
            }
        }
    }
}

/// Prints one JSON object per event on stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSink;

impl ReportSink for JsonSink {
    fn emit(&self, event: &BatchEvent) {
        if let Ok(json) = serde_json::to_string(event) {
            println!("{}", json);
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<BatchEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<BatchEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                BatchEvent::Notice(notice) => Some(notice),
                _ => None,
            })
            .collect()
    }
}

impl ReportSink for MemorySink {
    fn emit(&self, event: &BatchEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
