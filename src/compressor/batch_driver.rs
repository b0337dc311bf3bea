//! # Batch Driver Module
//!
//! Orchestratore del batch: elenca la cartella di input, costruisce un job
//! per ogni entry ed esegue la quality search.
//!
//! ## Flusso di esecuzione:
//! 1. **Validazione**: Config valida, cartella di input esistente
//! 2. **Output folder**: Creata con i parent se manca (errore fatale)
//! 3. **Discovery**: Entry della cartella di input in ordine del file system
//! 4. **Processing**: Un tentativo per file, nessun retry
//! 5. **Reporting**: Notifica per file problematico + notifica finale
//!
//! ## Gestione concorrenza:
//! - Semaforo con `workers` permessi (default 1 = strettamente sequenziale)
//! - La search gira su `spawn_blocking`: decode/encode sono CPU bound
//! - Esiti e notifiche seguono sempre l'ordine di listing e arrivano al sink
//!   appena il file in testa alla coda termina
//! - Un task andato in panic diventa `UnexpectedError` per quel file
//!
//! ## Error handling:
//! - Gli esiti per-file non interrompono mai il batch
//! - Solo config non valida, cartella di input illeggibile o cartella di
//!   output non creabile fanno fallire `run`, prima di toccare qualsiasi file

use crate::{
    codec::{ImageCodec, ImageCrateCodec},
    compressor::{
        path_resolver::PathResolver,
        quality_search::{CompressionJob, JobOutcome, QualitySearch},
    },
    config::Config,
    file_manager::FileManager,
    progress::{BatchStats, ProgressManager},
    report::{BatchEvent, Notice, ReportSink},
};
use anyhow::Result;
use serde::Serialize;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info};

/// Outcome of one directory entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub filename: String,
    pub input_size: Option<u64>,
    pub outcome: JobOutcome,
}

/// Everything a batch produced, in listing order
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
    pub stats: BatchStats,
}

impl BatchReport {
    /// Outcome recorded for `filename`, if it was part of the batch
    pub fn outcome_for(&self, filename: &str) -> Option<&JobOutcome> {
        self.outcomes
            .iter()
            .find(|file| file.filename == filename)
            .map(|file| &file.outcome)
    }
}

/// Main batch orchestrator
pub struct BatchDriver<C> {
    codec: C,
}

impl<C: ImageCodec + Clone> BatchDriver<C> {
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    /// Run the batch described by `config`, reporting to `sink`
    pub async fn run(&self, config: &Config, sink: &dyn ReportSink) -> Result<BatchReport> {
        let started = Instant::now();

        config.validate()?;
        let target_bytes = config.target_bytes();

        PathResolver::ensure_output_folder(&config.output_folder).await?;

        let entries = FileManager::list_entries(&config.input_folder)?;
        info!(
            "Found {} entries in {}",
            entries.len(),
            config.input_folder.display()
        );

        sink.emit(&BatchEvent::Start {
            input_dir: config.input_folder.clone(),
            output_dir: config.output_folder.clone(),
            total_files: entries.len(),
            target_bytes,
            workers: config.workers,
        });

        let progress = ProgressManager::new(entries.len() as u64, config.show_progress);
        let search = Arc::new(QualitySearch::new(self.codec.clone(), config.search)?);
        let semaphore = Arc::new(Semaphore::new(config.workers));
        let mut pending: VecDeque<(String, JoinHandle<FileOutcome>)> = VecDeque::new();
        let mut report = BatchReport::default();

        for input_path in entries {
            // Esiti già pronti in testa: riportati subito, in ordine di listing
            while pending.front().map_or(false, |(_, task)| task.is_finished()) {
                if let Some((filename, task)) = pending.pop_front() {
                    collect_outcome(&mut report, join_outcome(filename, task.await), sink);
                }
            }
            // Finestra piena: attende il file in testa prima di avviarne un altro
            if pending.len() >= config.workers {
                if let Some((filename, task)) = pending.pop_front() {
                    collect_outcome(&mut report, join_outcome(filename, task.await), sink);
                }
            }

            let permit = semaphore.clone().acquire_owned().await?;
            let search = Arc::clone(&search);
            let progress = progress.clone();
            let output_folder = config.output_folder.clone();
            let filename = PathResolver::display_name(&input_path);
            let task_filename = filename.clone();

            let task = tokio::spawn(async move {
                let _permit = permit; // Keep permit alive
                process_entry(search, task_filename, input_path, output_folder, target_bytes, progress)
                    .await
            });
            pending.push_back((filename, task));
        }

        while let Some((filename, task)) = pending.pop_front() {
            collect_outcome(&mut report, join_outcome(filename, task.await), sink);
        }

        progress.finish(&report.stats.format_summary());

        sink.emit(&BatchEvent::Notice(Notice::completed()));
        sink.emit(&BatchEvent::Complete {
            stats: report.stats.clone(),
            duration_seconds: started.elapsed().as_secs_f64(),
        });

        Ok(report)
    }
}

/// Record one finished file and forward its events to the sink
fn collect_outcome(report: &mut BatchReport, file: FileOutcome, sink: &dyn ReportSink) {
    report.stats.record(&file.outcome, file.input_size);
    sink.emit(&BatchEvent::FileComplete {
        filename: file.filename.clone(),
        input_size: file.input_size,
        outcome: file.outcome.clone(),
    });
    if let Some(notice) = Notice::for_outcome(&file.filename, &file.outcome) {
        sink.emit(&BatchEvent::Notice(notice));
    }

    report.outcomes.push(file);
}

/// A task that died without an outcome is reported like any other per-file failure
fn join_outcome(filename: String, joined: Result<FileOutcome, JoinError>) -> FileOutcome {
    joined.unwrap_or_else(|e| FileOutcome {
        filename,
        input_size: None,
        outcome: JobOutcome::UnexpectedError {
            message: format!("compression worker failed: {}", e),
        },
    })
}

/// Compress one entry; every failure ends up inside the returned outcome
async fn process_entry<C: ImageCodec>(
    search: Arc<QualitySearch<C>>,
    filename: String,
    input_path: PathBuf,
    output_folder: PathBuf,
    target_bytes: u64,
    progress: ProgressManager,
) -> FileOutcome {
    let input_size = FileManager::file_size(&input_path).await.ok();

    let outcome = match PathResolver::get_output_path(&input_path, &output_folder) {
        Ok(output_path) => {
            let job = CompressionJob::new(input_path, output_path, target_bytes);
            debug!("Compressing {} -> {}", job.input_path.display(), job.output_path.display());

            tokio::task::spawn_blocking(move || search.search(&job))
                .await
                .unwrap_or_else(|e| JobOutcome::UnexpectedError {
                    message: format!("compression worker failed: {}", e),
                })
        }
        Err(e) => e.into(),
    };

    let tag = match &outcome {
        JobOutcome::Success { .. } => "[OK]",
        JobOutcome::SkippedMissing | JobOutcome::SkippedUnsupported => "[SKIP]",
        JobOutcome::SizeNotReached { .. } => "[WARN]",
        JobOutcome::UnexpectedError { .. } => "[ERROR]",
    };
    progress.update(&format!("{} {}: {}", tag, filename, outcome.label()));

    FileOutcome {
        filename,
        input_size,
        outcome,
    }
}

/// Run a batch with the `image`-backed codec
pub async fn run_batch(config: &Config, sink: &dyn ReportSink) -> Result<BatchReport> {
    BatchDriver::new(ImageCrateCodec::new()).run(config, sink).await
}
