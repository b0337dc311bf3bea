//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce il progress tracking e le statistiche del batch.
//!
//! ## Responsabilità:
//! - Progress bar visual con `indicatif` per feedback real-time
//! - Tracking statistiche per esito (compressi, saltati, oltre target, errori)
//! - Calcolo byte risparmiati e percentuale di riduzione
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:00:12] [========================>---------------] 15/24 (62%) [OK] photo.jpg: compressed
//! ```
//!
//! ## Esempio:
//! ```ignore
//! let progress = ProgressManager::new(total_files, true);
//! let mut stats = BatchStats::new();
//!
//! stats.record(&outcome, Some(input_size));
//! progress.update("[OK] photo.jpg");
//!
//! progress.finish(&stats.format_summary());
//! ```

use crate::compressor::JobOutcome;
use crate::file_manager::FileManager;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::time::Duration;

/// Manages progress reporting for a compression batch
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager; a hidden bar when `visible` is false
    pub fn new(total_files: u64, visible: bool) -> Self {
        if !visible {
            return Self {
                bar: ProgressBar::hidden(),
            };
        }

        let bar = ProgressBar::new(total_files);

        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update progress with a message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

/// Statistics tracker for batch results
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub files_processed: usize,
    pub files_compressed: usize,
    pub files_missing: usize,
    pub files_unsupported: usize,
    pub files_size_not_reached: usize,
    pub errors: usize,
    /// Input bytes of files that produced an output
    pub total_input_size: u64,
    /// Bytes written to the output folder
    pub total_output_size: u64,
}

impl BatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: &JobOutcome, input_size: Option<u64>) {
        self.files_processed += 1;

        match outcome {
            JobOutcome::Success { .. } => self.files_compressed += 1,
            JobOutcome::SkippedMissing => self.files_missing += 1,
            JobOutcome::SkippedUnsupported => self.files_unsupported += 1,
            JobOutcome::SizeNotReached { .. } => self.files_size_not_reached += 1,
            JobOutcome::UnexpectedError { .. } => self.errors += 1,
        }

        if let Some(output_size) = outcome.output_size() {
            self.total_output_size += output_size;
            self.total_input_size += input_size.unwrap_or(0);
        }
    }

    pub fn files_skipped(&self) -> usize {
        self.files_missing + self.files_unsupported
    }

    pub fn total_bytes_saved(&self) -> u64 {
        self.total_input_size.saturating_sub(self.total_output_size)
    }

    pub fn overall_reduction_percent(&self) -> f64 {
        FileManager::calculate_reduction(self.total_input_size, self.total_output_size)
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Processed: {} files | Compressed: {} | Over target: {} | Skipped: {} | Errors: {} | Total saved: {} ({:.2}%)",
            self.files_processed,
            self.files_compressed,
            self.files_size_not_reached,
            self.files_skipped(),
            self.errors,
            FileManager::format_size(self.total_bytes_saved()),
            self.overall_reduction_percent()
        )
    }
}
