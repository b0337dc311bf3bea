//! # Quality Search Module
//!
//! Algoritmo per-file: ri-codifica l'immagine a qualità decrescente finché
//! il file di output non rientra nella dimensione target o finché non si
//! esaurisce il budget di iterazioni.
//!
//! ## Flusso:
//! 1. Decode della sorgente (mancante → `SkippedMissing`, non decodificabile
//!    → `SkippedUnsupported`), nessuna scrittura in questi casi
//! 2. Encode a qualità 85, 80, 75, ... sul path di output
//! 3. Stop appena `size <= target_bytes` → `Success`
//! 4. Budget esaurito → `SizeNotReached`, l'ultimo file resta su disco
//!
//! Qualsiasi altro errore diventa `UnexpectedError` con il messaggio.

use crate::{
    codec::ImageCodec,
    config::SearchPolicy,
    error::CompressError,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One file to compress
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionJob {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub target_bytes: u64,
}

impl CompressionJob {
    pub fn new(input_path: PathBuf, output_path: PathBuf, target_bytes: u64) -> Self {
        Self {
            input_path,
            output_path,
            target_bytes,
        }
    }
}

/// Mutable state of a single search call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchState {
    pub quality: u8,
    pub iterations_remaining: u32,
}

impl SearchState {
    pub fn new(policy: &SearchPolicy) -> Self {
        Self {
            quality: policy.start_quality,
            iterations_remaining: policy.max_iterations,
        }
    }

    /// Consume one iteration; the quality only moves when another attempt follows
    fn advance(&mut self, step: u8) {
        self.iterations_remaining = self.iterations_remaining.saturating_sub(1);
        if self.iterations_remaining > 0 {
            self.quality = self.quality.saturating_sub(step);
        }
    }
}

/// Result of compressing one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcome {
    /// Output fits the target
    Success {
        quality: u8,
        attempts: u32,
        output_size: u64,
    },
    /// Input vanished before it could be opened
    SkippedMissing,
    /// Input bytes are not a decodable image
    SkippedUnsupported,
    /// Budget exhausted; the last attempt is left on disk
    SizeNotReached {
        quality: u8,
        attempts: u32,
        output_size: u64,
    },
    UnexpectedError { message: String },
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Success { .. })
    }

    /// Size of the file left at the output path, when one was written
    pub fn output_size(&self) -> Option<u64> {
        match self {
            JobOutcome::Success { output_size, .. } | JobOutcome::SizeNotReached { output_size, .. } => {
                Some(*output_size)
            }
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            JobOutcome::Success { .. } => "compressed",
            JobOutcome::SkippedMissing => "missing",
            JobOutcome::SkippedUnsupported => "unsupported",
            JobOutcome::SizeNotReached { .. } => "size not reached",
            JobOutcome::UnexpectedError { .. } => "error",
        }
    }
}

impl From<CompressError> for JobOutcome {
    fn from(err: CompressError) -> Self {
        match err {
            CompressError::MissingInput(_) => JobOutcome::SkippedMissing,
            CompressError::UnsupportedFormat(_) => JobOutcome::SkippedUnsupported,
            other => JobOutcome::UnexpectedError {
                message: other.to_string(),
            },
        }
    }
}

/// Runs the decreasing-quality search for single files
#[derive(Debug, Clone)]
pub struct QualitySearch<C> {
    codec: C,
    policy: SearchPolicy,
}

impl<C: ImageCodec> QualitySearch<C> {
    /// Build a search, rejecting policies that would leave the [5, 100] quality range
    pub fn new(codec: C, policy: SearchPolicy) -> Result<Self, CompressError> {
        policy
            .validate()
            .map_err(|e| CompressError::Config(e.to_string()))?;
        Ok(Self { codec, policy })
    }

    pub fn policy(&self) -> &SearchPolicy {
        &self.policy
    }

    /// Compress one file. Never fails: every error becomes a `JobOutcome`.
    pub fn search(&self, job: &CompressionJob) -> JobOutcome {
        match self.try_search(job) {
            Ok(outcome) => outcome,
            Err(err) => {
                debug!("Search for {} ended early: {}", job.input_path.display(), err);
                err.into()
            }
        }
    }

    fn try_search(&self, job: &CompressionJob) -> Result<JobOutcome, CompressError> {
        // L'immagine decodificata vive solo dentro questa chiamata
        let image = self.codec.decode(&job.input_path)?;

        let mut state = SearchState::new(&self.policy);
        let mut attempts = 0u32;
        let mut last_quality = state.quality;
        let mut last_size = 0u64;
        let mut reached = false;

        while state.iterations_remaining > 0 {
            self.codec.encode(&image, &job.output_path, state.quality)?;
            let size = output_size(&job.output_path)?;

            attempts += 1;
            last_quality = state.quality;
            last_size = size;

            debug!(
                "{}: attempt {} at quality {} -> {} bytes (target {})",
                job.input_path.display(),
                attempts,
                state.quality,
                size,
                job.target_bytes
            );

            if size <= job.target_bytes {
                reached = true;
                break;
            }
            state.advance(self.policy.quality_step);
        }

        let outcome = if reached {
            JobOutcome::Success {
                quality: last_quality,
                attempts,
                output_size: last_size,
            }
        } else {
            JobOutcome::SizeNotReached {
                quality: last_quality,
                attempts,
                output_size: last_size,
            }
        };

        Ok(outcome)
    }
}

fn output_size(path: &Path) -> Result<u64, CompressError> {
    Ok(std::fs::metadata(path)?.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ImageCrateCodec;
    use image::{Rgb, RgbImage};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Codec writing `quality * bytes_per_quality` zero bytes, recording each quality
    struct RecordingCodec {
        bytes_per_quality: usize,
        qualities: Mutex<Vec<u8>>,
    }

    impl RecordingCodec {
        fn new(bytes_per_quality: usize) -> Self {
            Self {
                bytes_per_quality,
                qualities: Mutex::new(Vec::new()),
            }
        }

        fn qualities(&self) -> Vec<u8> {
            self.qualities.lock().unwrap().clone()
        }
    }

    impl ImageCodec for RecordingCodec {
        type Image = ();

        fn decode(&self, path: &Path) -> Result<(), CompressError> {
            if path.exists() {
                Ok(())
            } else {
                Err(CompressError::MissingInput(path.to_path_buf()))
            }
        }

        fn encode(&self, _image: &(), path: &Path, quality: u8) -> Result<(), CompressError> {
            self.qualities.lock().unwrap().push(quality);
            std::fs::write(path, vec![0u8; quality as usize * self.bytes_per_quality])?;
            Ok(())
        }
    }

    fn job_in(dir: &TempDir, input: &str, output: &str, target_bytes: u64) -> CompressionJob {
        CompressionJob::new(dir.path().join(input), dir.path().join(output), target_bytes)
    }

    fn noisy_png(path: &Path, width: u32, height: u32) {
        // LCG noise: pessimo per JPEG, resta grande anche a bassa qualità
        let mut seed: u32 = 0x1234_5678;
        let image = RgbImage::from_fn(width, height, |_, _| {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let [a, b, c, _] = seed.to_le_bytes();
            Rgb([a, b, c])
        });
        image.save(path).unwrap();
    }

    #[test]
    fn test_quality_sequence_is_monotonic_and_bounded() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("in.jpg"), b"x").unwrap();
        let search = QualitySearch::new(RecordingCodec::new(1000), SearchPolicy::default()).unwrap();

        let outcome = search.search(&job_in(&dir, "in.jpg", "out.jpg", 1));

        assert_eq!(
            search.codec.qualities(),
            vec![85, 80, 75, 70, 65, 60, 55, 50, 45, 40]
        );
        assert_eq!(
            outcome,
            JobOutcome::SizeNotReached {
                quality: 40,
                attempts: 10,
                output_size: 40_000,
            }
        );
        assert!(dir.path().join("out.jpg").exists());
    }

    #[test]
    fn test_stops_at_first_fitting_quality() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("in.jpg"), b"x").unwrap();
        let search = QualitySearch::new(RecordingCodec::new(1000), SearchPolicy::default()).unwrap();

        // 60 * 1000 == target: il confronto è inclusivo
        let outcome = search.search(&job_in(&dir, "in.jpg", "out.jpg", 60_000));

        assert_eq!(search.codec.qualities(), vec![85, 80, 75, 70, 65, 60]);
        assert_eq!(
            outcome,
            JobOutcome::Success {
                quality: 60,
                attempts: 6,
                output_size: 60_000,
            }
        );
    }

    #[test]
    fn test_first_attempt_success() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("in.jpg"), b"x").unwrap();
        let search = QualitySearch::new(RecordingCodec::new(1), SearchPolicy::default()).unwrap();

        let outcome = search.search(&job_in(&dir, "in.jpg", "out.jpg", 1_048_576));

        assert_eq!(search.codec.qualities(), vec![85]);
        assert!(outcome.is_success());
    }

    #[test]
    fn test_custom_policy_is_honoured() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("in.jpg"), b"x").unwrap();
        let policy = SearchPolicy {
            start_quality: 90,
            quality_step: 10,
            max_iterations: 3,
        };
        let search = QualitySearch::new(RecordingCodec::new(1000), policy).unwrap();

        let outcome = search.search(&job_in(&dir, "in.jpg", "out.jpg", 0));

        assert_eq!(search.codec.qualities(), vec![90, 80, 70]);
        assert!(matches!(outcome, JobOutcome::SizeNotReached { attempts: 3, .. }));
    }

    #[test]
    fn test_lowest_valid_policy_stays_in_range() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("in.jpg"), b"x").unwrap();
        let policy = SearchPolicy {
            start_quality: 50,
            quality_step: 5,
            max_iterations: 10,
        };
        let search = QualitySearch::new(RecordingCodec::new(1000), policy).unwrap();

        let outcome = search.search(&job_in(&dir, "in.jpg", "out.jpg", 1));

        assert_eq!(
            search.codec.qualities(),
            vec![50, 45, 40, 35, 30, 25, 20, 15, 10, 5]
        );
        assert!(matches!(outcome, JobOutcome::SizeNotReached { quality: 5, .. }));
    }

    #[test]
    fn test_state_quality_never_drops_after_last_attempt() {
        let policy = SearchPolicy {
            start_quality: 50,
            quality_step: 5,
            max_iterations: 10,
        };
        let mut state = SearchState::new(&policy);
        for _ in 0..policy.max_iterations {
            state.advance(policy.quality_step);
        }

        assert_eq!(state.iterations_remaining, 0);
        assert_eq!(state.quality, 5);
    }

    #[test]
    fn test_out_of_range_policy_is_rejected() {
        let policy = SearchPolicy {
            start_quality: 30,
            quality_step: 5,
            max_iterations: 10,
        };
        let result = QualitySearch::new(RecordingCodec::new(1), policy);
        assert!(matches!(result, Err(CompressError::Config(_))));
    }

    #[test]
    fn test_missing_input_performs_no_write() {
        let dir = TempDir::new().unwrap();
        let search = QualitySearch::new(RecordingCodec::new(1000), SearchPolicy::default()).unwrap();

        let outcome = search.search(&job_in(&dir, "ghost.jpg", "out.jpg", 1));

        assert_eq!(outcome, JobOutcome::SkippedMissing);
        assert!(search.codec.qualities().is_empty());
        assert!(!dir.path().join("out.jpg").exists());
    }

    #[test]
    fn test_real_codec_missing_input() {
        let dir = TempDir::new().unwrap();
        let search = QualitySearch::new(ImageCrateCodec, SearchPolicy::default()).unwrap();

        let outcome = search.search(&job_in(&dir, "ghost.png", "out.png", 1));

        assert_eq!(outcome, JobOutcome::SkippedMissing);
        assert!(!dir.path().join("out.png").exists());
    }

    #[test]
    fn test_real_codec_text_file_is_unsupported() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("c.txt"), "hello, I am not an image").unwrap();
        let search = QualitySearch::new(ImageCrateCodec, SearchPolicy::default()).unwrap();

        let outcome = search.search(&job_in(&dir, "c.txt", "out.txt", 1_048_576));

        assert_eq!(outcome, JobOutcome::SkippedUnsupported);
        assert!(!dir.path().join("out.txt").exists());
    }

    #[test]
    fn test_real_codec_success_fits_target() {
        let dir = TempDir::new().unwrap();
        noisy_png(&dir.path().join("source.png"), 64, 64);
        // Sorgente PNG, output JPEG: il formato segue l'estensione di output
        let job = CompressionJob::new(
            dir.path().join("source.png"),
            dir.path().join("a.jpg"),
            1_048_576,
        );
        let search = QualitySearch::new(ImageCrateCodec, SearchPolicy::default()).unwrap();

        let outcome = search.search(&job);

        match outcome {
            JobOutcome::Success {
                quality,
                attempts,
                output_size,
            } => {
                assert_eq!(quality, 85);
                assert_eq!(attempts, 1);
                assert!(output_size <= job.target_bytes);
                assert_eq!(std::fs::metadata(&job.output_path).unwrap().len(), output_size);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_real_codec_lowers_quality_until_fit() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("noise.png");
        noisy_png(&source, 128, 128);

        let codec = ImageCrateCodec;
        let image = codec.decode(&source).unwrap();
        let reference = dir.path().join("reference.jpg");
        codec.encode(&image, &reference, 60).unwrap();
        let size_at_60 = std::fs::metadata(&reference).unwrap().len();

        let job = CompressionJob::new(source, dir.path().join("noise.jpg"), size_at_60);
        let outcome = QualitySearch::new(codec, SearchPolicy::default()).unwrap().search(&job);

        match outcome {
            JobOutcome::Success {
                quality,
                attempts,
                output_size,
            } => {
                assert!(quality <= 60, "quality {quality} should not exceed 60");
                assert!(attempts > 1);
                assert!(output_size <= size_at_60);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_real_codec_unreachable_target_keeps_last_file() {
        let dir = TempDir::new().unwrap();
        noisy_png(&dir.path().join("big.png"), 64, 64);
        let job = CompressionJob::new(
            dir.path().join("big.png"),
            dir.path().join("big.jpg"),
            100,
        );

        let outcome = QualitySearch::new(ImageCrateCodec, SearchPolicy::default()).unwrap().search(&job);

        match outcome {
            JobOutcome::SizeNotReached {
                quality,
                attempts,
                output_size,
            } => {
                assert_eq!(quality, 40);
                assert_eq!(attempts, 10);
                assert!(output_size > 100);
                assert!(job.output_path.exists());
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_real_codec_write_failure_is_unexpected() {
        let dir = TempDir::new().unwrap();
        noisy_png(&dir.path().join("b.png"), 8, 8);
        std::fs::create_dir(dir.path().join("out")).unwrap();
        std::fs::create_dir(dir.path().join("out").join("b.png")).unwrap();

        let job = CompressionJob::new(
            dir.path().join("b.png"),
            dir.path().join("out").join("b.png"),
            1_048_576,
        );
        let outcome = QualitySearch::new(ImageCrateCodec, SearchPolicy::default()).unwrap().search(&job);

        assert!(matches!(outcome, JobOutcome::UnexpectedError { .. }));
    }

    #[test]
    fn test_error_classification() {
        assert_eq!(
            JobOutcome::from(CompressError::MissingInput(PathBuf::from("a"))),
            JobOutcome::SkippedMissing
        );
        assert_eq!(
            JobOutcome::from(CompressError::UnsupportedFormat("x".into())),
            JobOutcome::SkippedUnsupported
        );
        // "unsupported" in fase di encode non è uno skip
        assert!(matches!(
            JobOutcome::from(CompressError::Encode("unsupported color".into())),
            JobOutcome::UnexpectedError { .. }
        ));
    }
}
