//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` passata per valore al batch driver
//! - Definisce `SearchPolicy` con i parametri della quality search
//! - Fornisce validazione dei parametri di input
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//!
//! ## Parametri di configurazione:
//! - `input_folder`: Cartella con le immagini da comprimere
//! - `output_folder`: Cartella di destinazione (creata se manca)
//! - `target_size_mb`: Dimensione massima per file in MB (default: 1.0)
//! - `search`: Qualità iniziale 85, passo 5, massimo 10 tentativi
//! - `workers`: File elaborati in parallelo (default: 1 = sequenziale)
//! - `json_output`: Eventi JSON su stdout invece dei log
//! - `show_progress`: Mostra la progress bar
//!
//! ## Esempio:
//! ```ignore
//! let config = Config {
//!     input_folder: "photos".into(),
//!     output_folder: "photos-small".into(),
//!     target_size_mb: 0.5,
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Lowest quality a search policy may ever hand to the encoder
pub const MIN_QUALITY: u8 = 5;
/// Highest quality a search policy may ever hand to the encoder
pub const MAX_QUALITY: u8 = 100;

/// Parameters of the quality search loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchPolicy {
    /// Quality of the first encode attempt
    pub start_quality: u8,
    /// Amount subtracted from the quality after each oversized attempt
    pub quality_step: u8,
    /// Maximum number of encode attempts per file
    pub max_iterations: u32,
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self {
            start_quality: 85,
            quality_step: 5,
            max_iterations: 10,
        }
    }
}

impl SearchPolicy {
    /// Quality used by the last attempt the budget allows
    pub fn lowest_quality(&self) -> i64 {
        let steps = i64::from(self.max_iterations.saturating_sub(1));
        i64::from(self.start_quality) - steps * i64::from(self.quality_step)
    }

    /// Validate the policy: every reachable quality must stay in [5, 100]
    pub fn validate(&self) -> Result<()> {
        if self.start_quality < MIN_QUALITY || self.start_quality > MAX_QUALITY {
            return Err(anyhow::anyhow!(
                "Start quality must be between {} and {}",
                MIN_QUALITY,
                MAX_QUALITY
            ));
        }

        if self.max_iterations == 0 {
            return Err(anyhow::anyhow!("Maximum iterations must be greater than 0"));
        }

        if self.lowest_quality() < i64::from(MIN_QUALITY) {
            return Err(anyhow::anyhow!(
                "Search policy would reach quality {} (minimum is {})",
                self.lowest_quality(),
                MIN_QUALITY
            ));
        }

        Ok(())
    }
}

/// Configuration for a compression batch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Folder whose entries are compressed
    pub input_folder: PathBuf,
    /// Folder receiving same-named compressed files
    pub output_folder: PathBuf,
    /// Maximum size of each output file, in megabytes
    pub target_size_mb: f64,
    /// Quality search parameters
    pub search: SearchPolicy,
    /// Number of files compressed concurrently
    pub workers: usize,
    /// Output progress and notices as JSON for programmatic use
    pub json_output: bool,
    /// Draw a progress bar while the batch runs
    pub show_progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_folder: PathBuf::new(),
            output_folder: PathBuf::new(),
            target_size_mb: 1.0,
            search: SearchPolicy::default(),
            workers: 1,
            json_output: false,
            show_progress: false,
        }
    }
}

impl Config {
    /// Target size in bytes, fixed for the whole batch
    pub fn target_bytes(&self) -> u64 {
        target_bytes(self.target_size_mb)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if !self.target_size_mb.is_finite() || self.target_size_mb <= 0.0 {
            return Err(anyhow::anyhow!("Target size must be a positive number of MB"));
        }

        if self.workers == 0 {
            return Err(anyhow::anyhow!("Number of workers must be greater than 0"));
        }

        self.search.validate()?;

        if self.input_folder.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("Input folder is required"));
        }
        if !self.input_folder.exists() {
            return Err(anyhow::anyhow!(
                "Input folder does not exist: {}",
                self.input_folder.display()
            ));
        }
        if !self.input_folder.is_dir() {
            return Err(anyhow::anyhow!(
                "Input path is not a directory: {}",
                self.input_folder.display()
            ));
        }

        if self.output_folder.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("Output folder is required"));
        }
        if self.output_folder.exists() && !self.output_folder.is_dir() {
            return Err(anyhow::anyhow!(
                "Output path is not a directory: {}",
                self.output_folder.display()
            ));
        }

        Ok(())
    }

    /// Default location of the settings file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("image-compressor").join("config.json"))
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config file {}: {}", path.display(), e))?;
        config.search.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

/// Convert a megabyte threshold into whole bytes (MB × 1024 × 1024).
///
/// File sizes are integers, so flooring keeps `size <= target` equivalent to
/// comparing against the exact real-valued threshold.
pub fn target_bytes(target_size_mb: f64) -> u64 {
    (target_size_mb * BYTES_PER_MB).floor() as u64
}
