//! # File Management Module
//!
//! Questo modulo gestisce le operazioni sui file usate dal batch driver.
//!
//! ## Responsabilità:
//! - Listing delle entry della cartella di input (un solo livello)
//! - Dimensione dei file per statistiche e report
//! - Formattazione human-readable delle dimensioni
//! - Calcolo percentuale di riduzione
//!
//! ## Ordine di listing:
//! Nessun ordinamento: le entry arrivano nell'ordine restituito dal file
//! system. Tutte le entry vengono restituite (anche directory e file non
//! immagine), sarà la quality search a classificarle.
//!
//! ## Esempio:
//! ```ignore
//! let entries = FileManager::list_entries(Path::new("/path/to/photos"))?;
//! for entry in entries {
//!     let size = FileManager::file_size(&entry).await?;
//! }
//! ```

use crate::error::CompressError;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;
use walkdir::WalkDir;

/// Manages file operations and discovery
pub struct FileManager;

impl FileManager {
    /// Size of a file in bytes
    pub async fn file_size(path: &Path) -> std::io::Result<u64> {
        Ok(fs::metadata(path).await?.len())
    }

    /// List every direct entry of `dir` in file-system order
    pub fn list_entries(dir: &Path) -> Result<Vec<PathBuf>, CompressError> {
        let mut entries = Vec::new();

        for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
            match entry {
                Ok(entry) => entries.push(entry.into_path()),
                Err(e) if e.depth() == 0 => {
                    let source = e
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "filesystem loop"));
                    return Err(CompressError::InputFolder {
                        path: dir.to_path_buf(),
                        source,
                    });
                }
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                }
            }
        }

        Ok(entries)
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Calculate percentage reduction
    pub fn calculate_reduction(original_size: u64, new_size: u64) -> f64 {
        if original_size == 0 {
            0.0
        } else {
            ((original_size as f64 - new_size as f64) / original_size as f64) * 100.0
        }
    }
}
