//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce `CompressError` enum per categorizzare gli errori possibili
//! - Distingue gli errori per-file (gestiti dalla quality search) da quelli
//!   fatali per l'intero batch (cartella di output, configurazione)
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Categorie di errori:
//! - `MissingInput`: File sparito tra il listing e l'apertura
//! - `UnsupportedFormat`: Nessun decoder riconosce i byte del file
//! - `UnknownOutputFormat`: Estensione di output senza encoder associato
//! - `Encode`: L'encoder ha rifiutato l'immagine
//! - `Io` / `Image`: Errori di I/O o della libreria `image`
//! - `Config`: Parametri non validi
//! - `InputFolder` / `OutputFolder`: Errori fatali sulle cartelle del batch
//!
//! ## Esempio:
//! ```ignore
//! if !path.exists() {
//!     return Err(CompressError::MissingInput(path.to_path_buf()));
//! }
//! ```

use std::path::PathBuf;

/// Custom error types for image compression
#[derive(thiserror::Error, Debug)]
pub enum CompressError {
    #[error("Input file not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Unknown output format for {}", .0.display())]
    UnknownOutputFormat(PathBuf),

    #[error("Encoding error: {0}")]
    Encode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Cannot read input folder {}: {source}", .path.display())]
    InputFolder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot create output folder {}: {source}", .path.display())]
    OutputFolder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
