//! # Image Size Compressor Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per altri consumatori
//!   (ad esempio una GUI che sceglie le cartelle e mostra le notifiche)
//!
//! ## Architettura dei moduli:
//! - `config`: Gestione configurazione e validazione parametri
//! - `error`: Tipi di errore custom
//! - `codec`: Decode/encode delle immagini dietro il trait `ImageCodec`
//! - `compressor`: Batch driver e quality search
//! - `file_manager`: Listing della cartella e utilità sulle dimensioni
//! - `progress`: Progress bar e statistiche
//! - `report`: Notifiche utente e sink degli eventi (log, JSON, memoria)
//!
//! ## Utilizzo:
//! ```ignore
//! use image_size_compressor::{run_batch, Config, LogSink};
//!
//! let config = Config {
//!     input_folder: "photos".into(),
//!     output_folder: "photos-small".into(),
//!     target_size_mb: 1.0,
//!     ..Default::default()
//! };
//! let report = run_batch(&config, &LogSink).await?;
//! ```

pub mod codec;
pub mod compressor;
pub mod config;
pub mod error;
pub mod file_manager;
pub mod progress;
pub mod report;

pub use codec::{ImageCodec, ImageCrateCodec};
pub use compressor::{
    run_batch, BatchDriver, BatchReport, CompressionJob, FileOutcome, JobOutcome, QualitySearch,
};
pub use config::{Config, SearchPolicy};
pub use error::CompressError;
pub use report::{BatchEvent, JsonSink, LogSink, MemorySink, Notice, NoticeLevel, ReportSink};
