//! # Compressor Module
//!
//! Modulo che separa le responsabilità in sottomoduli:
//! - `batch_driver`: Orchestratore del batch
//! - `quality_search`: Ricerca della qualità per singolo file
//! - `path_resolver`: Logica di calcolo path centralizzata

pub mod batch_driver;
pub mod path_resolver;
pub mod quality_search;

pub use batch_driver::{run_batch, BatchDriver, BatchReport, FileOutcome};
pub use path_resolver::PathResolver;
pub use quality_search::{CompressionJob, JobOutcome, QualitySearch, SearchState};
