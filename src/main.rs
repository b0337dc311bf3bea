//! # Image Size Compressor - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing` (su stderr)
//! - Caricamento configurazione da file JSON + override da CLI
//! - Scelta del sink (log o JSON) e avvio del batch
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI (cartelle, target, workers, etc.)
//! 2. Configura il logging (INFO o DEBUG a seconda del flag verbose)
//! 3. Carica il file di configurazione (default se assente)
//! 4. Applica gli override della CLI e, se richiesto, salva la configurazione
//! 5. Esegue il batch e riporta gli esiti
//!
//! ## Esempio di utilizzo:
//! ```bash
//! image-compressor ./photos ./photos-small --target-size-mb 0.8 --workers 4
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use image_size_compressor::{run_batch, Config, JsonSink, LogSink, ReportSink};

#[derive(Parser)]
#[command(name = "image-compressor")]
#[command(about = "Compress every image of a folder until it fits a size target")]
struct Args {
    /// Folder containing the images to compress
    input_folder: Option<PathBuf>,

    /// Folder receiving the compressed images (created if missing)
    output_folder: Option<PathBuf>,

    /// Maximum size of each output file, in MB
    #[arg(short, long)]
    target_size_mb: Option<f64>,

    /// Number of files compressed in parallel
    #[arg(short, long)]
    workers: Option<usize>,

    /// Settings file (JSON); defaults to the user config directory
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the effective settings back to the settings file
    #[arg(long)]
    save_config: bool,

    /// Emit JSON events on stdout instead of log lines
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = args.config.clone().or_else(Config::default_path);
    let mut config = match &config_path {
        Some(path) => {
            debug!("Loading settings from {}", path.display());
            Config::from_file(path).await?
        }
        None => Config::default(),
    };

    // Override da CLI
    if let Some(input_folder) = args.input_folder {
        config.input_folder = input_folder;
    }
    if let Some(output_folder) = args.output_folder {
        config.output_folder = output_folder;
    }
    if let Some(target_size_mb) = args.target_size_mb {
        config.target_size_mb = target_size_mb;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if args.json {
        config.json_output = true;
    }
    config.show_progress = !config.json_output;

    config.validate()?;

    if args.save_config {
        let path = config_path
            .ok_or_else(|| anyhow::anyhow!("No settings file location available; pass --config"))?;
        config.save_to_file(&path).await?;
        info!("Saved settings to {}", path.display());
    }

    let sink: Box<dyn ReportSink> = if config.json_output {
        Box::new(JsonSink)
    } else {
        Box::new(LogSink)
    };

    run_batch(&config, sink.as_ref()).await?;

    Ok(())
}
