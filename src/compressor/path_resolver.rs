//! # Path Resolution Module
//!
//! Centralizza il calcolo dei path di output e la creazione della cartella
//! di destinazione.
//!
//! Regola unica: `output_folder/filename`, stesso nome del file di input,
//! nessuna riscrittura dell'estensione.

use crate::error::CompressError;
use std::path::{Path, PathBuf};
use tracing::info;

/// Utility per calcolare i path di output in modo centralizzato
pub struct PathResolver;

impl PathResolver {
    /// Output path for an input entry: same file name inside `output_folder`
    pub fn get_output_path(input_path: &Path, output_folder: &Path) -> Result<PathBuf, CompressError> {
        let file_name = input_path.file_name().ok_or_else(|| {
            CompressError::Config(format!("Invalid file name: {}", input_path.display()))
        })?;
        Ok(output_folder.join(file_name))
    }

    /// File name used in notices
    pub fn display_name(input_path: &Path) -> String {
        input_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| input_path.display().to_string())
    }

    /// Create the output folder and its parents if needed
    pub async fn ensure_output_folder(output_folder: &Path) -> Result<(), CompressError> {
        if output_folder.is_dir() {
            return Ok(());
        }

        tokio::fs::create_dir_all(output_folder)
            .await
            .map_err(|source| CompressError::OutputFolder {
                path: output_folder.to_path_buf(),
                source,
            })?;
        info!("Created output directory: {}", output_folder.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_output_path_keeps_name_and_extension() {
        let out = PathResolver::get_output_path(Path::new("/in/photo.JPEG"), Path::new("/out")).unwrap();
        assert_eq!(out, PathBuf::from("/out/photo.JPEG"));

        let out = PathResolver::get_output_path(Path::new("/in/noext"), Path::new("/out")).unwrap();
        assert_eq!(out, PathBuf::from("/out/noext"));
    }

    #[test]
    fn test_output_path_rejects_nameless_input() {
        assert!(PathResolver::get_output_path(Path::new("/"), Path::new("/out")).is_err());
    }

    #[test]
    fn test_display_name() {
        assert_eq!(PathResolver::display_name(Path::new("/a/b/c.png")), "c.png");
    }

    #[tokio::test]
    async fn test_ensure_output_folder_creates_parents() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b").join("c");

        PathResolver::ensure_output_folder(&nested).await.unwrap();
        assert!(nested.is_dir());

        // Idempotente
        PathResolver::ensure_output_folder(&nested).await.unwrap();
    }

    #[tokio::test]
    async fn test_ensure_output_folder_failure() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        let result = PathResolver::ensure_output_folder(&blocker.join("sub")).await;
        assert!(matches!(result, Err(CompressError::OutputFolder { .. })));
    }
}
