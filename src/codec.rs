//! # Image Codec Module
//!
//! Questo modulo isola decode ed encode delle immagini dietro il trait
//! `ImageCodec`, così la quality search non dipende dalla libreria usata.
//!
//! ## Responsabilità:
//! - Decodifica del file sorgente con rilevamento formato dal contenuto
//! - Classificazione errori di decode (file mancante vs formato non supportato)
//! - Ri-codifica verso il path di output alla qualità richiesta
//! - Formato di output dedotto dall'estensione del file di output
//!
//! ## Strategia di encoding (`ImageCrateCodec`):
//!
//! | Formato | Qualità | Compressione |
//! |---------|---------|--------------|
//! | JPEG    | ✅      | Lossy, quality 1-100, tabelle Huffman ottimizzate |
//! | PNG     | ❌      | Lossless, `CompressionType::Best` + filtro adattivo |
//! | Altri   | ❌      | Encoder di default della libreria `image` |
//!
//! Gli errori "unsupported" prodotti in fase di encode NON sono skip: vengono
//! riportati come `CompressError::Encode` e finiscono come errori inattesi.

use crate::error::CompressError;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageEncoder, ImageError, ImageFormat};
use jpeg_encoder::{ColorType as JpegColorType, Encoder as JpegEncoder};
use std::fs::File;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::Path;
use tracing::debug;

/// Decode/encode seam used by the quality search.
///
/// Implementations must be shareable across worker threads because the batch
/// driver hands each file to the blocking pool.
pub trait ImageCodec: Send + Sync + 'static {
    /// Decoded in-memory representation of a source image
    type Image;

    /// Decode the source file.
    ///
    /// Must return `CompressError::MissingInput` when the file does not exist
    /// and `CompressError::UnsupportedFormat` when its bytes cannot be decoded.
    fn decode(&self, path: &Path) -> Result<Self::Image, CompressError>;

    /// Encode `image` into `path` at `quality`, replacing any existing file
    fn encode(&self, image: &Self::Image, path: &Path, quality: u8) -> Result<(), CompressError>;
}

/// Production codec backed by the `image` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateCodec;

impl ImageCrateCodec {
    pub fn new() -> Self {
        Self
    }

    /// Baseline JPEG at `quality`; `optimize` computes image-specific Huffman tables
    fn encode_jpeg<W: Write>(
        writer: W,
        image: &DynamicImage,
        quality: u8,
        optimize: bool,
    ) -> Result<(), CompressError> {
        let (width, height) = jpeg_dimensions(image)?;
        let mut encoder = JpegEncoder::new(writer, quality);
        encoder.set_optimized_huffman_tables(optimize);

        let result = match image {
            DynamicImage::ImageLuma8(gray) => {
                encoder.encode(gray.as_raw(), width, height, JpegColorType::Luma)
            }
            other => {
                // JPEG non ha canale alpha
                let rgb = other.to_rgb8();
                encoder.encode(rgb.as_raw(), width, height, JpegColorType::Rgb)
            }
        };
        result.map_err(|e| CompressError::Encode(format!("JPEG encode error: {}", e)))
    }

    fn encode_png<W: Write>(writer: W, image: &DynamicImage) -> Result<(), CompressError> {
        let encoder = PngEncoder::new_with_quality(writer, CompressionType::Best, FilterType::Adaptive);
        encoder
            .write_image(image.as_bytes(), image.width(), image.height(), image.color())
            .map_err(encode_error)
    }
}

impl ImageCodec for ImageCrateCodec {
    type Image = DynamicImage;

    fn decode(&self, path: &Path) -> Result<DynamicImage, CompressError> {
        let reader = image::io::Reader::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => CompressError::MissingInput(path.to_path_buf()),
            _ => CompressError::Io(e),
        })?;

        let reader = reader.with_guessed_format()?;
        let format = reader.format();

        let image = reader.decode().map_err(|e| match e {
            ImageError::Unsupported(_) | ImageError::Decoding(_) => {
                CompressError::UnsupportedFormat(e.to_string())
            }
            ImageError::IoError(io) => CompressError::Io(io),
            other => CompressError::Image(other),
        })?;

        debug!(
            "Decoded {} ({:?}, {}x{}, {:?})",
            path.display(),
            format,
            image.width(),
            image.height(),
            image.color()
        );

        Ok(image)
    }

    fn encode(&self, image: &DynamicImage, path: &Path, quality: u8) -> Result<(), CompressError> {
        let format = ImageFormat::from_path(path)
            .map_err(|_| CompressError::UnknownOutputFormat(path.to_path_buf()))?;

        match format {
            ImageFormat::Jpeg => {
                let mut writer = BufWriter::new(File::create(path)?);
                Self::encode_jpeg(&mut writer, image, quality, true)?;
                writer.flush()?;
            }
            ImageFormat::Png => {
                let mut writer = BufWriter::new(File::create(path)?);
                Self::encode_png(&mut writer, image)?;
                writer.flush()?;
            }
            other => {
                image.save_with_format(path, other).map_err(encode_error)?;
            }
        }

        Ok(())
    }
}

fn jpeg_dimensions(image: &DynamicImage) -> Result<(u16, u16), CompressError> {
    match (u16::try_from(image.width()), u16::try_from(image.height())) {
        (Ok(width), Ok(height)) => Ok((width, height)),
        _ => Err(CompressError::Encode(format!(
            "{}x{} exceeds the JPEG dimension limit of 65535",
            image.width(),
            image.height()
        ))),
    }
}

fn encode_error(err: ImageError) -> CompressError {
    match err {
        ImageError::IoError(io) => CompressError::Io(io),
        other => CompressError::Encode(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use tempfile::TempDir;

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        }))
    }

    #[test]
    fn test_decode_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = ImageCrateCodec.decode(&dir.path().join("nope.jpg"));
        assert!(matches!(result, Err(CompressError::MissingInput(_))));
    }

    #[test]
    fn test_decode_text_file_is_unsupported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "just some plain text, definitely not pixels").unwrap();

        let result = ImageCrateCodec.decode(&path);
        assert!(matches!(result, Err(CompressError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_jpeg_round_trip_and_quality_affects_size() {
        let dir = TempDir::new().unwrap();
        let high = dir.path().join("high.jpg");
        let low = dir.path().join("low.jpg");
        let image = gradient(128, 128);

        ImageCrateCodec.encode(&image, &high, 95).unwrap();
        ImageCrateCodec.encode(&image, &low, 10).unwrap();

        let high_size = std::fs::metadata(&high).unwrap().len();
        let low_size = std::fs::metadata(&low).unwrap().len();
        assert!(low_size < high_size);

        let decoded = ImageCrateCodec.decode(&high).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (128, 128));
    }

    #[test]
    fn test_jpeg_huffman_optimization_shrinks_output() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_fn(256, 256, |x, y| {
            Rgb([((x * 7) % 256) as u8, ((y * 13) % 256) as u8, ((x ^ y) % 256) as u8])
        }));

        let mut plain = Vec::new();
        ImageCrateCodec::encode_jpeg(&mut plain, &image, 85, false).unwrap();
        let mut optimized = Vec::new();
        ImageCrateCodec::encode_jpeg(&mut optimized, &image, 85, true).unwrap();

        assert!(!optimized.is_empty());
        assert!(
            optimized.len() <= plain.len(),
            "optimized {} bytes vs plain {} bytes",
            optimized.len(),
            plain.len()
        );
    }

    #[test]
    fn test_jpeg_file_matches_optimized_encoding() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("opt.jpg");
        let image = gradient(96, 64);

        ImageCrateCodec.encode(&image, &path, 70).unwrap();
        let mut expected = Vec::new();
        ImageCrateCodec::encode_jpeg(&mut expected, &image, 70, true).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), expected);
    }

    #[test]
    fn test_jpeg_grayscale_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gray.jpg");
        let image = DynamicImage::ImageLuma8(image::GrayImage::from_fn(40, 30, |x, _| {
            image::Luma([(x * 6) as u8])
        }));

        ImageCrateCodec.encode(&image, &path, 85).unwrap();
        let decoded = ImageCrateCodec.decode(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 30));
        assert_eq!(decoded.color(), image::ColorType::L8);
    }

    #[test]
    fn test_jpeg_drops_alpha() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("alpha.jpg");
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(16, 16, Rgba([10, 20, 30, 128])));

        ImageCrateCodec.encode(&image, &path, 85).unwrap();
        assert!(ImageCrateCodec.decode(&path).is_ok());
    }

    #[test]
    fn test_png_encode() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.png");
        let image = gradient(32, 32);

        ImageCrateCodec.encode(&image, &path, 40).unwrap();
        let decoded = ImageCrateCodec.decode(&path).unwrap();
        assert_eq!(decoded.to_rgb8(), image.to_rgb8());
    }

    #[test]
    fn test_unknown_output_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("picture.unknownext");
        let result = ImageCrateCodec.encode(&gradient(4, 4), &path, 85);
        assert!(matches!(result, Err(CompressError::UnknownOutputFormat(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_encode_into_directory_is_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("taken.jpg");
        std::fs::create_dir(&path).unwrap();

        let result = ImageCrateCodec.encode(&gradient(4, 4), &path, 85);
        assert!(matches!(result, Err(CompressError::Io(_))));
    }
}
