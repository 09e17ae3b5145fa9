//! Image Batch Operations
//!
//! Lossless WebP conversion and half-size PNG copies. Codec work is delegated
//! to the `image` crate; this module only walks files and records results.

use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbaImage};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ImagingError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageOp {
    /// Re-encode as lossless WebP, alpha preserved.
    ConvertWebp,
    /// Halve both dimensions with a Lanczos filter, alpha preserved.
    ResizeHalf,
}

impl ImageOp {
    fn output_format(&self) -> ImageFormat {
        match self {
            ImageOp::ConvertWebp => ImageFormat::WebP,
            ImageOp::ResizeHalf => ImageFormat::Png,
        }
    }

    fn output_name(&self, source: &Path) -> Option<PathBuf> {
        match self {
            ImageOp::ConvertWebp => {
                let stem = source.file_stem()?;
                Some(PathBuf::from(stem).with_extension("webp"))
            }
            ImageOp::ResizeHalf => source.file_name().map(PathBuf::from),
        }
    }

    fn transform(&self, image: RgbaImage) -> RgbaImage {
        match self {
            ImageOp::ConvertWebp => image,
            ImageOp::ResizeHalf => {
                let (w, h) = half_size(image.width(), image.height());
                imageops::resize(&image, w, h, FilterType::Lanczos3)
            }
        }
    }
}

/// Half of each dimension, never below one pixel.
pub fn half_size(width: u32, height: u32) -> (u32, u32) {
    ((width / 2).max(1), (height / 2).max(1))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessedImage {
    pub source: PathBuf,
    pub output: PathBuf,
    pub size: [u32; 2],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedImage {
    pub source: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImageBatch {
    pub processed: Vec<ProcessedImage>,
    pub failed: Vec<FailedImage>,
}

impl ImageBatch {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Regular files in `dir` whose name ends in `.png` (any case), sorted by name.
pub fn list_pngs(dir: &Path) -> Result<Vec<PathBuf>, ImagingError> {
    let io_err = |source| ImagingError::Io { path: dir.to_path_buf(), source };

    let mut pngs = vec![];
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let is_png = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("png"));
        if is_png && path.is_file() {
            pngs.push(path);
        }
    }
    pngs.sort();
    Ok(pngs)
}

fn process_one(op: ImageOp, source: &Path, out_dir: &Path) -> Result<ProcessedImage, String> {
    let name = op
        .output_name(source)
        .ok_or_else(|| "file has no usable name".to_string())?;
    let output = out_dir.join(name);

    let decoded = image::open(source).map_err(|e| e.to_string())?;
    let result = op.transform(decoded.to_rgba8());
    result
        .save_with_format(&output, op.output_format())
        .map_err(|e| e.to_string())?;

    Ok(ProcessedImage {
        source: source.to_path_buf(),
        output,
        size: [result.width(), result.height()],
    })
}

/// Apply `op` to every PNG in `source_dir`, writing into `out_dir`.
///
/// A file that cannot be decoded or written is recorded in `failed` and the
/// batch continues.
pub fn run_batch(op: ImageOp, source_dir: &Path, out_dir: &Path) -> Result<ImageBatch, ImagingError> {
    fs::create_dir_all(out_dir).map_err(|source| ImagingError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let mut batch = ImageBatch::default();
    for source in list_pngs(source_dir)? {
        match process_one(op, &source, out_dir) {
            Ok(done) => {
                info!(
                    source = %done.source.display(),
                    output = %done.output.display(),
                    width = done.size[0],
                    height = done.size[1],
                    "image written"
                );
                batch.processed.push(done);
            }
            Err(reason) => {
                warn!(source = %source.display(), %reason, "image skipped");
                batch.failed.push(FailedImage { source, reason });
            }
        }
    }

    Ok(batch)
}

pub fn convert_to_webp(source_dir: &Path, out_dir: &Path) -> Result<ImageBatch, ImagingError> {
    run_batch(ImageOp::ConvertWebp, source_dir, out_dir)
}

pub fn resize_half(source_dir: &Path, out_dir: &Path) -> Result<ImageBatch, ImagingError> {
    run_batch(ImageOp::ResizeHalf, source_dir, out_dir)
}
