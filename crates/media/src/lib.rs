//! Structural validation of downloaded images.
//!
//! A file is accepted when it fully decodes as PNG, JPEG or WebP, regardless
//! of its name; the format is sniffed from the content.

pub mod error;

use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use image::ImageReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub type ValidatorHandle = Arc<dyn MediaValidator>;

/// Pixel size of an image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Decides whether a local file is a usable image and measures it.
#[async_trait]
pub trait MediaValidator: Send + Sync {
    async fn is_valid_image(&self, path: &Path) -> bool;

    /// Pixel dimensions of the image, or `{0, 0}` when they cannot be read.
    async fn dimensions(&self, path: &Path) -> Dimensions;
}

/// [`MediaValidator`] backed by the `image` crate.
///
/// Decoding is CPU-bound, so it runs on the blocking thread pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageValidator;

impl ImageValidator {
    /// Fully decode the file, returning its dimensions.
    pub async fn inspect(&self, path: &Path) -> Result<Dimensions> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || decode(path)).await.or_raise(|| ErrorKind::Task)?
    }

    /// Read the dimensions from the image header without decoding pixels.
    pub async fn header_dimensions(&self, path: &Path) -> Result<Dimensions> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || read_header(path)).await.or_raise(|| ErrorKind::Task)?
    }
}

fn decode(path: PathBuf) -> Result<Dimensions> {
    let reader = ImageReader::open(&path)
        .or_raise(|| ErrorKind::Unreadable(path.clone()))?
        .with_guessed_format()
        .or_raise(|| ErrorKind::Unreadable(path.clone()))?;
    let image = reader.decode().or_raise(|| ErrorKind::InvalidImage(path.clone()))?;
    Ok(Dimensions { width: image.width(), height: image.height() })
}

fn read_header(path: PathBuf) -> Result<Dimensions> {
    let reader = ImageReader::open(&path)
        .or_raise(|| ErrorKind::Unreadable(path.clone()))?
        .with_guessed_format()
        .or_raise(|| ErrorKind::Unreadable(path.clone()))?;
    let (width, height) = reader.into_dimensions().or_raise(|| ErrorKind::InvalidImage(path.clone()))?;
    Ok(Dimensions { width, height })
}

#[async_trait]
impl MediaValidator for ImageValidator {
    async fn is_valid_image(&self, path: &Path) -> bool {
        match self.inspect(path).await {
            Ok(_) => true,
            Err(err) => {
                tracing::debug!(path = %path.display(), error = ?err, "Rejected image");
                false
            },
        }
    }

    async fn dimensions(&self, path: &Path) -> Dimensions {
        self.header_dimensions(path).await.unwrap_or_default()
    }
}
