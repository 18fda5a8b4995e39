use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::{
    error::StageResult,
    geom::Rect,
    pixel::PixelBuf,
};

/// A decoded raster file. Immutable after load; pictures and animation
/// frames copy their pixels out, so the image may be released once its
/// dependents are constructed.
#[derive(Clone, Debug)]
pub struct RasterImage {
    pub pixels: PixelBuf,
    pub source: PathBuf,
}

impl RasterImage {
    /// Read and decode a raster file from disk.
    pub fn load(path: impl AsRef<Path>) -> StageResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("read image bytes from '{}'", path.display()))?;
        Ok(Self {
            pixels: decode_image(&bytes)?,
            source: path.to_path_buf(),
        })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Whole-image rectangle, the default frame when a call site passes none.
    pub fn full_bounds(&self) -> Rect {
        Rect::from_size(self.pixels.size())
    }

    /// Copy out the given sub-rectangle. Errors if it exceeds the image.
    pub fn subregion(&self, rect: Rect) -> StageResult<PixelBuf> {
        self.pixels.subregion(rect)
    }
}

/// Decode any format the `image` crate understands into straight RGBA8.
pub fn decode_image(bytes: &[u8]) -> StageResult<PixelBuf> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    PixelBuf::from_raw(width, height, rgba.into_raw())
}
