use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use image::{Rgba, RgbaImage};

use airpaint_params::CanvasSize;

/// PNG writer for presented frames and pigment fields
pub struct SnapshotWriter {
    output_dir: PathBuf,
}

impl SnapshotWriter {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
        }
    }

    /// Save the presented frame as-is
    pub fn write_frame(&self, frame: u32, size: CanvasSize, rgba: &[u8]) -> Result<PathBuf> {
        let path = self.output_dir.join(format!("frame_{:04}.png", frame));
        to_image(size, rgba.to_vec())?.save(&path)?;
        Ok(path)
    }

    /// Save the pigment field with its premultiplied color undone
    pub fn write_pigment(&self, frame: u32, size: CanvasSize, rgba: &[u8]) -> Result<PathBuf> {
        let path = self.output_dir.join(format!("pigment_{:04}.png", frame));
        let mut img = to_image(size, rgba.to_vec())?;
        for pixel in img.pixels_mut() {
            *pixel = unpremultiply(*pixel);
        }
        img.save(&path)?;
        Ok(path)
    }
}

fn to_image(size: CanvasSize, pixels: Vec<u8>) -> Result<RgbaImage> {
    let len = pixels.len();
    RgbaImage::from_raw(size.width, size.height, pixels).ok_or_else(|| {
        anyhow!(
            "snapshot of {} bytes does not match a {}x{} canvas",
            len,
            size.width,
            size.height
        )
    })
}

fn unpremultiply(Rgba([r, g, b, a]): Rgba<u8>) -> Rgba<u8> {
    if a == 0 {
        return Rgba([0, 0, 0, 0]);
    }
    let scale = |c: u8| ((c as u32 * 255 + a as u32 / 2) / a as u32).min(255) as u8;
    Rgba([scale(r), scale(g), scale(b), a])
}
