//! I/O helpers for frame images, masks and JSON.
//!
//! - `load_grayscale_image`: read a PNG/TIFF/etc. into a normalized `ImageF32`.
//! - `load_stack`: read a sequence of frame images into a [`Stack`].
//! - `save_grayscale_f32`: write an `ImageF32` to a grayscale PNG.
//! - `save_mask_png`: write a binary mask as a black/white PNG.
//! - `write_json_file` / `read_json_file`: pretty JSON on disk.
use super::{ImageF32, ImageView, Stack};
use crate::mask::Mask;
use image::{GrayImage, Luma};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Load an image from disk as 16-bit grayscale, normalized to [0, 1].
pub fn load_grayscale_image(path: &Path) -> Result<ImageF32, String> {
    let img = image::open(path)
        .map_err(|e| format!("Failed to open {}: {e}", path.display()))?
        .into_luma16();
    let width = img.width() as usize;
    let height = img.height() as usize;
    let data = img
        .into_raw()
        .into_iter()
        .map(|v| v as f32 / u16::MAX as f32)
        .collect();
    ImageF32::from_vec(width, height, data).map_err(|e| e.to_string())
}

/// Load frame images in order and interleave them into a stack.
pub fn load_stack(paths: &[PathBuf]) -> Result<Stack, String> {
    let frames = paths
        .iter()
        .map(|p| load_grayscale_image(p))
        .collect::<Result<Vec<_>, _>>()?;
    Stack::from_frames(&frames).map_err(|e| e.to_string())
}

/// Save a float image to a grayscale PNG, clamping values in [0, 255].
pub fn save_grayscale_f32(image: &ImageF32, path: &Path) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let mut out = GrayImage::new(image.w as u32, image.h as u32);
    for (y, row) in image.rows().enumerate() {
        for (x, &px) in row.iter().enumerate() {
            let v = (px * 255.0).clamp(0.0, 255.0);
            out.put_pixel(x as u32, y as u32, Luma([v as u8]));
        }
    }
    out.save(path)
        .map_err(|e| format!("Failed to save {}: {e}", path.display()))
}

/// Save a mask to a PNG, foreground white.
pub fn save_mask_png(mask: &Mask, path: &Path) -> Result<(), String> {
    let mut img = ImageF32::new(mask.w, mask.h);
    for (dst, &fg) in img.data.iter_mut().zip(&mask.data) {
        *dst = if fg { 1.0 } else { 0.0 };
    }
    save_grayscale_f32(&img, path)
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON for {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write JSON {}: {e}", path.display()))
}

pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&data).map_err(|e| format!("Failed to parse {}: {e}", path.display()))
}

fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}
