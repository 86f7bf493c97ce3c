//! I/O helpers for TIFF stacks, masks and JSON reports.
//!
//! - `read_stack`: decode a multi-page grayscale TIFF into a raw f32 stack.
//! - `write_stack_u8`: write an 8-bit mask, one page per slice, optionally
//!   Deflate-compressed.
//! - `save_mask_preview`: write a max-projection PNG of a mask.
//! - `write_json_file`: pretty-print a serializable value to disk.
use crate::error::SegmentationError;
use crate::stack::Stack;
use image::GrayImage;
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::compression::Deflate;
use tiff::encoder::{colortype, TiffEncoder};

/// Raw stack as decoded from disk, before dimensionality normalization.
///
/// `axes` is `[pages, rows, cols]`; the preprocessor squeezes it down to a
/// 2D or 3D [`Stack`].
#[derive(Clone, Debug)]
pub struct RawStack {
    /// Axis lengths, outermost first.
    pub axes: Vec<usize>,
    /// Samples in axis order, converted to f32.
    pub data: Vec<f32>,
}

/// Decode a multi-page grayscale TIFF into a raw stack.
///
/// Accepts unsigned 8/16/32-bit and 32-bit float samples; every page must
/// share the dimensions of the first one.
pub fn read_stack(path: &Path) -> Result<RawStack, SegmentationError> {
    let file = File::open(path).map_err(|e| SegmentationError::read(path, e))?;
    // Deconvolved stacks routinely exceed the decoder's default
    // allocation limit.
    let mut decoder = Decoder::new(BufReader::new(file))
        .map_err(|e| SegmentationError::read(path, e))?
        .with_limits(Limits::unlimited());

    let mut pages = 0usize;
    let (mut rows, mut cols) = (0usize, 0usize);
    let mut data: Vec<f32> = Vec::new();
    loop {
        match decoder.colortype().map_err(|e| SegmentationError::read(path, e))? {
            tiff::ColorType::Gray(_) => {}
            other => {
                return Err(SegmentationError::Shape(format!(
                    "{}: unsupported TIFF color type {other:?}, expected grayscale",
                    path.display()
                )))
            }
        }
        let (w, h) = decoder
            .dimensions()
            .map_err(|e| SegmentationError::read(path, e))?;
        let (w, h) = (w as usize, h as usize);
        if pages == 0 {
            rows = h;
            cols = w;
            data.reserve(rows * cols);
        } else if h != rows || w != cols {
            return Err(SegmentationError::Shape(format!(
                "{}: page {pages} is {h}x{w}, first page is {rows}x{cols}",
                path.display()
            )));
        }
        let page = decoder
            .read_image()
            .map_err(|e| SegmentationError::read(path, e))?;
        append_samples(page, &mut data).map_err(|detail| {
            SegmentationError::Shape(format!("{}: {detail}", path.display()))
        })?;
        pages += 1;

        if !decoder.more_images() {
            break;
        }
        decoder
            .next_image()
            .map_err(|e| SegmentationError::read(path, e))?;
    }

    Ok(RawStack {
        axes: vec![pages, rows, cols],
        data,
    })
}

fn append_samples(page: DecodingResult, out: &mut Vec<f32>) -> Result<(), String> {
    match page {
        DecodingResult::U8(buf) => out.extend(buf.iter().map(|&v| f32::from(v))),
        DecodingResult::U16(buf) => out.extend(buf.iter().map(|&v| f32::from(v))),
        DecodingResult::U32(buf) => out.extend(buf.iter().map(|&v| v as f32)),
        DecodingResult::F32(buf) => out.extend_from_slice(&buf),
        _ => return Err("unsupported TIFF sample format".to_string()),
    }
    Ok(())
}

/// Write an 8-bit stack as a multi-page grayscale TIFF, one page per slice.
///
/// Existing files are overwritten; an output path that is a directory is a
/// write error.
pub fn write_stack_u8(
    path: &Path,
    stack: &Stack<u8>,
    compress: bool,
) -> Result<(), SegmentationError> {
    if path.is_dir() {
        return Err(SegmentationError::write(path, "output path is a directory"));
    }
    let file = File::create(path).map_err(|e| SegmentationError::write(path, e))?;
    let mut encoder = TiffEncoder::new(file).map_err(|e| SegmentationError::write(path, e))?;

    let (rows, cols) = (stack.shape.rows as u32, stack.shape.cols as u32);
    for z in 0..stack.shape.depth {
        let plane = stack.plane(z);
        let written = if compress {
            encoder.write_image_with_compression::<colortype::Gray8, _>(
                cols,
                rows,
                Deflate::default(),
                plane,
            )
        } else {
            encoder.write_image::<colortype::Gray8>(cols, rows, plane)
        };
        written.map_err(|e| SegmentationError::write(path, e))?;
    }
    Ok(())
}

/// Save a max-projection of a mask as a grayscale PNG, stretched so the
/// brightest label maps to white.
pub fn save_mask_preview(path: &Path, mask: &Stack<u8>) -> Result<(), SegmentationError> {
    let (rows, cols) = (mask.shape.rows, mask.shape.cols);
    let mut proj = vec![0u8; rows * cols];
    for z in 0..mask.shape.depth {
        for (p, &v) in proj.iter_mut().zip(mask.plane(z)) {
            if v > *p {
                *p = v;
            }
        }
    }
    let peak = proj.iter().copied().max().unwrap_or(0);
    if peak > 0 && peak < u8::MAX {
        let scale = 255.0 / f32::from(peak);
        for p in &mut proj {
            *p = (f32::from(*p) * scale).round().min(255.0) as u8;
        }
    }
    let img = GrayImage::from_raw(cols as u32, rows as u32, proj)
        .ok_or_else(|| SegmentationError::write(path, "preview buffer size mismatch"))?;
    img.save(path).map_err(|e| SegmentationError::write(path, e))
}

/// Serialize `value` as pretty JSON into `path`.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON: {e}"))?;
    fs::write(path, json).map_err(|e| format!("Failed to write {}: {e}", path.display()))
}
