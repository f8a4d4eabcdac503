//! Canvas encoding: data URLs and binary blobs.
//!
//! Mirrors the platform canvas primitives. A data URL is produced
//! synchronously; a blob is produced on a blocking task and its completion is
//! signalled exactly once, either with the encoded bytes or with nothing.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use tokio::sync::oneshot;

use crate::rendering::Canvas;
use crate::{Error, Result};

/// Quality used for lossy formats when none (or an out-of-range one) is given
pub const DEFAULT_QUALITY: f32 = 0.92;

/// Output image format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
}

impl ImageFormat {
    /// Resolve a MIME type. Absent or unsupported types fall back to PNG.
    pub fn from_mime(mime: Option<&str>) -> Self {
        match mime.map(|m| m.trim().to_ascii_lowercase()).as_deref() {
            Some("image/jpeg") => ImageFormat::Jpeg,
            Some("image/png") | None => ImageFormat::Png,
            Some(other) => {
                log::debug!("Unsupported image type {:?}, falling back to image/png", other);
                ImageFormat::Png
            }
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
        }
    }
}

fn effective_quality(quality: Option<f32>) -> f32 {
    match quality {
        Some(q) if (0.0..=1.0).contains(&q) => q,
        _ => DEFAULT_QUALITY,
    }
}

/// Encode a non-empty canvas to image bytes.
pub fn encode(canvas: &Canvas, format: ImageFormat, quality: Option<f32>) -> Result<Vec<u8>> {
    if canvas.is_empty() {
        return Err(Error::Encode(format!(
            "cannot encode a {}x{} canvas",
            canvas.width, canvas.height
        )));
    }

    let mut out = Cursor::new(Vec::new());
    match format {
        ImageFormat::Png => {
            PngEncoder::new(&mut out).write_image(
                &canvas.pixels,
                canvas.width,
                canvas.height,
                ExtendedColorType::Rgba8,
            )?;
        }
        ImageFormat::Jpeg => {
            // No alpha channel; composite over black like a browser does.
            let rgb: Vec<u8> = canvas
                .pixels
                .chunks_exact(4)
                .flat_map(|p| {
                    let a = p[3] as u32;
                    [p[0], p[1], p[2]].map(|c| (c as u32 * a / 255) as u8)
                })
                .collect();
            let q = (effective_quality(quality) * 100.0).round().clamp(1.0, 100.0) as u8;
            JpegEncoder::new_with_quality(&mut out, q).write_image(
                &rgb,
                canvas.width,
                canvas.height,
                ExtendedColorType::Rgb8,
            )?;
        }
    }
    Ok(out.into_inner())
}

/// Encode `canvas` as a `data:` URL.
///
/// A zero-area canvas yields `"data:,"`.
pub fn to_data_url(canvas: &Canvas, format: Option<&str>, quality: Option<f32>) -> Result<String> {
    if canvas.is_empty() {
        return Ok("data:,".to_string());
    }
    let format = ImageFormat::from_mime(format);
    let bytes = encode(canvas, format, quality)?;
    Ok(format!("data:{};base64,{}", format.mime(), BASE64.encode(bytes)))
}

/// Encoded image bytes with their MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Blob {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Outcome of a blob encode
#[derive(Debug)]
pub enum EncodeOutcome {
    Encoded(Blob),
    /// The canvas could not be encoded; no blob was produced
    Empty,
}

/// Single-shot completion signal of a blob encode
pub struct BlobSignal {
    rx: oneshot::Receiver<EncodeOutcome>,
}

impl BlobSignal {
    /// Wait for the encode to finish. `Ok(None)` means nothing was encoded.
    pub async fn wait(self) -> Result<Option<Blob>> {
        let outcome = self
            .rx
            .await
            .map_err(|e| Error::Other(format!("Blob encode canceled: {}", e)))?;
        Ok(match outcome {
            EncodeOutcome::Encoded(blob) => Some(blob),
            EncodeOutcome::Empty => None,
        })
    }
}

/// Start encoding `canvas` as a blob on a blocking task.
///
/// Must be called from within a tokio runtime.
pub fn to_blob(canvas: Canvas, format: Option<&str>, quality: Option<f32>) -> BlobSignal {
    let (tx, rx) = oneshot::channel();
    let format = ImageFormat::from_mime(format);

    tokio::task::spawn_blocking(move || {
        let outcome = if canvas.is_empty() {
            EncodeOutcome::Empty
        } else {
            match encode(&canvas, format, quality) {
                Ok(bytes) => EncodeOutcome::Encoded(Blob { mime: format.mime().to_string(), bytes }),
                Err(e) => {
                    log::warn!("Blob encode produced no result: {}", e);
                    EncodeOutcome::Empty
                }
            }
        };
        // The receiver may have been dropped; nothing to do then.
        let _ = tx.send(outcome);
    });

    BlobSignal { rx }
}
