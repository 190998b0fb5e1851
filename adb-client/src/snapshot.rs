//! Framebuffer capture and image-file output.

use crate::devices::Device;
use crate::errors::AdbError;
use adb_framebuffer::{CaptureBuffer, Framebuffer};
use std::path::Path;

impl Device<'_> {
    /// Capture a raw framebuffer snapshot of the device's screen.
    ///
    /// Opens a transport-bound connection, issues `framebuffer:` and
    /// accumulates the reply until the declared pixel size has arrived.
    /// Legacy 16-bit captures come back already converted to 32-bit
    /// B,G,R,A (see [`adb_framebuffer::format`]).
    pub async fn take_snapshot(&self) -> Result<Framebuffer, AdbError> {
        let mut session = self.bind().await?;
        session.send_command("framebuffer:").await?;
        session.await_status().await?;

        let mut capture = CaptureBuffer::new();
        while !capture.is_finished() {
            let delivery = session
                .read_chunk()
                .await?
                .ok_or_else(|| AdbError::Protocol("connection closed mid-capture".to_string()))?;
            capture.extend(&delivery)?;
        }

        let frame = capture.into_framebuffer()?;
        tracing::info!(%frame, "capture finished");
        Ok(frame)
    }
}

/// Encode a finished capture to an image file.
///
/// The output format is keyed by the target extension: `.png`, `.jpg` /
/// `.jpeg` or `.gif`. Encoding itself is delegated to the `image` crate;
/// this function only reorders the capture into the encoder's expected
/// R,G,B,A layout (JPEG has no alpha channel, so it gets plain R,G,B).
///
/// # Errors
///
/// - [`AdbError::UnsupportedImageFormat`] for any other extension
/// - [`AdbError::ImageEncoding`] if the codec rejects the buffer
pub fn write_image_file(frame: &Framebuffer, path: &Path) -> Result<(), AdbError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    tracing::debug!(
        "encoding {}x{} capture to {}",
        frame.width(),
        frame.height(),
        path.display()
    );

    let rgba = frame.to_rgba();
    match extension.as_str() {
        "png" | "gif" => image::save_buffer(
            path,
            &rgba,
            frame.width(),
            frame.height(),
            image::ColorType::Rgba8,
        )
        .map_err(|e| AdbError::ImageEncoding(e.to_string())),
        "jpg" | "jpeg" => {
            let rgb: Vec<u8> = rgba
                .chunks_exact(4)
                .flat_map(|pixel| [pixel[0], pixel[1], pixel[2]])
                .collect();
            image::save_buffer(
                path,
                &rgb,
                frame.width(),
                frame.height(),
                image::ColorType::Rgb8,
            )
            .map_err(|e| AdbError::ImageEncoding(e.to_string()))
        }
        other => Err(AdbError::UnsupportedImageFormat(other.to_string())),
    }
}
