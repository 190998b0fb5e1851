//! Accumulation of capture deliveries into a finished framebuffer.

use crate::format::{self, CaptureHeader, FramebufferError, HEADER_MIN};
use bytes::{Buf, BytesMut};
use std::fmt;

/// Accumulates raw socket deliveries of one capture.
///
/// Feed every delivery to [`extend`](Self::extend). The header is parsed
/// as soon as enough bytes have arrived; the capture is finished once the
/// accumulated pixel bytes match the declared size. 16-bit captures are
/// converted to 32-bit B,G,R,A at that point and the declared size is
/// updated to the converted length.
///
/// # Examples
///
/// ```
/// use adb_framebuffer::CaptureBuffer;
///
/// // version 16, 2 bytes of pixel data, 1x1
/// let mut delivery = Vec::new();
/// for field in [16u32, 2, 1, 1] {
///     delivery.extend_from_slice(&field.to_le_bytes());
/// }
/// delivery.extend_from_slice(&0xF800u16.to_le_bytes());
///
/// let mut capture = CaptureBuffer::new();
/// capture.extend(&delivery).unwrap();
/// assert!(capture.is_finished());
///
/// let frame = capture.into_framebuffer().unwrap();
/// assert_eq!(frame.pixels(), &[0, 0, 248, 0]);
/// ```
#[derive(Debug, Default)]
pub struct CaptureBuffer {
    header: Option<CaptureHeader>,
    pixels: BytesMut,
    converted: bool,
}

impl CaptureBuffer {
    /// Create an empty capture buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one raw delivery.
    ///
    /// # Errors
    ///
    /// Returns [`FramebufferError::UnsupportedVersion`] once enough bytes
    /// have arrived to read an unrecognized version tag. The capture must
    /// be abandoned; no partial image is surfaced.
    pub fn extend(&mut self, delivery: &[u8]) -> Result<(), FramebufferError> {
        self.pixels.extend_from_slice(delivery);

        if self.header.is_none() && self.pixels.len() >= HEADER_MIN {
            if let Some((header, consumed)) = CaptureHeader::parse(&self.pixels)? {
                self.pixels.advance(consumed);
                self.header = Some(header);
            }
        }

        if let Some(header) = &mut self.header {
            if !self.converted
                && header.depth == 16
                && self.pixels.len() == header.size as usize
            {
                let bgra = format::convert_to_bgra(header, &self.pixels);
                header.size = bgra.len() as u32;
                self.pixels = BytesMut::from(&bgra[..]);
                self.converted = true;
            }
        }

        Ok(())
    }

    /// The parsed header, once enough bytes have arrived.
    pub fn header(&self) -> Option<&CaptureHeader> {
        self.header.as_ref()
    }

    /// True once the accumulated pixel bytes match the declared size
    /// (post-conversion for 16-bit captures).
    pub fn is_finished(&self) -> bool {
        self.header.as_ref().is_some_and(|header| {
            self.pixels.len() == header.size as usize
                && (header.depth != 16 || self.converted)
        })
    }

    /// Finalize into a [`Framebuffer`].
    ///
    /// # Errors
    ///
    /// Returns [`FramebufferError::Incomplete`] if called before the
    /// capture finished.
    pub fn into_framebuffer(self) -> Result<Framebuffer, FramebufferError> {
        if !self.is_finished() {
            let need = self.header.as_ref().map_or(HEADER_MIN, |h| h.size as usize);
            return Err(FramebufferError::Incomplete {
                have: self.pixels.len(),
                need,
            });
        }
        // is_finished demands a header
        let header = self.header.ok_or(FramebufferError::Incomplete {
            have: 0,
            need: HEADER_MIN,
        })?;
        Ok(Framebuffer {
            header,
            converted: self.converted,
            pixels: self.pixels.freeze().to_vec(),
        })
    }
}

/// A finished screen capture.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    header: CaptureHeader,
    converted: bool,
    pixels: Vec<u8>,
}

impl Framebuffer {
    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.header.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.header.height
    }

    /// Color depth of the capture as delivered by the device.
    pub fn depth(&self) -> u32 {
        self.header.depth
    }

    /// The capture header.
    pub fn header(&self) -> &CaptureHeader {
        &self.header
    }

    /// True if the pixel bytes were converted from packed 16-bit to
    /// 32-bit B,G,R,A.
    pub fn is_converted(&self) -> bool {
        self.converted
    }

    /// The pixel bytes: B,G,R,A after conversion, the device's own layout
    /// otherwise.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Pixel bytes in R,G,B,A order for handing to an image encoder.
    ///
    /// Converted captures swap blue and red back; 32-bit captures are
    /// passed through unchanged, as the device already delivers them in
    /// encoder order.
    pub fn to_rgba(&self) -> Vec<u8> {
        if !self.converted {
            return self.pixels.clone();
        }
        let mut rgba = self.pixels.clone();
        for pixel in rgba.chunks_exact_mut(4) {
            pixel.swap(0, 2);
        }
        rgba
    }
}

impl fmt::Display for Framebuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}@{} frame with {} bytes",
            self.header.width,
            self.header.height,
            self.header.depth,
            self.pixels.len()
        )
    }
}
