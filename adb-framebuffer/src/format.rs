//! Capture header layouts and packed-pixel conversion.
//!
//! A capture begins with a little-endian header whose leading 32-bit word
//! is a version tag:
//!
//! - **version 1**: 13 u32 fields - version, depth, size, width, height,
//!   then bit offset/length pairs for red, green, blue and alpha. Pixel
//!   data starts at byte 52.
//! - **version 16**: 4 u32 fields - version, size, width, height. The
//!   depth is fixed at 16 and the channel layout is fixed RGB565
//!   (red 11/5, green 5/6, blue 0/5, no alpha). Pixel data starts at
//!   byte 16.
//!
//! 16-bit captures are converted to 32-bit B,G,R,A output. Each channel is
//! extracted by shift-and-mask and normalized to 8 bits by a plain left
//! shift that leaves the low bits zero. Downstream consumers depend on
//! that exact normalization, so no bit replication is performed even
//! though it would be higher fidelity.

use thiserror::Error;

/// Buffered bytes required before a header parse is attempted.
pub const HEADER_MIN: usize = 16;

/// Byte length of a version 1 header (13 u32 fields).
pub const V1_HEADER_LEN: usize = 52;

/// Byte length of a version 16 header (4 u32 fields).
pub const V16_HEADER_LEN: usize = 16;

/// Errors produced while decoding a capture.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FramebufferError {
    /// The header's version tag is neither 1 nor 16.
    #[error("unsupported framebuffer version {0}")]
    UnsupportedVersion(u32),

    /// The capture was finalized before all pixel bytes arrived.
    #[error("capture incomplete: {have} of {need} pixel bytes")]
    Incomplete {
        /// Pixel bytes accumulated so far.
        have: usize,
        /// Pixel bytes the header declared.
        need: usize,
    },
}

/// Bit offset and bit count of one color channel within a packed pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelLayout {
    /// Bit position of the channel's least significant bit.
    pub offset: u32,
    /// Number of bits in the channel. Zero means the channel is absent.
    pub length: u32,
}

impl ChannelLayout {
    /// Create a channel layout.
    pub const fn new(offset: u32, length: u32) -> Self {
        Self { offset, length }
    }

    /// Extract this channel from a packed pixel value, normalized to
    /// 8 bits by a left shift (low bits stay zero; no bit replication).
    ///
    /// An absent channel (`length == 0`) extracts as 0.
    pub fn extract(&self, value: u32) -> u8 {
        if self.length == 0 {
            return 0;
        }
        let mask = (1u32 << self.length) - 1;
        let channel = (value >> self.offset) & mask;
        (channel << (8u32.saturating_sub(self.length))) as u8
    }
}

/// Decoded capture header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureHeader {
    /// Format version tag (1 or 16).
    pub version: u32,
    /// Color depth in bits per pixel.
    pub depth: u32,
    /// Declared pixel data size in bytes. Updated after conversion.
    pub size: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Red channel position.
    pub red: ChannelLayout,
    /// Green channel position.
    pub green: ChannelLayout,
    /// Blue channel position.
    pub blue: ChannelLayout,
    /// Alpha channel position (absent in version 16).
    pub alpha: ChannelLayout,
}

fn read_u32_le(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

impl CaptureHeader {
    /// Parse a header from the front of `buf`.
    ///
    /// `buf` must hold at least [`HEADER_MIN`] bytes (enough to read the
    /// version tag and every version 16 field). Returns the header and the
    /// number of bytes it occupied, or `Ok(None)` when the version needs a
    /// longer header than is buffered yet (version 1 needs
    /// [`V1_HEADER_LEN`] bytes) - the caller keeps accumulating.
    ///
    /// # Errors
    ///
    /// Returns [`FramebufferError::UnsupportedVersion`] for any version
    /// tag other than 1 or 16; the capture cannot be decoded.
    ///
    /// # Panics
    ///
    /// Panics if `buf` is shorter than [`HEADER_MIN`].
    pub fn parse(buf: &[u8]) -> Result<Option<(Self, usize)>, FramebufferError> {
        assert!(buf.len() >= HEADER_MIN, "header parse needs {} bytes", HEADER_MIN);

        let version = read_u32_le(buf, 0);
        match version {
            1 => {
                if buf.len() < V1_HEADER_LEN {
                    return Ok(None);
                }
                Ok(Some((
                    Self {
                        version,
                        depth: read_u32_le(buf, 4),
                        size: read_u32_le(buf, 8),
                        width: read_u32_le(buf, 12),
                        height: read_u32_le(buf, 16),
                        red: ChannelLayout::new(read_u32_le(buf, 20), read_u32_le(buf, 24)),
                        green: ChannelLayout::new(read_u32_le(buf, 28), read_u32_le(buf, 32)),
                        blue: ChannelLayout::new(read_u32_le(buf, 36), read_u32_le(buf, 40)),
                        alpha: ChannelLayout::new(read_u32_le(buf, 44), read_u32_le(buf, 48)),
                    },
                    V1_HEADER_LEN,
                )))
            }
            16 => Ok(Some((
                Self {
                    version,
                    depth: 16,
                    size: read_u32_le(buf, 4),
                    width: read_u32_le(buf, 8),
                    height: read_u32_le(buf, 12),
                    // Legacy captures are always RGB565.
                    red: ChannelLayout::new(11, 5),
                    green: ChannelLayout::new(5, 6),
                    blue: ChannelLayout::new(0, 5),
                    alpha: ChannelLayout::new(0, 0),
                },
                V16_HEADER_LEN,
            ))),
            other => Err(FramebufferError::UnsupportedVersion(other)),
        }
    }
}

/// Convert packed 16-bit little-endian pixels to 32-bit B,G,R,A bytes.
///
/// Alpha is 0 when the header has no alpha channel (always the case for
/// version 16 captures).
pub fn convert_to_bgra(header: &CaptureHeader, pixels: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixels.len() * 2);
    for pair in pixels.chunks_exact(2) {
        let value = u16::from_le_bytes([pair[0], pair[1]]) as u32;
        out.push(header.blue.extract(value));
        out.push(header.green.extract(value));
        out.push(header.red.extract(value));
        out.push(header.alpha.extract(value));
    }
    out
}
