//! Length-prefixed command framing for the ADB host protocol.
//!
//! Every logical unit ("frame") on a host connection is a payload length
//! encoded as 4 uppercase hex ASCII digits in big-endian nibble order,
//! followed by exactly that many raw bytes. Replies open with a 4-byte
//! status line (`OKAY` or `FAIL`) before any frames.
//!
//! The functions here are pure: they never perform I/O. [`split_frames`]
//! and [`split_one`] consume complete frames from the front of a caller
//! owned [`BytesMut`] and leave any incomplete trailing frame in place,
//! to be retried once more bytes have been appended. A partial trailing
//! frame is therefore never lost, no matter how the transport fragments
//! deliveries.
//!
//! # Examples
//!
//! ```
//! use adb_protocol::framing;
//! use bytes::BytesMut;
//!
//! let encoded = framing::encode_frame(b"host:devices").unwrap();
//! assert_eq!(&encoded[..4], b"000C");
//!
//! let mut buffer = BytesMut::from(&encoded[..]);
//! let frames = framing::split_frames(&mut buffer).unwrap();
//! assert_eq!(&frames[0][..], b"host:devices");
//! assert!(buffer.is_empty());
//! ```

use bytes::{Buf, Bytes, BytesMut};
use thiserror::Error;

/// Maximum frame payload length encodable in a 4-digit hex prefix.
pub const MAX_PAYLOAD: usize = 0xFFFF;

/// Byte length of the hex length prefix (and of a status line).
pub const PREFIX_LEN: usize = 4;

/// Errors produced by the framing codec.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FramingError {
    /// Payload too large to encode in a 4-digit hex length.
    #[error("payload of {0} bytes exceeds the 65535 byte frame limit")]
    PayloadTooLarge(usize),

    /// A length prefix contained a byte that is not a hex digit.
    #[error("invalid hex digit 0x{0:02x} in length prefix")]
    InvalidHexDigit(u8),

    /// A status line was neither `OKAY` nor `FAIL`.
    #[error("unknown status line {:?}", String::from_utf8_lossy(.0))]
    UnknownStatus([u8; 4]),
}

/// Reply status preceding the frames of a daemon reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Command accepted; zero or more frames follow.
    Okay,
    /// Command rejected; exactly one frame with the error message follows.
    Fail,
}

/// Encode a payload as one frame: 4 uppercase hex digits, then the bytes.
///
/// # Errors
///
/// Returns [`FramingError::PayloadTooLarge`] if the payload does not fit
/// the 16-bit length field.
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>, FramingError> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FramingError::PayloadTooLarge(payload.len()));
    }
    let mut frame = Vec::with_capacity(PREFIX_LEN + payload.len());
    frame.extend_from_slice(format!("{:04X}", payload.len()).as_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Decode a 4-digit hex length prefix.
///
/// Lowercase digits are accepted (the daemon emits uppercase).
///
/// # Errors
///
/// Returns [`FramingError::InvalidHexDigit`] on the first non-hex byte.
pub fn decode_length(prefix: &[u8; PREFIX_LEN]) -> Result<u16, FramingError> {
    let mut length: u16 = 0;
    for &byte in prefix {
        let digit = (byte as char)
            .to_digit(16)
            .ok_or(FramingError::InvalidHexDigit(byte))?;
        length = (length << 4) | digit as u16;
    }
    Ok(length)
}

/// Split one complete frame off the front of `buffer`, if present.
///
/// Returns `Ok(None)` when the buffer holds less than a full frame; the
/// buffered bytes are left untouched for the caller to extend and retry.
///
/// # Errors
///
/// Returns [`FramingError::InvalidHexDigit`] if the length prefix is
/// malformed (the buffer is left as-is; the connection is beyond repair
/// at that point).
pub fn split_one(buffer: &mut BytesMut) -> Result<Option<Bytes>, FramingError> {
    if buffer.len() < PREFIX_LEN {
        return Ok(None);
    }
    let mut prefix = [0u8; PREFIX_LEN];
    prefix.copy_from_slice(&buffer[..PREFIX_LEN]);
    let length = decode_length(&prefix)? as usize;
    if buffer.len() < PREFIX_LEN + length {
        return Ok(None);
    }
    buffer.advance(PREFIX_LEN);
    Ok(Some(buffer.split_to(length).freeze()))
}

/// Split every complete frame off the front of `buffer`.
///
/// The remainder (an incomplete trailing frame, if any) stays in `buffer`
/// so the caller can append the next delivery and call again.
pub fn split_frames(buffer: &mut BytesMut) -> Result<Vec<Bytes>, FramingError> {
    let mut frames = Vec::new();
    while let Some(frame) = split_one(buffer)? {
        frames.push(frame);
    }
    Ok(frames)
}

/// Parse the 4-byte status line that opens every daemon reply.
///
/// # Errors
///
/// Returns [`FramingError::UnknownStatus`] for anything that is not
/// `OKAY` or `FAIL` - the client and daemon have lost sync.
pub fn parse_status(line: &[u8; PREFIX_LEN]) -> Result<Status, FramingError> {
    match line {
        b"OKAY" => Ok(Status::Okay),
        b"FAIL" => Ok(Status::Fail),
        other => Err(FramingError::UnknownStatus(*other)),
    }
}
