//! Exchange-buffer interpretation
//!
//! After a full-duplex transfer the response buffer holds the bytes the
//! device drove while the frame was clocked out: echo/garbage in the
//! command, address and dummy slots, then the payload.

use crate::error::{Error, Result};

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

/// Slice the payload out of an exchanged buffer
///
/// Returns `buf[offset..offset + len]`. A buffer too short for the
/// requested window is a caller-side contract failure, never an
/// out-of-bounds access.
pub fn extract_payload(buf: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    let end = offset.checked_add(len).ok_or(Error::ContractViolation)?;
    if buf.len() < end {
        return Err(Error::ContractViolation);
    }
    Ok(&buf[offset..end])
}

/// The raw result of a read exchange plus its computed payload window
///
/// Invariant: `payload() == raw()[offset .. offset + len]`, checked at
/// construction so the accessors cannot fail.
#[cfg(feature = "alloc")]
#[derive(Debug, Clone)]
pub struct ReadResult {
    buf: Vec<u8>,
    offset: usize,
    len: usize,
}

#[cfg(feature = "alloc")]
impl ReadResult {
    /// Wrap an exchanged buffer, validating the payload window
    pub fn new(buf: Vec<u8>, offset: usize, len: usize) -> Result<Self> {
        extract_payload(&buf, offset, len)?;
        Ok(Self { buf, offset, len })
    }

    /// The payload bytes, starting immediately after opcode, address and
    /// dummy slots
    pub fn payload(&self) -> &[u8] {
        &self.buf[self.offset..self.offset + self.len]
    }

    /// The complete exchanged buffer, including the command echo slots
    pub fn raw(&self) -> &[u8] {
        &self.buf
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the payload is empty (cannot happen for framed reads)
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Consume the result, returning just the payload
    pub fn into_payload(mut self) -> Vec<u8> {
        self.buf.drain(..self.offset);
        self.buf.truncate(self.len);
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_window_at_offset() {
        let buf: [u8; 20] = core::array::from_fn(|i| i as u8);
        let payload = extract_payload(&buf, 5, 10).unwrap();
        assert_eq!(payload, &buf[5..15]);
    }

    #[test]
    fn rejects_window_past_end() {
        let buf = [0u8; 20];
        assert_eq!(
            extract_payload(&buf, 5, 20).unwrap_err(),
            Error::ContractViolation
        );
    }

    #[test]
    fn rejects_overflowing_window() {
        let buf = [0u8; 8];
        assert_eq!(
            extract_payload(&buf, 4, usize::MAX).unwrap_err(),
            Error::ContractViolation
        );
    }

    #[cfg(feature = "alloc")]
    #[test]
    fn read_result_payload_matches_window() {
        let buf: Vec<u8> = (0u8..21).collect();
        let result = ReadResult::new(buf.clone(), 5, 16).unwrap();
        assert_eq!(result.payload(), &buf[5..21]);
        assert_eq!(result.raw(), &buf[..]);
        assert_eq!(result.into_payload(), buf[5..21].to_vec());
    }

    #[cfg(feature = "alloc")]
    #[test]
    fn read_result_rejects_short_buffer() {
        assert!(ReadResult::new(alloc::vec![0u8; 4], 5, 1).is_err());
    }
}
