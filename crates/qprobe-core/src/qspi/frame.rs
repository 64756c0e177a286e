//! Command frame construction

#[cfg(feature = "alloc")]
use super::opcodes;
#[cfg(feature = "alloc")]
use crate::error::{Error, Result};

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

/// Opcode byte plus 3-byte address (or filler for commands without one)
pub const CMD_OVERHEAD: usize = 4;
/// READ ID exchange length: the opcode-echo slot plus 3 identification bytes
pub const READ_ID_LEN: usize = 4;
/// Dummy bytes clocked after the address before quad-read data is valid
pub const DUMMY_LEN: usize = 1;
/// Index of the first payload byte in a quad-read exchange
pub const QUAD_READ_DATA_OFFSET: usize = CMD_OVERHEAD + DUMMY_LEN;
/// Mask applied to quad-read addresses (3-byte addressing)
pub const ADDR_MASK: u32 = 0x00FF_FFFF;

/// A framed flash command, owning the full-duplex write buffer
///
/// Byte layout: `[0]` opcode, `[1..=3]` 24-bit big-endian address (zero
/// filler for READ ID), then as many placeholder bytes as the exchange
/// needs to clock the response out. The transfer length always equals the
/// frame length.
#[cfg(feature = "alloc")]
#[derive(Debug)]
pub struct CommandFrame {
    buf: Vec<u8>,
}

#[cfg(feature = "alloc")]
impl CommandFrame {
    /// Frame a READ ID command: `[0x9F, 0x00, 0x00, 0x00]`
    ///
    /// The three zero bytes carry no request data; they exist to clock the
    /// manufacturer and device bytes out on the same cycles.
    pub fn read_id() -> Self {
        let mut buf = Vec::with_capacity(READ_ID_LEN);
        buf.push(opcodes::READ_ID);
        buf.resize(READ_ID_LEN, 0);
        Self { buf }
    }

    /// Frame a quad-output read of `byte_count` bytes at `address`
    ///
    /// The address is masked to 24 bits; anything above 0xFFFFFF is
    /// truncated, not rejected. After the opcode and address the frame
    /// carries `byte_count + 1` zero placeholder bytes: one dummy byte the
    /// command requires before valid data, then one slot per payload byte.
    ///
    /// `byte_count` must be greater than zero. There is no upper bound
    /// here; the controller's transfer limit governs that.
    pub fn quad_read(address: u32, byte_count: usize) -> Result<Self> {
        if byte_count == 0 {
            return Err(Error::ContractViolation);
        }

        let address = address & ADDR_MASK;
        let mut buf = Vec::with_capacity(CMD_OVERHEAD + byte_count + DUMMY_LEN);
        buf.push(opcodes::QUAD_READ);
        buf.push((address >> 16) as u8);
        buf.push((address >> 8) as u8);
        buf.push(address as u8);
        buf.resize(CMD_OVERHEAD + byte_count + DUMMY_LEN, 0);
        Ok(Self { buf })
    }

    /// The opcode this frame carries
    pub fn opcode(&self) -> u8 {
        self.buf[0]
    }

    /// The raw write buffer
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Total frame length in bytes
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Frames are never empty; present for slice-like API completeness
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Length the response buffer must have (equals the frame length)
    pub fn response_len(&self) -> usize {
        self.buf.len()
    }
}

#[cfg(all(test, feature = "alloc"))]
mod tests {
    use super::*;

    #[test]
    fn read_id_frame_layout() {
        let frame = CommandFrame::read_id();
        assert_eq!(frame.as_bytes(), &[0x9F, 0x00, 0x00, 0x00]);
        assert_eq!(frame.response_len(), READ_ID_LEN);
    }

    #[test]
    fn quad_read_frame_length_and_address() {
        let frame = CommandFrame::quad_read(0x12_34_56, 64).unwrap();
        assert_eq!(frame.len(), CMD_OVERHEAD + 64 + DUMMY_LEN);
        assert_eq!(frame.opcode(), 0x6B);
        assert_eq!(&frame.as_bytes()[1..4], &[0x12, 0x34, 0x56]);
        // placeholder tail is all zeros
        assert!(frame.as_bytes()[4..].iter().all(|&b| b == 0));
    }

    #[test]
    fn quad_read_single_byte() {
        let frame = CommandFrame::quad_read(0, 1).unwrap();
        assert_eq!(frame.len(), 6);
    }

    #[test]
    fn quad_read_masks_address_to_24_bits() {
        let frame = CommandFrame::quad_read(0xAB_10_00_00, 8).unwrap();
        assert_eq!(&frame.as_bytes()[1..4], &[0x10, 0x00, 0x00]);
    }

    #[test]
    fn quad_read_rejects_zero_length() {
        assert_eq!(
            CommandFrame::quad_read(0x1000, 0).unwrap_err(),
            Error::ContractViolation
        );
    }
}
