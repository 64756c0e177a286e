//! Flash command opcodes
//!
//! The probe only issues read-side commands; program and erase opcodes are
//! deliberately absent.

/// Read JEDEC ID (manufacturer + device bytes)
pub const READ_ID: u8 = 0x9F;
/// Quad Output Read (1-1-4): single-line command and address, quad data
pub const QUAD_READ: u8 = 0x6B;
