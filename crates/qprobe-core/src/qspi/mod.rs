//! QSPI flash command framing and exchange-buffer interpretation
//!
//! Frames are full-duplex: the write buffer and the response buffer have
//! the same length, and every response byte lines up with the write byte
//! clocked out on the same cycles.

mod exchange;
mod frame;
pub mod opcodes;

#[cfg(feature = "alloc")]
pub use exchange::ReadResult;
pub use exchange::extract_payload;
#[cfg(feature = "alloc")]
pub use frame::CommandFrame;
pub use frame::{ADDR_MASK, CMD_OVERHEAD, DUMMY_LEN, QUAD_READ_DATA_OFFSET, READ_ID_LEN};
