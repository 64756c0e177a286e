//! CLI command implementations
//!
//! Every command works through a `FlashSession` over a boxed
//! `QspiController`, so the same code paths serve the emulator and real
//! hardware backends.

pub mod id;
pub mod read;
pub mod selftest;
pub mod verify;
