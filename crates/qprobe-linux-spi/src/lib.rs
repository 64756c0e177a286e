//! qprobe-linux-spi - Linux spidev QSPI controller backend
//!
//! Implements the [`qprobe_core::controller::QspiController`] contract over
//! `/dev/spidevX.Y`. The kernel driver owns chip select and bus timing, so
//! the option bits that exist for manual-chip-select controllers are
//! accepted as already satisfied here.

mod device;
mod error;

pub use device::{mode, parse_options, LinuxSpi, LinuxSpiConfig};
pub use error::{LinuxSpiError, Result};
