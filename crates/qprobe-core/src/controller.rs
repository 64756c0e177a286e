//! QSPI controller contract
//!
//! The controller is an external collaborator: register-level bring-up,
//! clocking and chip-select wiring all live behind [`QspiController`].
//! Backends implement it over whatever bus access they have (spidev, an
//! in-memory emulator, ...). A controller handle is an owned, non-Clone
//! value; exclusive ownership is what makes the single-threaded blocking
//! model safe.

use crate::error::Result;
use bitflags::bitflags;

bitflags! {
    /// Controller option bits, applied once at session open
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ControllerOptions: u32 {
        /// Chip select must be asserted manually before each transfer
        const FORCE_SLAVE_SELECT = 1 << 0;
        /// Keep the HOLD line driven high for the whole session
        const HOLD_DRIVE         = 1 << 1;
        /// Transfers require an explicit start trigger
        const MANUAL_START       = 1 << 2;
    }
}

impl Default for ControllerOptions {
    fn default() -> Self {
        ControllerOptions::empty()
    }
}

/// Bus clock prescaler, a power-of-two divisor of the controller's
/// reference clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockPrescaler {
    /// Divide by 2
    Div2,
    /// Divide by 4
    Div4,
    /// Divide by 8
    #[default]
    Div8,
    /// Divide by 16
    Div16,
    /// Divide by 32
    Div32,
    /// Divide by 64
    Div64,
    /// Divide by 128
    Div128,
    /// Divide by 256
    Div256,
}

impl ClockPrescaler {
    /// The divisor value
    pub const fn divisor(self) -> u32 {
        match self {
            Self::Div2 => 2,
            Self::Div4 => 4,
            Self::Div8 => 8,
            Self::Div16 => 16,
            Self::Div32 => 32,
            Self::Div64 => 64,
            Self::Div128 => 128,
            Self::Div256 => 256,
        }
    }
}

/// How to locate a controller instance at open time
///
/// One runtime value covers both addressing shapes platforms use, so a
/// single open code path serves either.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceSelector {
    /// Select by platform device id
    ById(u16),
    /// Select by peripheral base address
    ByAddress(usize),
}

/// A synchronous, blocking QSPI controller
///
/// [`transfer`](Self::transfer) is the only data-path operation: a
/// full-duplex exchange of equal-length buffers that blocks until the bus
/// completes or fails. A failed transfer is terminal for the current
/// operation; retrying is the caller's decision.
pub trait QspiController {
    /// Program the bus clock prescaler
    fn set_clock_prescaler(&mut self, prescaler: ClockPrescaler) -> Result<()>;

    /// Apply controller option bits
    ///
    /// Returns [`UnsupportedOption`](crate::Error::UnsupportedOption) when
    /// the backend cannot honor a requested bit.
    fn set_options(&mut self, options: ControllerOptions) -> Result<()>;

    /// The currently applied option bits
    fn options(&self) -> ControllerOptions;

    /// Assert chip select ahead of a transfer
    ///
    /// Only meaningful when [`FORCE_SLAVE_SELECT`](ControllerOptions::FORCE_SLAVE_SELECT)
    /// is in effect; backends where the bus driver handles chip select per
    /// exchange treat this as a no-op.
    fn select_slave(&mut self) -> Result<()>;

    /// Exchange `write` for `read` over the bus, full-duplex
    ///
    /// Both buffers must have the same length. Blocks until the exchange
    /// completes; there is no cancellation.
    fn transfer(&mut self, write: &[u8], read: &mut [u8]) -> Result<()>;

    /// Largest exchange this controller can do in one transfer
    fn max_transfer_len(&self) -> usize;
}

// Blanket impl so the CLI can hold backends as trait objects
#[cfg(feature = "alloc")]
impl QspiController for alloc::boxed::Box<dyn QspiController> {
    fn set_clock_prescaler(&mut self, prescaler: ClockPrescaler) -> Result<()> {
        (**self).set_clock_prescaler(prescaler)
    }

    fn set_options(&mut self, options: ControllerOptions) -> Result<()> {
        (**self).set_options(options)
    }

    fn options(&self) -> ControllerOptions {
        (**self).options()
    }

    fn select_slave(&mut self) -> Result<()> {
        (**self).select_slave()
    }

    fn transfer(&mut self, write: &[u8], read: &mut [u8]) -> Result<()> {
        (**self).transfer(write, read)
    }

    fn max_transfer_len(&self) -> usize {
        (**self).max_transfer_len()
    }
}
