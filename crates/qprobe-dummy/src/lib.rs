//! qprobe-dummy - In-memory QSPI controller emulator for testing
//!
//! This crate provides a dummy controller that emulates a NOR flash
//! behind a QSPI bus, full-duplex semantics included: response byte 0
//! echoes the opcode, identification bytes come back shifted by that echo
//! slot, and opcodes the emulated device does not understand float the bus
//! high (0xFF), the way an unwired chip select reads. Useful for exercising
//! the harness and the session logic without hardware.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
use alloc::vec;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use qprobe_core::controller::{
    ClockPrescaler, ControllerOptions, DeviceSelector, QspiController,
};
use qprobe_core::error::{Error, Result};
use qprobe_core::id::capacity_bytes;
use qprobe_core::qspi::{opcodes, ADDR_MASK, CMD_OVERHEAD, DUMMY_LEN};

/// Platform device id the emulated controller answers to
pub const DEVICE_ID: u16 = 0;
/// Peripheral base address the emulated controller answers to
pub const BASE_ADDR: usize = 0x4000_0000;

/// Configuration for the emulated flash device
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// JEDEC manufacturer code
    pub manufacturer_id: u8,
    /// Device-family byte (second identification byte)
    pub device_type: u8,
    /// Capacity-class code (third identification byte)
    pub capacity_class: u8,
    /// Emulated image size in bytes
    pub size: usize,
}

impl Default for DummyConfig {
    fn default() -> Self {
        // Winbond, 32 Mbit part
        let capacity_class = 0x15;
        Self {
            manufacturer_id: 0xEF,
            device_type: 0x40,
            capacity_class,
            size: capacity_bytes(capacity_class).unwrap_or(0) as usize,
        }
    }
}

/// Emulated QSPI controller with an in-memory NOR image
#[cfg(feature = "alloc")]
pub struct DummyController {
    config: DummyConfig,
    data: Vec<u8>,
    options: ControllerOptions,
    prescaler: ClockPrescaler,
    selected: bool,
    fail_transfers: usize,
}

#[cfg(feature = "alloc")]
impl DummyController {
    /// Open the emulated controller
    ///
    /// Accepts [`DEVICE_ID`] or [`BASE_ADDR`]; anything else fails with
    /// `DeviceNotFound`, the same way a platform lookup would.
    pub fn open(selector: DeviceSelector) -> Result<Self> {
        Self::open_with_config(selector, DummyConfig::default())
    }

    /// Open with an explicit device configuration
    pub fn open_with_config(selector: DeviceSelector, config: DummyConfig) -> Result<Self> {
        match selector {
            DeviceSelector::ById(DEVICE_ID) => {}
            DeviceSelector::ByAddress(BASE_ADDR) => {}
            other => {
                log::debug!("dummy: no controller at {:?}", other);
                return Err(Error::DeviceNotFound);
            }
        }

        let data = vec![0xFF; config.size];
        Ok(Self {
            config,
            data,
            options: ControllerOptions::empty(),
            prescaler: ClockPrescaler::default(),
            selected: false,
            fail_transfers: 0,
        })
    }

    /// The emulated device configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// The emulated flash image
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access to the image, for seeding test content
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Make the next `n` transfers fail with `TransferFailed`
    pub fn fail_next_transfers(&mut self, n: usize) {
        self.fail_transfers = n;
    }

    fn respond_read_id(&self, read: &mut [u8]) {
        let id = [
            self.config.manufacturer_id,
            self.config.device_type,
            self.config.capacity_class,
        ];
        for (slot, byte) in read.iter_mut().skip(1).zip(id) {
            *slot = byte;
        }
    }

    fn respond_quad_read(&self, write: &[u8], read: &mut [u8]) {
        if write.len() < CMD_OVERHEAD + DUMMY_LEN {
            // malformed frame; leave the bus floating
            return;
        }

        // echo the address slots like the opcode slot
        read[1..CMD_OVERHEAD].copy_from_slice(&write[1..CMD_OVERHEAD]);

        let address = (u32::from(write[1]) << 16 | u32::from(write[2]) << 8 | u32::from(write[3]))
            & ADDR_MASK;

        let payload = &mut read[CMD_OVERHEAD + DUMMY_LEN..];
        for (i, slot) in payload.iter_mut().enumerate() {
            // out-of-image addresses read erased, like real parts past
            // their last sector
            *slot = *self
                .data
                .get(address as usize + i)
                .unwrap_or(&0xFF);
        }
    }
}

#[cfg(feature = "alloc")]
impl QspiController for DummyController {
    fn set_clock_prescaler(&mut self, prescaler: ClockPrescaler) -> Result<()> {
        self.prescaler = prescaler;
        Ok(())
    }

    fn set_options(&mut self, options: ControllerOptions) -> Result<()> {
        self.options = options;
        Ok(())
    }

    fn options(&self) -> ControllerOptions {
        self.options
    }

    fn select_slave(&mut self) -> Result<()> {
        self.selected = true;
        Ok(())
    }

    fn transfer(&mut self, write: &[u8], read: &mut [u8]) -> Result<()> {
        if self.fail_transfers > 0 {
            self.fail_transfers -= 1;
            log::debug!("dummy: injected transfer failure");
            return Err(Error::TransferFailed);
        }
        if write.len() != read.len() || write.is_empty() {
            return Err(Error::ContractViolation);
        }
        if self.options.contains(ControllerOptions::FORCE_SLAVE_SELECT) && !self.selected {
            log::debug!("dummy: transfer without chip select asserted");
            return Err(Error::TransferFailed);
        }

        // bus idles high; byte 0 is the opcode echo slot
        read.fill(0xFF);
        read[0] = write[0];

        match write[0] {
            opcodes::READ_ID => self.respond_read_id(read),
            opcodes::QUAD_READ => self.respond_quad_read(write, read),
            _ => {
                // not a command the emulated flash decodes; the 0xFF fill
                // stands
                log::trace!("dummy: ignoring opcode 0x{:02X}", write[0]);
            }
        }

        Ok(())
    }

    fn max_transfer_len(&self) -> usize {
        4096
    }
}

#[cfg(all(test, feature = "alloc"))]
mod tests {
    use super::*;
    use qprobe_core::id::Manufacturer;
    use qprobe_core::session::{FlashSession, SessionConfig};

    fn open_session() -> FlashSession<DummyController> {
        let controller = DummyController::open(DeviceSelector::ById(DEVICE_ID)).unwrap();
        FlashSession::open(controller, &SessionConfig::default()).unwrap()
    }

    #[test]
    fn open_rejects_unknown_selectors() {
        assert!(matches!(
            DummyController::open(DeviceSelector::ById(7)).err(),
            Some(Error::DeviceNotFound)
        ));
        assert!(matches!(
            DummyController::open(DeviceSelector::ByAddress(0x1000)).err(),
            Some(Error::DeviceNotFound)
        ));
        assert!(DummyController::open(DeviceSelector::ByAddress(BASE_ADDR)).is_ok());
    }

    #[test]
    fn identifies_as_configured_device() {
        let mut session = open_session();
        let identity = session.identify().unwrap();
        assert_eq!(identity.manufacturer, Manufacturer::Winbond);
        assert_eq!(identity.capacity_class, 0x15);
        assert_eq!(identity.capacity_bytes, 4 * 1024 * 1024);
    }

    #[test]
    fn reads_back_seeded_image() {
        let mut controller = DummyController::open(DeviceSelector::ById(DEVICE_ID)).unwrap();

        let pattern: Vec<u8> = (0..64).map(|i| 0xAA_u8.wrapping_add(i)).collect();
        let base = 0x10_0000;
        controller.data_mut()[base..base + pattern.len()].copy_from_slice(&pattern);

        let mut session = FlashSession::open(controller, &SessionConfig::default()).unwrap();
        let result = session.read(base as u32, pattern.len()).unwrap();
        assert_eq!(result.payload(), &pattern[..]);
    }

    #[test]
    fn reads_past_image_end_as_erased() {
        let mut session = open_session();
        let size = session.controller().config().size as u32;
        let result = session.read(size - 2, 4).unwrap();
        assert_eq!(result.payload(), &[0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn injected_failure_surfaces_and_clears() {
        let mut controller = DummyController::open(DeviceSelector::ById(DEVICE_ID)).unwrap();
        controller.fail_next_transfers(1);
        let mut session = FlashSession::open(controller, &SessionConfig::default()).unwrap();

        assert_eq!(session.read(0, 4).unwrap_err(), Error::TransferFailed);
        assert!(session.identity().is_none());

        // the fault was one-shot; the same session keeps working
        let identity = session.identify().unwrap();
        assert_eq!(identity.manufacturer, Manufacturer::Winbond);
    }

    #[test]
    fn unknown_opcodes_float_the_bus_high() {
        let mut session = open_session();
        let received = session.exchange_raw(&[0xAA, 0xBB, 0xCC, 0xDD]).unwrap();
        assert_eq!(received[0], 0xAA);
        assert_eq!(&received[1..], &[0xFF, 0xFF, 0xFF]);
    }
}
