//! Flash session orchestration
//!
//! A [`FlashSession`] owns an opened controller and sequences
//! frame -> transfer -> decode for each logical operation. Identification
//! results live on the session, not in globals, so independent sessions
//! (hardware, emulated, tests) never share state.

use crate::controller::{ClockPrescaler, ControllerOptions, QspiController};
use crate::error::{Error, Result};
use crate::id::{self, FlashIdentity};
use crate::qspi::{CommandFrame, ReadResult, QUAD_READ_DATA_OFFSET};

use alloc::vec;
use alloc::vec::Vec;

/// Bus configuration applied when a session opens
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Bus clock prescaler
    pub prescaler: ClockPrescaler,
    /// Controller option bits
    pub options: ControllerOptions,
}

impl Default for SessionConfig {
    /// The bring-up configuration: clock at reference/8, manual chip
    /// select, HOLD line driven high
    fn default() -> Self {
        Self {
            prescaler: ClockPrescaler::Div8,
            options: ControllerOptions::FORCE_SLAVE_SELECT | ControllerOptions::HOLD_DRIVE,
        }
    }
}

/// An open flash session over an exclusively owned controller
///
/// Operations run strictly sequentially: framing precedes the transfer,
/// the transfer precedes decoding. A failed transfer surfaces immediately
/// and leaves the session state untouched; nothing here retries.
pub struct FlashSession<C: QspiController> {
    controller: C,
    identity: Option<FlashIdentity>,
    manual_chip_select: bool,
}

impl<C: QspiController> FlashSession<C> {
    /// Configure the controller and open a session over it
    ///
    /// Applies the prescaler and option bits, then asserts chip select
    /// once when manual chip select is requested. Any collaborator failure
    /// propagates and no session is produced.
    pub fn open(mut controller: C, config: &SessionConfig) -> Result<Self> {
        controller.set_clock_prescaler(config.prescaler)?;
        controller.set_options(config.options)?;

        // Captured once here; checked before every transfer instead of
        // re-querying the option bitmask each call.
        let manual_chip_select = config
            .options
            .contains(ControllerOptions::FORCE_SLAVE_SELECT);
        if manual_chip_select {
            controller.select_slave()?;
        }

        log::debug!(
            "session opened: clock /{}  options {:?}",
            config.prescaler.divisor(),
            config.options
        );

        Ok(Self {
            controller,
            identity: None,
            manual_chip_select,
        })
    }

    /// The identity stored by the last successful [`identify`](Self::identify)
    pub fn identity(&self) -> Option<&FlashIdentity> {
        self.identity.as_ref()
    }

    /// Borrow the underlying controller
    pub fn controller(&self) -> &C {
        &self.controller
    }

    /// Largest payload a single [`read`](Self::read) can carry on this
    /// controller
    pub fn max_read_len(&self) -> usize {
        self.controller
            .max_transfer_len()
            .saturating_sub(QUAD_READ_DATA_OFFSET)
    }

    /// Run a READ ID exchange and decode the result
    ///
    /// On success the identity is stored on the session and returned. On
    /// transfer failure the previously stored identity (if any) is kept.
    pub fn identify(&mut self) -> Result<FlashIdentity> {
        let frame = CommandFrame::read_id();
        let response = self.exchange(frame.as_bytes())?;

        log::debug!("raw ID exchange: {:02X?}", &response[..]);

        let identity = id::decode_identity(&response)?;
        log::info!(
            "flash: {}  {} Mbit ({} bytes, class 0x{:02X})",
            identity.manufacturer,
            identity.capacity_mbits(),
            identity.capacity_bytes,
            identity.capacity_class
        );

        self.identity = Some(identity);
        Ok(identity)
    }

    /// Quad-read `len` bytes starting at `address`
    ///
    /// Valid whether or not the session has identified the device;
    /// identification is informational, not a hardware precondition. On
    /// transfer failure no partial payload is returned and the session is
    /// unchanged.
    pub fn read(&mut self, address: u32, len: usize) -> Result<ReadResult> {
        let frame = CommandFrame::quad_read(address, len)?;
        let response = self.exchange(frame.as_bytes())?;
        ReadResult::new(response, QUAD_READ_DATA_OFFSET, len)
    }

    /// Exchange an arbitrary pattern over the bus, full-duplex
    ///
    /// Diagnostic escape hatch: sends exactly the bytes given and returns
    /// whatever the bus clocked back, with the same chip-select handling
    /// as framed operations. The pattern must not be empty.
    pub fn exchange_raw(&mut self, write: &[u8]) -> Result<Vec<u8>> {
        if write.is_empty() {
            return Err(Error::ContractViolation);
        }
        self.exchange(write)
    }

    /// Close the session, handing the controller back
    ///
    /// Consuming `self` makes a second close unrepresentable; dropping the
    /// returned controller releases the bus.
    pub fn close(self) -> C {
        self.controller
    }

    fn exchange(&mut self, write: &[u8]) -> Result<Vec<u8>> {
        if self.manual_chip_select {
            self.controller.select_slave()?;
        }
        let mut response = vec![0u8; write.len()];
        self.controller.transfer(write, &mut response)?;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::Manufacturer;
    use alloc::collections::VecDeque;

    /// Scripted controller: hands out canned responses in order and
    /// records every write it sees.
    struct MockController {
        responses: VecDeque<Vec<u8>>,
        writes: Vec<Vec<u8>>,
        options: ControllerOptions,
        prescaler: Option<ClockPrescaler>,
        selects: usize,
        fail_transfers: usize,
    }

    impl MockController {
        fn new(responses: &[&[u8]]) -> Self {
            Self {
                responses: responses.iter().map(|r| r.to_vec()).collect(),
                writes: Vec::new(),
                options: ControllerOptions::empty(),
                prescaler: None,
                selects: 0,
                fail_transfers: 0,
            }
        }

        fn failing(n: usize) -> Self {
            let mut mock = Self::new(&[]);
            mock.fail_transfers = n;
            mock
        }
    }

    impl QspiController for MockController {
        fn set_clock_prescaler(&mut self, prescaler: ClockPrescaler) -> Result<()> {
            self.prescaler = Some(prescaler);
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
            self.selects += 1;
            Ok(())
        }

        fn transfer(&mut self, write: &[u8], read: &mut [u8]) -> Result<()> {
            if self.fail_transfers > 0 {
                self.fail_transfers -= 1;
                return Err(Error::TransferFailed);
            }
            assert_eq!(write.len(), read.len(), "exchange buffers must match");
            self.writes.push(write.to_vec());
            let response = self.responses.pop_front().expect("unscripted transfer");
            assert_eq!(response.len(), read.len(), "scripted response length");
            read.copy_from_slice(&response);
            Ok(())
        }

        fn max_transfer_len(&self) -> usize {
            4096
        }
    }

    #[test]
    fn open_applies_bus_configuration() {
        let mock = MockController::new(&[]);
        let session = FlashSession::open(mock, &SessionConfig::default()).unwrap();
        let controller = session.close();
        assert_eq!(controller.prescaler, Some(ClockPrescaler::Div8));
        assert!(controller
            .options
            .contains(ControllerOptions::FORCE_SLAVE_SELECT | ControllerOptions::HOLD_DRIVE));
        // chip select asserted once at open
        assert_eq!(controller.selects, 1);
    }

    #[test]
    fn identify_decodes_and_stores_identity() {
        let mock = MockController::new(&[&[0x9F, 0xEF, 0x00, 0x18]]);
        let mut session = FlashSession::open(mock, &SessionConfig::default()).unwrap();

        let identity = session.identify().unwrap();
        assert_eq!(identity.manufacturer, Manufacturer::Winbond);
        assert_eq!(identity.capacity_bytes, 32 * 1024 * 1024);
        assert_eq!(session.identity(), Some(&identity));

        let controller = session.close();
        assert_eq!(controller.writes[0], &[0x9F, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn end_to_end_identify_then_read() {
        let mut quad_response = vec![0x6B, 0x10, 0x00, 0x00, 0x00];
        let payload: Vec<u8> = (0xA0u8..0xB0).collect();
        quad_response.extend_from_slice(&payload);
        assert_eq!(quad_response.len(), 21);

        let mock = MockController::new(&[&[0x9F, 0xEF, 0x00, 0x18], quad_response.as_slice()]);
        let mut session = FlashSession::open(mock, &SessionConfig::default()).unwrap();

        let identity = session.identify().unwrap();
        assert_eq!(identity.manufacturer, Manufacturer::Winbond);

        let result = session.read(0x10_0000, 16).unwrap();
        assert_eq!(result.payload(), &payload[..]);
        assert_eq!(result.raw().len(), 21);

        // the framed request carried the big-endian address
        let controller = session.close();
        assert_eq!(&controller.writes[1][..4], &[0x6B, 0x10, 0x00, 0x00]);
        assert_eq!(controller.writes[1].len(), 21);
    }

    #[test]
    fn read_works_without_prior_identification() {
        let response = [0x6B, 0x00, 0x00, 0x00, 0x00, 0xDE, 0xAD];
        let mock = MockController::new(&[&response]);
        let mut session = FlashSession::open(mock, &SessionConfig::default()).unwrap();

        let result = session.read(0, 2).unwrap();
        assert_eq!(result.payload(), &[0xDE, 0xAD]);
        assert!(session.identity().is_none());
    }

    #[test]
    fn failed_transfer_during_read_leaves_state_unchanged() {
        let mock = MockController::new(&[&[0x9F, 0xEF, 0x00, 0x18]]);
        let mut session = FlashSession::open(mock, &SessionConfig::default()).unwrap();
        let identity = session.identify().unwrap();

        // next transfer fails; identity must survive and no payload escapes
        session.controller.fail_transfers = 1;
        assert_eq!(session.read(0x1000, 8).unwrap_err(), Error::TransferFailed);
        assert_eq!(session.identity(), Some(&identity));
    }

    #[test]
    fn failed_identify_keeps_session_unidentified() {
        let mock = MockController::failing(1);
        let mut session = FlashSession::open(mock, &SessionConfig::default()).unwrap();
        assert_eq!(session.identify().unwrap_err(), Error::TransferFailed);
        assert!(session.identity().is_none());
    }

    #[test]
    fn raw_exchange_rejects_empty_pattern() {
        let mock = MockController::new(&[]);
        let mut session = FlashSession::open(mock, &SessionConfig::default()).unwrap();
        assert_eq!(session.exchange_raw(&[]).unwrap_err(), Error::ContractViolation);
    }

    #[test]
    fn raw_exchange_round_trips_pattern_length() {
        let response = [0xAA, 0xFF, 0xFF, 0xFF];
        let mock = MockController::new(&[&response]);
        let mut session = FlashSession::open(mock, &SessionConfig::default()).unwrap();
        let received = session.exchange_raw(&[0xAA, 0xBB, 0xCC, 0xDD]).unwrap();
        assert_eq!(received, response);
    }

    #[test]
    fn manual_chip_select_asserts_before_each_transfer() {
        let mock = MockController::new(&[&[0x9F, 0xEF, 0x00, 0x18]]);
        let mut session = FlashSession::open(mock, &SessionConfig::default()).unwrap();
        session.identify().unwrap();
        let controller = session.close();
        // once at open, once ahead of the transfer
        assert_eq!(controller.selects, 2);
    }

    #[test]
    fn automatic_chip_select_skips_assertion() {
        let config = SessionConfig {
            prescaler: ClockPrescaler::Div4,
            options: ControllerOptions::HOLD_DRIVE,
        };
        let mock = MockController::new(&[&[0x9F, 0xEF, 0x00, 0x18]]);
        let mut session = FlashSession::open(mock, &config).unwrap();
        session.identify().unwrap();
        let controller = session.close();
        assert_eq!(controller.selects, 0);
    }
}
