//! Linux spidev device implementation
//!
//! This module provides the `LinuxSpi` struct that implements the
//! `QspiController` trait using Linux's spidev interface. Exchanges are
//! full-duplex: one `SPI_IOC_MESSAGE` transfer with both tx and rx set, so
//! the response buffer lines up byte-for-byte with the frame clocked out.

use crate::error::{LinuxSpiError, Result};

use qprobe_core::controller::{ClockPrescaler, ControllerOptions, QspiController};
use qprobe_core::error::{Error as CoreError, Result as CoreResult};

use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;

/// Path to kernel spidev buffer size parameter
const BUF_SIZE_SYSFS: &str = "/sys/module/spidev/parameters/bufsiz";

/// Default reference clock in Hz (2 MHz); the session prescaler divides this
const DEFAULT_REF_HZ: u32 = 2_000_000;

/// SPI mode constants
pub mod mode {
    /// SPI mode 0: CPOL=0, CPHA=0
    pub const MODE_0: u8 = 0;
    /// SPI mode 1: CPOL=0, CPHA=1
    pub const MODE_1: u8 = 1;
    /// SPI mode 2: CPOL=1, CPHA=0
    pub const MODE_2: u8 = 2;
    /// SPI mode 3: CPOL=1, CPHA=1
    pub const MODE_3: u8 = 3;
}

/// Linux spidev ioctl constants
mod ioctl {
    use nix::ioctl_write_ptr;

    // SPI ioctl magic number
    const SPI_IOC_MAGIC: u8 = b'k';

    // SPI ioctl type numbers
    const SPI_IOC_TYPE_MODE: u8 = 1;
    const SPI_IOC_TYPE_BITS_PER_WORD: u8 = 3;
    const SPI_IOC_TYPE_MAX_SPEED_HZ: u8 = 4;

    // Generate ioctl functions
    ioctl_write_ptr!(spi_ioc_wr_mode, SPI_IOC_MAGIC, SPI_IOC_TYPE_MODE, u8);
    ioctl_write_ptr!(
        spi_ioc_wr_bits_per_word,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_BITS_PER_WORD,
        u8
    );
    ioctl_write_ptr!(
        spi_ioc_wr_max_speed_hz,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_MAX_SPEED_HZ,
        u32
    );

    /// Size of spi_ioc_transfer struct (for 64-bit systems)
    pub const SPI_IOC_TRANSFER_SIZE: usize = 32;

    /// Calculate ioctl number for SPI_IOC_MESSAGE(n)
    ///
    /// SPI_IOC_MESSAGE(n) = _IOW(SPI_IOC_MAGIC, 0, char[n * sizeof(struct spi_ioc_transfer)])
    pub fn spi_ioc_message(n: u8) -> libc::c_ulong {
        let size = (n as usize) * SPI_IOC_TRANSFER_SIZE;
        // _IOC(dir, type, nr, size) = ((dir)<<30)|((size)<<16)|((type)<<8)|(nr)
        ((1u32 << 30) | ((size as u32) << 16) | ((SPI_IOC_MAGIC as u32) << 8)) as libc::c_ulong
    }
}

/// SPI transfer structure for ioctl
/// This must match the kernel's struct spi_ioc_transfer layout
#[repr(C)]
#[derive(Debug, Default, Clone)]
struct SpiIocTransfer {
    tx_buf: u64,          // __u64 tx_buf
    rx_buf: u64,          // __u64 rx_buf
    len: u32,             // __u32 len
    speed_hz: u32,        // __u32 speed_hz
    delay_usecs: u16,     // __u16 delay_usecs
    bits_per_word: u8,    // __u8 bits_per_word
    cs_change: u8,        // __u8 cs_change
    tx_nbits: u8,         // __u8 tx_nbits
    rx_nbits: u8,         // __u8 rx_nbits
    word_delay_usecs: u8, // __u8 word_delay_usecs
    _pad: u8,             // padding
}

/// Configuration for opening a Linux SPI device
#[derive(Debug, Clone)]
pub struct LinuxSpiConfig {
    /// Device path (e.g., "/dev/spidev0.0")
    pub device: String,
    /// Reference clock in Hz the prescaler divides (default: 2 MHz)
    pub ref_hz: u32,
    /// SPI mode (0-3, default: 0)
    pub mode: u8,
}

impl Default for LinuxSpiConfig {
    fn default() -> Self {
        Self {
            device: String::new(),
            ref_hz: DEFAULT_REF_HZ,
            mode: mode::MODE_0,
        }
    }
}

impl LinuxSpiConfig {
    /// Create a new configuration with the given device path
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            ..Default::default()
        }
    }

    /// Set the reference clock in Hz
    pub fn with_ref_clock(mut self, ref_hz: u32) -> Self {
        self.ref_hz = ref_hz;
        self
    }

    /// Set the SPI mode (0-3)
    pub fn with_mode(mut self, mode: u8) -> Self {
        self.mode = mode;
        self
    }
}

/// Linux spidev QSPI controller
///
/// Implements the controller contract for host systems using the
/// `/dev/spidevX.Y` device interface. Chip select is asserted by the
/// kernel for the duration of each message, which satisfies the manual
/// chip-select discipline without per-transfer work here.
pub struct LinuxSpi {
    /// File handle for spidev device
    file: File,
    /// Maximum kernel buffer size
    max_kernel_buf_size: usize,
    /// Reference clock the prescaler divides
    ref_hz: u32,
    /// Currently programmed bus speed
    speed_hz: u32,
    /// Option bits accepted at session open
    options: ControllerOptions,
}

impl LinuxSpi {
    /// Open a Linux SPI device with the given configuration
    pub fn open(config: &LinuxSpiConfig) -> Result<Self> {
        if config.device.is_empty() {
            return Err(LinuxSpiError::NoDevice);
        }

        log::debug!("linux_spi: opening device {}", config.device);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&config.device)
            .map_err(|e| LinuxSpiError::OpenFailed {
                path: config.device.clone(),
                source: e,
            })?;

        let fd = file.as_raw_fd();

        let spi_mode = config.mode;
        unsafe {
            ioctl::spi_ioc_wr_mode(fd, &spi_mode).map_err(|e| LinuxSpiError::SetModeFailed {
                mode: spi_mode,
                source: std::io::Error::from_raw_os_error(e as i32),
            })?;
        }

        let bits: u8 = 8;
        unsafe {
            ioctl::spi_ioc_wr_bits_per_word(fd, &bits).map_err(|e| {
                LinuxSpiError::SetBitsPerWordFailed {
                    bits,
                    source: std::io::Error::from_raw_os_error(e as i32),
                }
            })?;
        }

        let speed = config.ref_hz;
        unsafe {
            ioctl::spi_ioc_wr_max_speed_hz(fd, &speed).map_err(|e| {
                LinuxSpiError::SetSpeedFailed {
                    speed,
                    source: std::io::Error::from_raw_os_error(e as i32),
                }
            })?;
        }

        log::info!(
            "linux_spi: opened {} (mode={}, ref clock {} kHz)",
            config.device,
            spi_mode,
            speed / 1000
        );

        let max_kernel_buf_size = get_max_kernel_buf_size();
        log::debug!(
            "linux_spi: max kernel buffer size: {} bytes",
            max_kernel_buf_size
        );

        Ok(Self {
            file,
            max_kernel_buf_size,
            ref_hz: config.ref_hz,
            speed_hz: speed,
            options: ControllerOptions::empty(),
        })
    }

    /// Open a device with default settings
    pub fn open_device(device: &str) -> Result<Self> {
        Self::open(&LinuxSpiConfig::new(device))
    }

    /// Currently programmed bus speed
    pub fn speed_hz(&self) -> u32 {
        self.speed_hz
    }

    fn set_speed(&mut self, speed_hz: u32) -> Result<()> {
        let fd = self.file.as_raw_fd();
        unsafe {
            ioctl::spi_ioc_wr_max_speed_hz(fd, &speed_hz).map_err(|e| {
                LinuxSpiError::SetSpeedFailed {
                    speed: speed_hz,
                    source: std::io::Error::from_raw_os_error(e as i32),
                }
            })?;
        }
        self.speed_hz = speed_hz;
        log::debug!("linux_spi: bus speed set to {} Hz", speed_hz);
        Ok(())
    }

    /// Perform one full-duplex exchange over the bus
    fn full_duplex(&mut self, write: &[u8], read: &mut [u8]) -> Result<()> {
        let fd = self.file.as_raw_fd();

        let transfer = SpiIocTransfer {
            tx_buf: write.as_ptr() as u64,
            rx_buf: read.as_mut_ptr() as u64,
            len: write.len() as u32,
            speed_hz: self.speed_hz,
            bits_per_word: 8,
            ..Default::default()
        };

        let ioctl_num = ioctl::spi_ioc_message(1);
        let ret = unsafe { libc::ioctl(fd, ioctl_num, &transfer as *const SpiIocTransfer) };

        if ret < 0 {
            return Err(LinuxSpiError::TransferFailed(
                std::io::Error::last_os_error(),
            ));
        }

        Ok(())
    }
}

impl QspiController for LinuxSpi {
    fn set_clock_prescaler(&mut self, prescaler: ClockPrescaler) -> CoreResult<()> {
        let speed = self.ref_hz / prescaler.divisor();
        self.set_speed(speed).map_err(|e| {
            log::error!("linux_spi: {}", e);
            CoreError::ControllerInit
        })
    }

    fn set_options(&mut self, options: ControllerOptions) -> CoreResult<()> {
        if options.contains(ControllerOptions::MANUAL_START) {
            log::error!("linux_spi: manual start trigger not available on spidev");
            return Err(CoreError::UnsupportedOption);
        }
        // FORCE_SLAVE_SELECT and HOLD_DRIVE are handled by the kernel
        // driver and the board wiring respectively
        self.options = options;
        Ok(())
    }

    fn options(&self) -> ControllerOptions {
        self.options
    }

    fn select_slave(&mut self) -> CoreResult<()> {
        // the kernel asserts CS for the duration of each message
        log::trace!("linux_spi: chip select handled per message");
        Ok(())
    }

    fn transfer(&mut self, write: &[u8], read: &mut [u8]) -> CoreResult<()> {
        if write.len() != read.len() || write.is_empty() {
            return Err(CoreError::ContractViolation);
        }
        self.full_duplex(write, read).map_err(|e| {
            log::error!("linux_spi: {}", e);
            CoreError::TransferFailed
        })
    }

    fn max_transfer_len(&self) -> usize {
        self.max_kernel_buf_size
    }
}

/// Read the maximum kernel buffer size from sysfs, or use page size as fallback
fn get_max_kernel_buf_size() -> usize {
    if let Ok(content) = std::fs::read_to_string(BUF_SIZE_SYSFS) {
        if let Ok(size) = content.trim().parse::<usize>() {
            if size > 0 {
                log::debug!("linux_spi: using buffer size {} from sysfs", size);
                return size;
            }
        }
        log::warn!("linux_spi: invalid buffer size in {}", BUF_SIZE_SYSFS);
    } else {
        log::debug!("linux_spi: cannot read {}, using page size", BUF_SIZE_SYSFS);
    }

    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as usize;
    log::debug!("linux_spi: using page size {} as buffer size", page_size);
    page_size
}

/// Parse controller options from a list of key-value pairs
pub fn parse_options(options: &[(&str, &str)]) -> std::result::Result<LinuxSpiConfig, String> {
    let mut config = LinuxSpiConfig::default();

    for (key, value) in options {
        match *key {
            "dev" => {
                config.device = value.to_string();
            }
            "spispeed" => {
                // Parse reference clock in kHz
                let speed_khz: u32 = value
                    .parse()
                    .map_err(|_| format!("Invalid spispeed value: {}", value))?;
                config.ref_hz = speed_khz * 1000;
            }
            "mode" => {
                let spi_mode: u8 = value
                    .parse()
                    .map_err(|_| format!("Invalid mode value: {}", value))?;
                if spi_mode > 3 {
                    return Err(format!("Invalid SPI mode: {} (must be 0-3)", spi_mode));
                }
                config.mode = spi_mode;
            }
            _ => {
                log::warn!("linux_spi: unknown option: {}={}", key, value);
            }
        }
    }

    if config.device.is_empty() {
        return Err("No device specified. Use dev=/dev/spidevX.Y".to_string());
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_device_speed_and_mode() {
        let config =
            parse_options(&[("dev", "/dev/spidev0.0"), ("spispeed", "8000"), ("mode", "3")])
                .unwrap();
        assert_eq!(config.device, "/dev/spidev0.0");
        assert_eq!(config.ref_hz, 8_000_000);
        assert_eq!(config.mode, 3);
    }

    #[test]
    fn rejects_missing_device() {
        assert!(parse_options(&[("spispeed", "2000")]).is_err());
    }

    #[test]
    fn rejects_out_of_range_mode() {
        assert!(parse_options(&[("dev", "/dev/spidev0.0"), ("mode", "4")]).is_err());
    }
}
