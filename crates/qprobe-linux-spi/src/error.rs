//! Error types for spidev operations

use thiserror::Error;

/// spidev-specific errors
///
/// These carry the detail the opaque core error cannot; the trait impl
/// logs them before mapping into `qprobe_core::Error`.
#[derive(Debug, Error)]
pub enum LinuxSpiError {
    /// No device path was given
    #[error("no device specified (use dev=/dev/spidevX.Y)")]
    NoDevice,

    /// Opening the device node failed
    #[error("failed to open {path}: {source}")]
    OpenFailed {
        /// Device path that failed to open
        path: String,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Setting the SPI mode failed
    #[error("failed to set SPI mode {mode}: {source}")]
    SetModeFailed {
        /// Requested mode (0-3)
        mode: u8,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Setting the word size failed
    #[error("failed to set {bits} bits per word: {source}")]
    SetBitsPerWordFailed {
        /// Requested word size
        bits: u8,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Setting the clock speed failed
    #[error("failed to set speed {speed} Hz: {source}")]
    SetSpeedFailed {
        /// Requested speed in Hz
        speed: u32,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The SPI_IOC_MESSAGE ioctl failed
    #[error("SPI transfer failed: {0}")]
    TransferFailed(std::io::Error),
}

/// Result type for spidev operations
pub type Result<T> = std::result::Result<T, LinuxSpiError>;
