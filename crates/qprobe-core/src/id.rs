//! Flash identification decoding
//!
//! A READ ID exchange clocks back four bytes: the opcode-echo slot, the
//! manufacturer code, the device-family byte and the capacity-class byte.
//! This module turns that raw buffer into typed metadata. Decoding never
//! fails on unrecognized codes - an unknown vendor passes through as-is and
//! an unknown capacity class falls back to a conservative default, because
//! identification is informational and must not block later operations.

use crate::error::{Error, Result};
use crate::qspi::READ_ID_LEN;
use core::fmt;

/// Index of the manufacturer code in a READ ID exchange
const MANUFACTURER_OFFSET: usize = 1;
/// Index of the capacity-class code in a READ ID exchange
// TODO: confirm on hardware that the capacity class really lands at index 3
// for parts that do not echo the opcode in slot 0.
const CAPACITY_CLASS_OFFSET: usize = 3;

/// Capacity assumed when the class byte is unrecognized: 2 MiB (16 Mbit)
pub const DEFAULT_CAPACITY: u32 = 2 * 1024 * 1024;

/// NOR flash manufacturer, decoded from the JEDEC manufacturer code
///
/// Codes outside the known table pass through as [`Manufacturer::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Manufacturer {
    /// Micron (0x20)
    Micron,
    /// Spansion (0x01)
    Spansion,
    /// Winbond (0xEF)
    Winbond,
    /// Macronix (0xC2)
    Macronix,
    /// ISSI (0x9D)
    Issi,
    /// Unrecognized manufacturer code, carried verbatim
    Unknown(u8),
}

impl Manufacturer {
    /// Decode a raw manufacturer code
    pub fn from_id(raw: u8) -> Self {
        match raw {
            0x20 => Self::Micron,
            0x01 => Self::Spansion,
            0xEF => Self::Winbond,
            0xC2 => Self::Macronix,
            0x9D => Self::Issi,
            other => Self::Unknown(other),
        }
    }

    /// The raw manufacturer code
    pub fn id(self) -> u8 {
        match self {
            Self::Micron => 0x20,
            Self::Spansion => 0x01,
            Self::Winbond => 0xEF,
            Self::Macronix => 0xC2,
            Self::Issi => 0x9D,
            Self::Unknown(raw) => raw,
        }
    }

    /// True for codes in the known vendor table
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl fmt::Display for Manufacturer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Micron => write!(f, "Micron"),
            Self::Spansion => write!(f, "Spansion"),
            Self::Winbond => write!(f, "Winbond"),
            Self::Macronix => write!(f, "Macronix"),
            Self::Issi => write!(f, "ISSI"),
            Self::Unknown(raw) => write!(f, "unknown (0x{:02X})", raw),
        }
    }
}

/// Look up the byte capacity for a capacity-class code
///
/// Classes 0x13..=0x18 double from 1 MiB to 32 MiB; 0x19, 0x20 and 0x21
/// continue to 64, 128 and 256 MiB.
pub fn capacity_bytes(class: u8) -> Option<u32> {
    match class {
        0x13 => Some(1024 * 1024),
        0x14 => Some(2 * 1024 * 1024),
        0x15 => Some(4 * 1024 * 1024),
        0x16 => Some(8 * 1024 * 1024),
        0x17 => Some(16 * 1024 * 1024),
        0x18 => Some(32 * 1024 * 1024),
        0x19 => Some(64 * 1024 * 1024),
        0x20 => Some(128 * 1024 * 1024),
        0x21 => Some(256 * 1024 * 1024),
        _ => None,
    }
}

/// Decoded flash identification, immutable once produced
///
/// Valid until the caller re-identifies (for instance after a device
/// reset).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashIdentity {
    /// Decoded manufacturer
    pub manufacturer: Manufacturer,
    /// Raw capacity-class code as read from the device
    pub capacity_class: u8,
    /// Capacity resolved from the class table, or [`DEFAULT_CAPACITY`]
    pub capacity_bytes: u32,
}

impl FlashIdentity {
    /// Capacity expressed in megabits, the unit capacity classes encode
    pub fn capacity_mbits(&self) -> u32 {
        self.capacity_bytes / (1024 * 1024) * 8
    }
}

/// Decode a READ ID exchange buffer into a [`FlashIdentity`]
///
/// `buf[1]` is the manufacturer code and `buf[3]` the capacity class;
/// `buf[0]` is the opcode-echo slot and `buf[2]` (the device-family byte)
/// is not used. The buffer must hold at least 4 bytes. Pure and
/// deterministic: equal buffers decode to equal identities.
pub fn decode_identity(buf: &[u8]) -> Result<FlashIdentity> {
    if buf.len() < READ_ID_LEN {
        return Err(Error::ContractViolation);
    }

    let manufacturer = Manufacturer::from_id(buf[MANUFACTURER_OFFSET]);
    if !manufacturer.is_known() {
        log::warn!(
            "unrecognized manufacturer code 0x{:02X}",
            manufacturer.id()
        );
    }

    let capacity_class = buf[CAPACITY_CLASS_OFFSET];
    let capacity = match capacity_bytes(capacity_class) {
        Some(bytes) => bytes,
        None => {
            log::warn!(
                "unrecognized capacity class 0x{:02X}, assuming {} bytes",
                capacity_class,
                DEFAULT_CAPACITY
            );
            DEFAULT_CAPACITY
        }
    };

    Ok(FlashIdentity {
        manufacturer,
        capacity_class,
        capacity_bytes: capacity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_known_manufacturer_and_class() {
        let identity = decode_identity(&[0x9F, 0x20, 0x00, 0x15]).unwrap();
        assert_eq!(identity.manufacturer, Manufacturer::Micron);
        assert_eq!(identity.capacity_class, 0x15);
        assert_eq!(identity.capacity_bytes, 4 * 1024 * 1024);
    }

    #[test]
    fn decoding_is_deterministic() {
        let buf = [0x9F, 0xC2, 0x20, 0x19];
        assert_eq!(decode_identity(&buf).unwrap(), decode_identity(&buf).unwrap());
    }

    #[test]
    fn unknown_manufacturer_passes_through() {
        let identity = decode_identity(&[0x9F, 0x77, 0x00, 0x14]).unwrap();
        assert_eq!(identity.manufacturer, Manufacturer::Unknown(0x77));
        assert!(!identity.manufacturer.is_known());
        assert_eq!(identity.manufacturer.id(), 0x77);
    }

    #[test]
    fn unknown_capacity_class_falls_back_to_default() {
        let identity = decode_identity(&[0x9F, 0xEF, 0x00, 0xFF]).unwrap();
        assert_eq!(identity.capacity_class, 0xFF);
        assert_eq!(identity.capacity_bytes, DEFAULT_CAPACITY);
    }

    #[test]
    fn short_buffer_is_a_contract_violation() {
        assert_eq!(
            decode_identity(&[0x9F, 0xEF, 0x00]).unwrap_err(),
            Error::ContractViolation
        );
    }

    #[test]
    fn capacity_table_doubles_per_class() {
        assert_eq!(capacity_bytes(0x13), Some(1024 * 1024));
        assert_eq!(capacity_bytes(0x18), Some(32 * 1024 * 1024));
        assert_eq!(capacity_bytes(0x19), Some(64 * 1024 * 1024));
        assert_eq!(capacity_bytes(0x20), Some(128 * 1024 * 1024));
        assert_eq!(capacity_bytes(0x21), Some(256 * 1024 * 1024));
        assert_eq!(capacity_bytes(0x1A), None);
    }

    #[test]
    fn capacity_in_megabits() {
        let identity = decode_identity(&[0x9F, 0xEF, 0x00, 0x18]).unwrap();
        assert_eq!(identity.capacity_mbits(), 256);
    }
}
