//! Test-pattern verification command

use crate::commands::read::read_region;
use qprobe_core::controller::QspiController;
use qprobe_core::session::{FlashSession, SessionConfig};

/// How many mismatching bytes to print before summarizing
const MISMATCH_PRINT_LIMIT: usize = 3;

/// Run the verify-pattern command
///
/// Compares flash contents against an incrementing byte pattern. A
/// mismatch is reported, not treated as a failure - the pattern may simply
/// never have been written to this region.
pub fn run_verify_pattern(
    controller: Box<dyn QspiController>,
    address: u32,
    length: usize,
    start: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    if length == 0 {
        return Err("length must be greater than zero".into());
    }

    let mut session = FlashSession::open(controller, &SessionConfig::default())?;
    let data = read_region(&mut session, address, length)?;

    println!(
        "Checking {} bytes at 0x{:06X} against pattern 0x{:02X}, 0x{:02X}, ...",
        length,
        address,
        start,
        start.wrapping_add(1)
    );

    let mut mismatch_count = 0usize;
    for (i, &actual) in data.iter().enumerate() {
        let expected = start.wrapping_add(i as u8);
        if actual != expected {
            if mismatch_count < MISMATCH_PRINT_LIMIT {
                println!(
                    "Mismatch at byte {}: expected 0x{:02X}, got 0x{:02X}",
                    i, expected, actual
                );
            }
            mismatch_count += 1;
        }
    }

    if mismatch_count == 0 {
        println!("Pattern verification successful!");
    } else {
        println!(
            "Pattern mismatches found ({} total). This is normal if the test pattern was never written.",
            mismatch_count
        );
    }

    Ok(())
}
