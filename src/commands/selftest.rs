//! Controller self-test command
//!
//! Diagnostics that do not assume a flash is wired: a raw pattern
//! exchange, a READ ID command-echo check, and a dump of the option bits
//! in effect. Useful for telling "controller broken" apart from "flash
//! missing" during board bring-up.

use qprobe_core::controller::{ControllerOptions, QspiController};
use qprobe_core::qspi::CommandFrame;
use qprobe_core::session::{FlashSession, SessionConfig};

/// Run the selftest command
pub fn run_selftest(controller: Box<dyn QspiController>) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = FlashSession::open(controller, &SessionConfig::default())?;

    println!("Testing raw exchange (no flash needed)...");
    let pattern = [0xAA, 0xBB, 0xCC, 0xDD];
    let received = session.exchange_raw(&pattern)?;

    print!("Sent:    ");
    for byte in pattern {
        print!(" 0x{:02X}", byte);
    }
    println!();
    print!("Received:");
    for byte in &received {
        print!(" 0x{:02X}", byte);
    }
    println!();

    match received[0] {
        0xAA => println!("-> first byte matches sent data (loopback or echo)"),
        0xFF => println!("-> received 0xFF (normal with no device connected - bus pulled high)"),
        0x00 => println!("-> received 0x00 (normal with no device connected - bus pulled low)"),
        other => println!("-> unexpected data pattern: 0x{:02X}", other),
    }

    println!();
    println!("Testing READ ID command transmission...");
    let frame = CommandFrame::read_id();
    let received = session.exchange_raw(frame.as_bytes())?;
    print!("Received:");
    for byte in &received {
        print!(" 0x{:02X}", byte);
    }
    println!();
    if received[0] == frame.opcode() {
        println!("-> command echoed back");
    } else {
        println!("-> no echo (bus idle or controller in a different mode)");
    }

    println!();
    println!("Configured options:");
    let options = session.controller().options();
    print_option(options, ControllerOptions::FORCE_SLAVE_SELECT, "Manual chip select");
    print_option(options, ControllerOptions::HOLD_DRIVE, "HOLD line drive");
    print_option(options, ControllerOptions::MANUAL_START, "Manual start");

    Ok(())
}

fn print_option(options: ControllerOptions, bit: ControllerOptions, name: &str) {
    let state = if options.contains(bit) {
        "ENABLED"
    } else {
        "DISABLED"
    };
    println!("-> {}: {}", name, state);
}
