//! Id command implementation

use qprobe_core::controller::QspiController;
use qprobe_core::id::{capacity_bytes, Manufacturer};
use qprobe_core::session::{FlashSession, SessionConfig};

/// Run the id command
pub fn run_id(controller: Box<dyn QspiController>) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = FlashSession::open(controller, &SessionConfig::default())?;
    let identity = session.identify()?;

    println!("Flash identification");
    println!("====================");
    println!(
        "Manufacturer:   {} (0x{:02X})",
        identity.manufacturer,
        identity.manufacturer.id()
    );
    println!("Capacity class: 0x{:02X}", identity.capacity_class);
    println!(
        "Capacity:       {} bytes ({} MiB / {} Mbit)",
        identity.capacity_bytes,
        identity.capacity_bytes / (1024 * 1024),
        identity.capacity_mbits()
    );

    // implausible manufacturer bytes usually mean wiring, not a strange
    // vendor - surface that to whoever is bringing the board up
    match identity.manufacturer {
        Manufacturer::Unknown(0xFF) => {
            println!();
            println!("Warning: manufacturer byte reads 0xFF - bus pulled high, no device responding?");
        }
        Manufacturer::Unknown(0x00) => {
            println!();
            println!("Warning: manufacturer byte reads 0x00 - bus floating or pulled low?");
        }
        _ => {}
    }

    if capacity_bytes(identity.capacity_class).is_none() {
        println!();
        println!("Note: capacity class not recognized; the reported capacity is a conservative default.");
    }

    Ok(())
}
