//! qprobe - QSPI NOR flash bring-up probe
//!
//! A diagnostic harness for first contact with a SPI-attached NOR flash:
//! identify the device over READ ID, pull raw data out with quad-output
//! reads, and exercise the controller when no flash answers at all.
//!
//! # Architecture
//!
//! Controller backends (the in-memory emulator, Linux spidev) implement
//! the `QspiController` trait from `qprobe-core`; every command drives
//! them through a `FlashSession`, which owns the framing and decoding.

mod cli;
mod commands;
mod controllers;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    match cli.command {
        Commands::Id { controller } => {
            let controller = controllers::open_controller(&controller)?;
            commands::id::run_id(controller)
        }
        Commands::Read {
            controller,
            address,
            length,
            output,
        } => {
            let controller = controllers::open_controller(&controller)?;
            commands::read::run_read(controller, address, length as usize, output.as_deref())
        }
        Commands::VerifyPattern {
            controller,
            address,
            length,
            start,
        } => {
            let controller = controllers::open_controller(&controller)?;
            commands::verify::run_verify_pattern(controller, address, length as usize, start)
        }
        Commands::Selftest { controller } => {
            let controller = controllers::open_controller(&controller)?;
            commands::selftest::run_selftest(controller)
        }
        Commands::ListControllers => {
            controllers::list_controllers();
            Ok(())
        }
    }
}
