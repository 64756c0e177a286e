//! CLI argument parsing

use crate::controllers;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Parse a string as a hex or decimal u8
fn parse_hex_u8(s: &str) -> Result<u8, String> {
    let value = parse_hex_u32(s)?;
    u8::try_from(value).map_err(|_| format!("Value out of byte range: {}", s))
}

/// Generate dynamic help text for the controller argument
fn controller_help() -> String {
    format!(
        "Controller to use [available: {}]",
        controllers::controller_names_short()
    )
}

#[derive(Parser)]
#[command(name = "qprobe")]
#[command(author, version, about = "QSPI NOR flash bring-up probe", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Identify the attached flash device
    Id {
        /// Controller to use
        #[arg(short, long, help = controller_help())]
        controller: String,
    },

    /// Read flash contents
    Read {
        /// Controller to use
        #[arg(short, long, help = controller_help())]
        controller: String,

        /// Start address (hex or decimal, truncated to 24 bits)
        #[arg(short, long, value_parser = parse_hex_u32)]
        address: u32,

        /// Number of bytes to read
        #[arg(short, long, value_parser = parse_hex_u32)]
        length: u32,

        /// Output file path (hex dump to stdout if not given)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify flash contents against an incrementing test pattern
    VerifyPattern {
        /// Controller to use
        #[arg(short, long, help = controller_help())]
        controller: String,

        /// Start address (hex or decimal)
        #[arg(short, long, value_parser = parse_hex_u32)]
        address: u32,

        /// Number of bytes to check
        #[arg(short, long, value_parser = parse_hex_u32)]
        length: u32,

        /// First pattern byte
        #[arg(long, value_parser = parse_hex_u8, default_value = "0xAA")]
        start: u8,
    },

    /// Exercise the controller without assuming a flash is wired
    Selftest {
        /// Controller to use
        #[arg(short, long, help = controller_help())]
        controller: String,
    },

    /// List available controller backends
    ListControllers,
}
