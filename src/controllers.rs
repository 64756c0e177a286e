//! Controller backend registration and dispatch
//!
//! This module provides a centralized registry for controller backends,
//! with feature-gated inclusion and dynamic help text generation. A
//! backend is selected on the command line as `name` or
//! `name:key=value,key=value`.

use qprobe_core::controller::QspiController;
use thiserror::Error;

/// Information about a controller backend
pub struct ControllerInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Errors from controller selection and opening
#[derive(Debug, Error)]
pub enum ControllerError {
    /// The requested name matched no compiled-in backend
    #[error("unknown controller '{name}' (available: {available})")]
    Unknown {
        /// Requested backend name
        name: String,
        /// Names of compiled-in backends
        available: String,
    },

    /// A backend option string did not parse
    #[error("invalid controller option: {0}")]
    InvalidOption(String),

    /// The backend failed to open
    #[error("failed to open controller: {0}")]
    Open(Box<dyn std::error::Error>),
}

/// Get information about all available controllers (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_controllers() -> Vec<ControllerInfo> {
    let mut backends = Vec::new();

    #[cfg(feature = "dummy")]
    backends.push(ControllerInfo {
        name: "dummy",
        aliases: &[],
        description: "In-memory flash emulator for testing (id=<n> or addr=<hex>)",
    });

    #[cfg(feature = "linux-spi")]
    backends.push(ControllerInfo {
        name: "linux_spi",
        aliases: &["linux-spi", "spidev"],
        description: "Linux spidev interface (dev=/dev/spidevX.Y,spispeed=<kHz>,mode=<0-3>)",
    });

    backends
}

/// Generate a short list of controller names for CLI help
pub fn controller_names_short() -> String {
    let backends = available_controllers();
    if backends.is_empty() {
        return "none (recompile with controller features enabled)".to_string();
    }
    let names: Vec<&str> = backends.iter().map(|b| b.name).collect();
    names.join(", ")
}

/// Print the registry listing
pub fn list_controllers() {
    println!("Available controllers:");
    println!();
    for backend in available_controllers() {
        println!("  {:12} - {}", backend.name, backend.description);
        if !backend.aliases.is_empty() {
            println!("  {:12}   aliases: {}", "", backend.aliases.join(", "));
        }
    }
}

/// Split a `name:key=value,...` spec into name and option pairs
fn split_spec(spec: &str) -> Result<(&str, Vec<(&str, &str)>), ControllerError> {
    let (name, opts) = match spec.split_once(':') {
        Some((name, rest)) => (name, rest),
        None => (spec, ""),
    };

    let mut pairs = Vec::new();
    for item in opts.split(',').filter(|s| !s.is_empty()) {
        let (key, value) = item
            .split_once('=')
            .ok_or_else(|| ControllerError::InvalidOption(format!("expected key=value: {}", item)))?;
        pairs.push((key, value));
    }

    Ok((name, pairs))
}

/// Open the controller backend named by `spec`
pub fn open_controller(spec: &str) -> Result<Box<dyn QspiController>, ControllerError> {
    let (name, options) = split_spec(spec)?;

    #[cfg(feature = "dummy")]
    if name == "dummy" {
        return open_dummy(&options);
    }

    #[cfg(feature = "linux-spi")]
    if name == "linux_spi" || name == "linux-spi" || name == "spidev" {
        return open_linux_spi(&options);
    }

    Err(ControllerError::Unknown {
        name: name.to_string(),
        available: controller_names_short(),
    })
}

#[cfg(feature = "dummy")]
fn open_dummy(options: &[(&str, &str)]) -> Result<Box<dyn QspiController>, ControllerError> {
    use qprobe_core::controller::DeviceSelector;
    use qprobe_dummy::DummyController;

    let mut selector = DeviceSelector::ById(qprobe_dummy::DEVICE_ID);
    for (key, value) in options {
        match *key {
            "id" => {
                let id: u16 = value.parse().map_err(|_| {
                    ControllerError::InvalidOption(format!("invalid id value: {}", value))
                })?;
                selector = DeviceSelector::ById(id);
            }
            "addr" => {
                let raw = value.strip_prefix("0x").unwrap_or(value);
                let addr = usize::from_str_radix(raw, 16).map_err(|_| {
                    ControllerError::InvalidOption(format!("invalid addr value: {}", value))
                })?;
                selector = DeviceSelector::ByAddress(addr);
            }
            _ => {
                log::warn!("dummy: unknown option: {}={}", key, value);
            }
        }
    }

    let controller = DummyController::open(selector)
        .map_err(|e| ControllerError::Open(Box::new(e)))?;
    Ok(Box::new(controller))
}

#[cfg(feature = "linux-spi")]
fn open_linux_spi(options: &[(&str, &str)]) -> Result<Box<dyn QspiController>, ControllerError> {
    use qprobe_linux_spi::{parse_options, LinuxSpi};

    let config = parse_options(options).map_err(ControllerError::InvalidOption)?;
    let controller = LinuxSpi::open(&config).map_err(|e| ControllerError::Open(Box::new(e)))?;
    Ok(Box::new(controller))
}
