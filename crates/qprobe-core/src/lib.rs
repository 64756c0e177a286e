//! qprobe-core - Core protocol library for QSPI NOR flash probing
//!
//! This crate implements the command framing and response decoding used to
//! talk to a SPI-attached NOR flash through a QSPI controller: READ ID
//! identification and quad-output raw reads. The controller itself sits
//! behind the [`controller::QspiController`] trait; backends provide the
//! actual bus access.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`)
//! - `alloc` - Enable heap allocation for frames and sessions
//!
//! # Example
//!
//! ```ignore
//! use qprobe_core::controller::QspiController;
//! use qprobe_core::session::{FlashSession, SessionConfig};
//!
//! fn probe<C: QspiController>(controller: C) {
//!     let mut session = FlashSession::open(controller, &SessionConfig::default()).unwrap();
//!     match session.identify() {
//!         Ok(id) => println!("{} ({} bytes)", id.manufacturer, id.capacity_bytes),
//!         Err(e) => println!("identification failed: {}", e),
//!     }
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod controller;
pub mod error;
pub mod id;
pub mod qspi;
#[cfg(feature = "alloc")]
pub mod session;

pub use error::{Error, Result};
