//! Stream transport for Pixelbox LED-matrix devices.
//!
//! The device speaks a serial-port profile over Bluetooth, so the transport
//! is a plain byte stream:
//! - RFCOMM sockets (Linux, via `AF_BLUETOOTH`)
//! - Unix domain sockets (bridges and device simulators)
//!
//! This is the lowest layer of pixelbox. Everything else builds on top of
//! the [`DeviceStream`] type provided here.

pub mod address;
pub mod error;
pub mod stream;

#[cfg(target_os = "linux")]
pub mod rfcomm;

pub use address::BdAddr;
pub use error::{Result, TransportError};
pub use stream::DeviceStream;

#[cfg(target_os = "linux")]
pub use rfcomm::connect_rfcomm;
