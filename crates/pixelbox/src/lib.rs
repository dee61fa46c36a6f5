//! Drive Pixelbox LED-matrix devices over Bluetooth RFCOMM.
//!
//! The device speaks a reverse-engineered binary protocol over a
//! serial-port profile link. This crate re-exports the layers that
//! implement it.
//!
//! # Crate Structure
//!
//! - [`transport`]: RFCOMM and Unix socket streams, Bluetooth addresses
//! - [`frame`]: Checksummed envelope codec and stream helpers
//! - [`protocol`]: Command builders, image encoder, incoming decoder
//! - [`device`]: Connection manager with listener fan-out (behind `device` feature)
//!
//! ```
//! use pixelbox::protocol::{parse_incoming, set_brightness};
//!
//! let wire = set_brightness(50).unwrap();
//! assert_eq!(wire, [0x01, 0x04, 0x00, 0x74, 0x32, 0xAA, 0x00, 0x02]);
//!
//! let reply = pixelbox::frame::wrap(&[0x04, 0x32, 0x55, 0x32]);
//! let messages = parse_incoming(&reply).unwrap();
//! assert_eq!(messages[0].to_string(), "Set brightness to 50");
//! ```

/// Re-export transport types.
pub mod transport {
    pub use pixelbox_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use pixelbox_frame::*;
}

/// Re-export protocol types.
pub mod protocol {
    pub use pixelbox_protocol::*;
}

/// Re-export connection types (requires `device` feature).
#[cfg(feature = "device")]
pub mod device {
    pub use pixelbox_device::*;
}
