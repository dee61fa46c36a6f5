//! Connection management for Pixelbox devices.
//!
//! A [`Connection`] owns one device socket. Commands go out through
//! [`Connection::send`]; everything the device sends back is read on a
//! background thread and fanned out to listeners through a bounded queue.
//!
//! There is no automatic reconnection. A read or write error moves the
//! connection to [`ConnectionState::Failed`] and every later send fails
//! until the caller connects again.

pub mod config;
pub mod connection;
pub mod dispatch;
pub mod error;

pub use config::{
    ConnectionConfig, DispatchConfig, OverflowPolicy, DEFAULT_QUEUE_CAPACITY,
    DEFAULT_RFCOMM_CHANNEL,
};
pub use connection::{Connection, ConnectionState};
pub use dispatch::Listener;
pub use error::{DeviceError, Result};
