use std::fmt;
use std::str::FromStr;

use crate::error::TransportError;

/// A Bluetooth device address in human-readable byte order.
///
/// `11:75:58:B1:B2:15` is stored as `[0x11, 0x75, 0x58, 0xB1, 0xB2, 0x15]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BdAddr([u8; 6]);

impl BdAddr {
    /// Create an address from bytes in human-readable order.
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// The address bytes in human-readable order.
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// The address in the byte order `sockaddr_rc.rc_bdaddr` expects.
    ///
    /// The kernel stores `bdaddr_t` little-endian, which is the reverse of
    /// the colon notation.
    pub fn to_socket_order(&self) -> [u8; 6] {
        let mut out = self.0;
        out.reverse();
        out
    }
}

impl FromStr for BdAddr {
    type Err = TransportError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = || TransportError::InvalidAddress {
            input: input.to_string(),
        };

        let hex: String = input.chars().filter(|c| *c != ':').collect();
        if hex.len() != 12 || !hex.is_ascii() {
            return Err(invalid());
        }

        let mut bytes = [0u8; 6];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
        }
        Ok(Self(bytes))
    }
}

impl fmt::Display for BdAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}
