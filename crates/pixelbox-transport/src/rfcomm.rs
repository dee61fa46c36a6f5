use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

use tracing::{debug, info};

use crate::address::BdAddr;
use crate::error::{Result, TransportError};
use crate::stream::DeviceStream;

/// `BTPROTO_RFCOMM` from `<bluetooth/bluetooth.h>`.
const BTPROTO_RFCOMM: libc::c_int = 3;

/// `struct sockaddr_rc` from `<bluetooth/rfcomm.h>`.
#[repr(C)]
struct SockaddrRc {
    rc_family: libc::sa_family_t,
    rc_bdaddr: [u8; 6],
    rc_channel: u8,
}

/// Open an RFCOMM stream socket and connect it to `address` on `channel` (blocking).
///
/// No timeout is applied; the call blocks for as long as the kernel's
/// Bluetooth stack takes to page the device.
pub fn connect_rfcomm(address: BdAddr, channel: u8) -> Result<DeviceStream> {
    // SAFETY: plain socket(2) call with constant arguments; the result is checked below.
    let raw = unsafe {
        libc::socket(
            libc::AF_BLUETOOTH,
            libc::SOCK_STREAM | libc::SOCK_CLOEXEC,
            BTPROTO_RFCOMM,
        )
    };
    if raw < 0 {
        return Err(TransportError::Socket(std::io::Error::last_os_error()));
    }
    // SAFETY: `raw` is a freshly created descriptor that nothing else owns.
    let fd = unsafe { OwnedFd::from_raw_fd(raw) };

    let addr = SockaddrRc {
        rc_family: libc::AF_BLUETOOTH as libc::sa_family_t,
        rc_bdaddr: address.to_socket_order(),
        rc_channel: channel,
    };

    debug!(%address, channel, "connecting rfcomm socket");

    // SAFETY: `addr` is a valid `sockaddr_rc` for the given length and `fd` is open.
    let rc = unsafe {
        libc::connect(
            fd.as_raw_fd(),
            (&addr as *const SockaddrRc).cast::<libc::sockaddr>(),
            std::mem::size_of::<SockaddrRc>() as libc::socklen_t,
        )
    };
    if rc != 0 {
        return Err(TransportError::Connect {
            target: format!("{address} channel {channel}"),
            source: std::io::Error::last_os_error(),
        });
    }

    info!(%address, channel, "connected to rfcomm device");
    Ok(DeviceStream::from_rfcomm(std::fs::File::from(fd)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sockaddr_matches_kernel_layout() {
        // sa_family_t (2) + bdaddr_t (6) + channel (1), padded to alignment 2.
        assert_eq!(std::mem::size_of::<SockaddrRc>(), 10);
        assert_eq!(std::mem::align_of::<SockaddrRc>(), 2);
    }
}
