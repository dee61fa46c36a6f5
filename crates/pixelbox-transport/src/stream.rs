use std::io::{Read, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{Result, TransportError};

/// A connected device stream implementing `Read` and `Write`.
///
/// This is the fundamental I/O type returned by transport operations.
/// On Linux it wraps an RFCOMM socket descriptor; any Unix platform can
/// also reach a device through a Unix domain socket bridge.
pub struct DeviceStream {
    inner: DeviceStreamInner,
}

enum DeviceStreamInner {
    #[cfg(target_os = "linux")]
    Rfcomm(std::fs::File),
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
}

impl Read for DeviceStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            #[cfg(target_os = "linux")]
            DeviceStreamInner::Rfcomm(file) => file.read(buf),
            #[cfg(unix)]
            DeviceStreamInner::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for DeviceStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            #[cfg(target_os = "linux")]
            DeviceStreamInner::Rfcomm(file) => file.write(buf),
            #[cfg(unix)]
            DeviceStreamInner::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            #[cfg(target_os = "linux")]
            DeviceStreamInner::Rfcomm(file) => file.flush(),
            #[cfg(unix)]
            DeviceStreamInner::Unix(stream) => stream.flush(),
        }
    }
}

impl DeviceStream {
    /// Wrap a connected RFCOMM socket descriptor.
    #[cfg(target_os = "linux")]
    pub(crate) fn from_rfcomm(file: std::fs::File) -> Self {
        Self {
            inner: DeviceStreamInner::Rfcomm(file),
        }
    }

    /// Wrap a connected Unix domain socket stream.
    #[cfg(unix)]
    pub fn from_unix(stream: std::os::unix::net::UnixStream) -> Self {
        Self {
            inner: DeviceStreamInner::Unix(stream),
        }
    }

    /// Connect to a Unix domain socket bridge (blocking).
    #[cfg(unix)]
    pub fn connect_unix(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let stream = std::os::unix::net::UnixStream::connect(path).map_err(|e| {
            TransportError::Connect {
                target: path.display().to_string(),
                source: e,
            }
        })?;
        debug!(?path, "connected to unix domain socket bridge");
        Ok(Self::from_unix(stream))
    }

    /// Connect to a Unix domain socket bridge (unsupported on this platform).
    #[cfg(not(unix))]
    pub fn connect_unix(_path: impl AsRef<Path>) -> Result<Self> {
        Err(TransportError::Unsupported("unix domain socket"))
    }

    /// Try to clone this stream (creates a new file descriptor).
    ///
    /// Both handles refer to the same socket, so the read loop and the
    /// writer can live on different threads.
    pub fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            #[cfg(target_os = "linux")]
            DeviceStreamInner::Rfcomm(file) => Ok(Self::from_rfcomm(file.try_clone()?)),
            #[cfg(unix)]
            DeviceStreamInner::Unix(stream) => Ok(Self::from_unix(stream.try_clone()?)),
        }
    }

    /// Shut down both directions of the underlying socket.
    ///
    /// Unlike dropping a handle, this wakes every clone blocked in `read`.
    pub fn shutdown(&self) -> Result<()> {
        match &self.inner {
            #[cfg(target_os = "linux")]
            DeviceStreamInner::Rfcomm(file) => {
                use std::os::fd::AsRawFd;

                // SAFETY: `file` owns an open socket descriptor for the lifetime of this call.
                let rc = unsafe { libc::shutdown(file.as_raw_fd(), libc::SHUT_RDWR) };
                if rc == 0 {
                    Ok(())
                } else {
                    Err(std::io::Error::last_os_error().into())
                }
            }
            #[cfg(unix)]
            DeviceStreamInner::Unix(stream) => stream
                .shutdown(std::net::Shutdown::Both)
                .map_err(Into::into),
        }
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        match &self.inner {
            #[cfg(target_os = "linux")]
            DeviceStreamInner::Rfcomm(_) => "rfcomm",
            #[cfg(unix)]
            DeviceStreamInner::Unix(_) => "unix-domain-socket",
        }
    }
}

impl std::fmt::Debug for DeviceStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceStream")
            .field("type", &self.transport_name())
            .finish()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::io::{Read, Write};
    use std::os::unix::net::UnixStream;

    use super::*;

    #[test]
    fn unix_stream_reads_and_writes() {
        let (left, mut right) = UnixStream::pair().unwrap();
        let mut stream = DeviceStream::from_unix(left);

        stream.write_all(&[0x01, 0x02]).unwrap();
        let mut buf = [0u8; 2];
        right.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [0x01, 0x02]);

        right.write_all(b"ok").unwrap();
        stream.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ok");
    }

    #[test]
    fn shutdown_wakes_cloned_reader() {
        let (left, _right) = UnixStream::pair().unwrap();
        let stream = DeviceStream::from_unix(left);
        let mut reader = stream.try_clone().unwrap();

        let handle = std::thread::spawn(move || {
            let mut buf = [0u8; 8];
            reader.read(&mut buf)
        });

        std::thread::sleep(std::time::Duration::from_millis(20));
        stream.shutdown().unwrap();

        let read = handle.join().unwrap();
        assert!(matches!(read, Ok(0) | Err(_)));
    }

    #[test]
    fn connect_unix_missing_path_fails() {
        let path = std::env::temp_dir().join(format!("pixelbox-missing-{}.sock", std::process::id()));
        let err = DeviceStream::connect_unix(&path).unwrap_err();
        assert!(matches!(err, TransportError::Connect { .. }));
    }

    #[test]
    fn debug_names_transport() {
        let (left, _right) = UnixStream::pair().unwrap();
        let stream = DeviceStream::from_unix(left);
        assert_eq!(format!("{stream:?}"), "DeviceStream { type: \"unix-domain-socket\" }");
    }
}
