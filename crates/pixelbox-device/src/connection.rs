use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use pixelbox_frame::{ChunkReader, EnvelopeWriter, FrameError};
use pixelbox_protocol::{parse_incoming, parse_incoming_partial, Message};
use pixelbox_transport::DeviceStream;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ConnectionConfig;
use crate::dispatch::{on_worker_thread, Dispatcher, Listener, ListenerSet};
use crate::error::{DeviceError, Result};

/// Lifecycle of a [`Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ConnectionState {
    /// Never connected, or closed by [`Connection::disconnect`].
    Disconnected = 0,
    /// Socket is being opened.
    Connecting = 1,
    /// Reading and writing.
    Active = 2,
    /// A read or write failed. Only a new `connect` recovers.
    Failed = 3,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Connecting,
            2 => Self::Active,
            3 => Self::Failed,
            _ => Self::Disconnected,
        }
    }
}

struct Shared {
    state: AtomicU8,
    dropped: Arc<AtomicU64>,
    received: AtomicU64,
}

impl Shared {
    fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set(&self, state: ConnectionState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Move `Active` to `Failed`; any other state is left alone.
    fn fail(&self) -> bool {
        self.state
            .compare_exchange(
                ConnectionState::Active as u8,
                ConnectionState::Failed as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A session with one device.
///
/// The connection owns the socket. A background thread reads chunks of up
/// to `chunk_size` bytes and hands them to the registered listeners through
/// a bounded queue; [`send`](Self::send) writes on the caller's thread.
/// Any read or write error retires the session for good.
///
/// With the default [`OverflowPolicy::DropNewest`](crate::OverflowPolicy::DropNewest)
/// a full queue drops incoming chunks rather than stalling the reader; see
/// [`dropped_chunks`](Self::dropped_chunks). Use `Block` to never lose data.
///
/// All methods take `&self`, so a connection can be shared behind an `Arc`.
pub struct Connection {
    config: ConnectionConfig,
    shared: Arc<Shared>,
    listeners: ListenerSet,
    writer: Mutex<Option<EnvelopeWriter<DeviceStream>>>,
    control: Mutex<Option<DeviceStream>>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl Connection {
    /// Create an inert connection. Nothing is opened until [`connect`](Self::connect).
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            shared: Arc::new(Shared {
                state: AtomicU8::new(ConnectionState::Disconnected as u8),
                dropped: Arc::new(AtomicU64::new(0)),
                received: AtomicU64::new(0),
            }),
            listeners: ListenerSet::default(),
            writer: Mutex::new(None),
            control: Mutex::new(None),
            reader: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    pub fn is_active(&self) -> bool {
        self.state() == ConnectionState::Active
    }

    /// Chunks dropped because the dispatch queue was full.
    pub fn dropped_chunks(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    /// Chunks read from the socket since the connection was created.
    pub fn received_chunks(&self) -> u64 {
        self.shared.received.load(Ordering::Relaxed)
    }

    /// Open the RFCOMM socket to the configured device and start reading.
    ///
    /// Blocks without a timeout until the Bluetooth stack gives up. On
    /// failure the state returns to `Disconnected`.
    pub fn connect(&self) -> Result<()> {
        self.begin()?;
        info!(
            address = %self.config.address,
            channel = self.config.channel,
            "connecting to device"
        );
        match open_rfcomm(&self.config) {
            Ok(stream) => self.start(stream),
            Err(err) => {
                warn!(error = %err, "connect failed");
                self.shared.set(ConnectionState::Disconnected);
                Err(err)
            }
        }
    }

    /// Run the session over an already connected stream, such as a Unix
    /// socket bridge to a simulator.
    pub fn attach(&self, stream: DeviceStream) -> Result<()> {
        self.begin()?;
        info!(transport = stream.transport_name(), "attaching device stream");
        self.start(stream)
    }

    fn begin(&self) -> Result<()> {
        for from in [ConnectionState::Disconnected, ConnectionState::Failed] {
            if self
                .shared
                .state
                .compare_exchange(
                    from as u8,
                    ConnectionState::Connecting as u8,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok()
            {
                // a failed session may still hold its socket and reader
                self.release();
                return Ok(());
            }
        }
        Err(DeviceError::AlreadyConnected)
    }

    fn start(&self, stream: DeviceStream) -> Result<()> {
        match self.spawn_reader(stream) {
            Ok(handle) => {
                *lock(&self.reader) = Some(handle);
                Ok(())
            }
            Err(err) => {
                self.shared.set(ConnectionState::Disconnected);
                Err(err)
            }
        }
    }

    fn spawn_reader(&self, stream: DeviceStream) -> Result<JoinHandle<()>> {
        let control = stream.try_clone()?;
        let mut reader =
            ChunkReader::with_chunk_size(stream.try_clone()?, self.config.dispatch.chunk_size);
        let dispatcher = Dispatcher::start(
            &self.config.dispatch,
            self.listeners.clone(),
            Arc::clone(&self.shared.dropped),
        )?;

        *lock(&self.control) = Some(control);
        *lock(&self.writer) = Some(EnvelopeWriter::new(stream));
        // set before the reader runs so an immediate read error lands on Failed
        self.shared.set(ConnectionState::Active);

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("pixelbox-reader".to_string())
            .spawn(move || {
                loop {
                    match reader.read_chunk() {
                        Ok(chunk) => {
                            shared.received.fetch_add(1, Ordering::Relaxed);
                            debug!(bytes = chunk.len(), "received chunk");
                            if !dispatcher.dispatch(chunk) {
                                break;
                            }
                        }
                        Err(FrameError::ConnectionClosed) => {
                            if shared.fail() {
                                warn!("device closed the connection");
                            }
                            break;
                        }
                        Err(err) => {
                            if shared.fail() {
                                warn!(error = %err, "read failed, connection retired");
                            }
                            break;
                        }
                    }
                }
                dispatcher.close();
                debug!("reader stopped");
            });

        spawned.map_err(|err| {
            if let Some(control) = lock(&self.control).take() {
                let _ = control.shutdown();
            }
            lock(&self.writer).take();
            DeviceError::Io(err)
        })
    }

    /// Write one envelope-wrapped command (blocking).
    ///
    /// Fails with [`DeviceError::NotConnected`] without any I/O unless the
    /// connection is active. A write error retires the connection.
    pub fn send(&self, wire: &[u8]) -> Result<()> {
        self.send_all(std::slice::from_ref(&wire))
    }

    /// Write several wrapped commands back to back, holding the writer for
    /// the whole batch so no other sender can interleave. Animation packets
    /// must go out this way.
    pub fn send_all<B: AsRef<[u8]>>(&self, packets: &[B]) -> Result<()> {
        if !self.is_active() {
            return Err(DeviceError::NotConnected);
        }
        let mut guard = lock(&self.writer);
        let Some(writer) = guard.as_mut() else {
            return Err(DeviceError::NotConnected);
        };

        for packet in packets {
            // the reader may have failed while we waited for the lock
            if !self.is_active() {
                return Err(DeviceError::NotConnected);
            }
            if let Err(err) = writer.write_wrapped(packet.as_ref()) {
                warn!(error = %err, "write failed, connection retired");
                self.shared.fail();
                if let Some(control) = lock(&self.control).as_ref() {
                    let _ = control.shutdown();
                }
                return Err(err.into());
            }
        }
        debug!(packets = packets.len(), "sent");
        Ok(())
    }

    /// Register a callback for every raw chunk read from the device.
    ///
    /// Chunks are whatever one read returned; an envelope may be split
    /// across chunks or several may share one.
    pub fn add_listener<F>(&self, listener: F)
    where
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(listener);
        self.listeners.push(listener);
    }

    /// Register a callback for decoded device messages.
    ///
    /// Each chunk is parsed on its own. Strict mode drops a chunk entirely
    /// on the first bad envelope or payload; lenient mode keeps what decodes.
    pub fn add_message_listener<F>(&self, lenient: bool, listener: F)
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        self.add_listener(move |chunk: &[u8]| {
            if lenient {
                let parsed = parse_incoming_partial(chunk);
                for err in &parsed.errors {
                    debug!(error = %err, "undecodable device data");
                }
                parsed.messages.iter().for_each(&listener);
            } else {
                match parse_incoming(chunk) {
                    Ok(messages) => messages.iter().for_each(&listener),
                    Err(err) => warn!(error = %err, bytes = chunk.len(), "dropping undecodable chunk"),
                }
            }
        });
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn clear_listeners(&self) {
        self.listeners.clear();
    }

    /// Close the socket and stop the reader. Safe to call in any state.
    ///
    /// When called from inside a listener the reader is left to finish on
    /// its own instead of being joined.
    pub fn disconnect(&self) -> Result<()> {
        let previous = self.state();
        self.shared.set(ConnectionState::Disconnected);
        self.release();
        if previous != ConnectionState::Disconnected {
            info!(?previous, "disconnected");
        }
        Ok(())
    }

    fn release(&self) {
        if let Some(control) = lock(&self.control).take() {
            if let Err(err) = control.shutdown() {
                debug!(error = %err, "socket shutdown");
            }
        }
        lock(&self.writer).take();

        let handle = lock(&self.reader).take();
        if let Some(handle) = handle {
            if on_worker_thread() {
                return;
            }
            if handle.join().is_err() {
                warn!("reader thread panicked");
            }
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        let _ = self.disconnect();
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("address", &self.config.address)
            .field("channel", &self.config.channel)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(target_os = "linux")]
fn open_rfcomm(config: &ConnectionConfig) -> Result<DeviceStream> {
    pixelbox_transport::connect_rfcomm(config.address, config.channel).map_err(DeviceError::from)
}

#[cfg(not(target_os = "linux"))]
fn open_rfcomm(_config: &ConnectionConfig) -> Result<DeviceStream> {
    Err(pixelbox_transport::TransportError::Unsupported("rfcomm").into())
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::Shutdown;
    use std::os::unix::net::UnixStream;
    use std::time::{Duration, Instant};

    use crossbeam::channel;
    use pixelbox_frame::wrap;
    use pixelbox_protocol::{build_animation_command, set_brightness, Color, Raster};
    use pixelbox_transport::BdAddr;

    use super::*;
    use crate::config::OverflowPolicy;

    fn config() -> ConnectionConfig {
        ConnectionConfig::new(BdAddr::new([0x11, 0x75, 0x58, 0x2A, 0x3B, 0x4C]), 1)
    }

    fn attached() -> (Connection, UnixStream) {
        let (ours, theirs) = UnixStream::pair().expect("socket pair should open");
        let connection = Connection::new(config());
        connection
            .attach(DeviceStream::from_unix(ours))
            .expect("attach should succeed");
        (connection, theirs)
    }

    fn wait_for(condition: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn send_before_connect_fails_without_io() {
        let connection = Connection::new(config());
        assert_eq!(connection.state(), ConnectionState::Disconnected);
        assert!(matches!(connection.send(&[0x01]), Err(DeviceError::NotConnected)));
    }

    #[test]
    fn failed_connect_returns_to_disconnected() {
        let connection = Connection::new(config());
        assert!(connection.connect().is_err());
        assert_eq!(connection.state(), ConnectionState::Disconnected);
        assert!(matches!(connection.send(&[0x01]), Err(DeviceError::NotConnected)));
    }

    #[test]
    fn send_writes_bytes_unchanged() {
        let (connection, mut device) = attached();
        assert!(connection.is_active());

        let wire = set_brightness(50).expect("valid brightness");
        connection.send(&wire).expect("send should succeed");

        let mut received = vec![0u8; wire.len()];
        device.read_exact(&mut received).expect("device should receive");
        assert_eq!(received, wire);
    }

    #[test]
    fn send_all_writes_packets_in_order() {
        let (connection, mut device) = attached();
        let frames = vec![Raster::filled(16, 16, Color::WHITE); 12];
        let packets = build_animation_command(&frames, &[100; 12]).expect("valid animation");
        assert!(packets.len() > 1);

        connection.send_all(&packets).expect("send should succeed");

        let expected: Vec<u8> = packets.concat();
        let mut received = vec![0u8; expected.len()];
        device.read_exact(&mut received).expect("device should receive");
        assert_eq!(received, expected);
    }

    #[test]
    fn attach_twice_is_rejected() {
        let (connection, _device) = attached();
        let (spare, _other) = UnixStream::pair().expect("socket pair should open");
        assert!(matches!(
            connection.attach(DeviceStream::from_unix(spare)),
            Err(DeviceError::AlreadyConnected)
        ));
    }

    #[test]
    fn listeners_receive_chunks() {
        let (connection, mut device) = attached();
        let (tx, rx) = channel::unbounded();
        connection.add_listener(move |chunk: &[u8]| {
            let _ = tx.send(chunk.to_vec());
        });
        assert_eq!(connection.listener_count(), 1);

        let wire = wrap(&[0x04, 0x32, 0x55, 0x55]);
        device.write_all(&wire).expect("device write");

        let chunk = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("listener should be called");
        assert_eq!(chunk, wire);
        assert_eq!(connection.received_chunks(), 1);
    }

    #[test]
    fn message_listener_decodes() {
        let (connection, mut device) = attached();
        let (tx, rx) = channel::unbounded();
        connection.add_message_listener(false, move |message: &Message| {
            let _ = tx.send(message.clone());
        });

        let mut wire = wrap(&[0x04, 0x32, 0x55, 0x55]);
        wire.extend_from_slice(&wrap(&[0x04, 0x09, 0x55, 0x0C]));
        device.write_all(&wire).expect("device write");

        let first = rx.recv_timeout(Duration::from_secs(5)).expect("first message");
        let second = rx.recv_timeout(Duration::from_secs(5)).expect("second message");
        assert_eq!(first.brightness, Some(85));
        assert_eq!(second.to_string(), "Volume was set to 12/16");
    }

    #[test]
    fn large_reads_are_split_into_chunks() {
        let (ours, mut device) = UnixStream::pair().expect("socket pair should open");
        let connection = Connection::new(config().with_chunk_size(16));
        let (tx, rx) = channel::unbounded();
        connection.add_listener(move |chunk: &[u8]| {
            let _ = tx.send(chunk.len());
        });
        connection
            .attach(DeviceStream::from_unix(ours))
            .expect("attach should succeed");

        device.write_all(&[0xAB; 40]).expect("device write");
        let mut total = 0;
        while total < 40 {
            let len = rx.recv_timeout(Duration::from_secs(5)).expect("chunk");
            assert!(len <= 16);
            total += len;
        }
        assert_eq!(total, 40);
    }

    #[test]
    fn peer_close_fails_connection() {
        let (connection, device) = attached();
        drop(device);

        assert!(wait_for(|| connection.state() == ConnectionState::Failed));
        assert!(matches!(connection.send(&[0x01]), Err(DeviceError::NotConnected)));
    }

    #[test]
    fn write_error_retires_connection() {
        let (ours, _device) = UnixStream::pair().expect("socket pair should open");
        ours.shutdown(Shutdown::Write).expect("shutdown write half");

        let connection = Connection::new(config());
        connection
            .attach(DeviceStream::from_unix(ours))
            .expect("attach should succeed");

        let wire = set_brightness(10).expect("valid brightness");
        assert!(matches!(connection.send(&wire), Err(DeviceError::Frame(_))));
        assert_eq!(connection.state(), ConnectionState::Failed);
        assert!(matches!(connection.send(&wire), Err(DeviceError::NotConnected)));
    }

    #[test]
    fn reconnect_after_failure() {
        let (connection, device) = attached();
        drop(device);
        assert!(wait_for(|| connection.state() == ConnectionState::Failed));

        let (ours, mut device) = UnixStream::pair().expect("socket pair should open");
        connection
            .attach(DeviceStream::from_unix(ours))
            .expect("attach after failure should succeed");
        assert!(connection.is_active());

        connection.send(&wrap(&[0x46])).expect("send should succeed");
        let mut received = [0u8; 7];
        device.read_exact(&mut received).expect("device should receive");
        assert_eq!(received, [0x01, 0x03, 0x00, 0x46, 0x49, 0x00, 0x02]);
    }

    #[test]
    fn disconnect_stops_reader_and_is_idempotent() {
        let (connection, _device) = attached();
        connection.disconnect().expect("disconnect");
        assert_eq!(connection.state(), ConnectionState::Disconnected);
        assert!(matches!(connection.send(&[0x01]), Err(DeviceError::NotConnected)));
        connection.disconnect().expect("second disconnect");
    }

    #[test]
    fn slow_listener_does_not_stall_reading() {
        let (ours, mut device) = UnixStream::pair().expect("socket pair should open");
        let connection = Connection::new(
            config()
                .with_queue_capacity(1)
                .with_overflow(OverflowPolicy::DropNewest),
        );
        let (entered_tx, entered_rx) = channel::bounded::<()>(1);
        let (release_tx, release_rx) = channel::bounded::<()>(0);
        connection.add_listener(move |_chunk: &[u8]| {
            let _ = entered_tx.try_send(());
            let _ = release_rx.recv_timeout(Duration::from_secs(5));
        });
        connection
            .attach(DeviceStream::from_unix(ours))
            .expect("attach should succeed");

        device.write_all(&[0x01]).expect("device write");
        entered_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("listener should be busy");

        // three full chunks while the only worker is busy
        device.write_all(&[0x02; 128 * 3]).expect("device write");
        assert!(wait_for(|| connection.received_chunks() >= 4));
        assert!(connection.dropped_chunks() >= 1);

        drop(release_tx);
        connection.disconnect().expect("disconnect");
    }
}
