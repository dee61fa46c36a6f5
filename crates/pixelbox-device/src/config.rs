use pixelbox_frame::READ_CHUNK_SIZE;
use pixelbox_transport::BdAddr;
use serde::{Deserialize, Serialize};

/// Default RFCOMM channel of the device's serial port profile.
pub const DEFAULT_RFCOMM_CHANNEL: u8 = 1;

/// Default number of received chunks waiting for listeners.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// What the read loop does when the dispatch queue is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Drop the chunk that did not fit and count it. The read loop never waits.
    #[default]
    DropNewest,
    /// Wait for a free slot. A slow listener then stalls reading.
    Block,
}

/// How received chunks reach listeners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Bounded queue between the read loop and the workers.
    pub queue_capacity: usize,
    /// Worker threads invoking listeners. With more than one, listener
    /// calls for successive chunks may overlap and complete out of order.
    pub workers: usize,
    pub overflow: OverflowPolicy,
    /// Largest single read from the socket.
    pub chunk_size: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            workers: 1,
            overflow: OverflowPolicy::default(),
            chunk_size: READ_CHUNK_SIZE,
        }
    }
}

/// Everything needed to open and run one device connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub address: BdAddr,
    pub channel: u8,
    pub dispatch: DispatchConfig,
}

impl ConnectionConfig {
    pub fn new(address: BdAddr, channel: u8) -> Self {
        Self {
            address,
            channel,
            dispatch: DispatchConfig::default(),
        }
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.dispatch.queue_capacity = capacity.max(1);
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.dispatch.workers = workers.max(1);
        self
    }

    pub fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.dispatch.overflow = overflow;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.dispatch.chunk_size = chunk_size.max(1);
        self
    }
}
