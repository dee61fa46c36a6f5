//! Opening a device connection from the global command-line options.

use std::path::PathBuf;

use clap::Args;
use pixelbox_device::{Connection, ConnectionConfig};
use pixelbox_transport::{BdAddr, DeviceStream};
use tracing::debug;

use crate::config::{resolve_target, Selection, Target};
use crate::exit::{device_error, transport_error, CliResult};
use crate::output::{print_packets, OutputFormat};

/// Which device to talk to and how.
#[derive(Args, Debug, Default, Clone)]
pub struct DeviceOptions {
    /// Bluetooth address of the device (AA:BB:CC:DD:EE:FF).
    #[arg(long, env = "PIXELBOX_MAC", global = true)]
    pub mac: Option<String>,

    /// RFCOMM channel [default: 1].
    #[arg(long, env = "PIXELBOX_CHANNEL", global = true)]
    pub channel: Option<u8>,

    /// JSON device file with a `devices` list.
    #[arg(long, value_name = "FILE", env = "PIXELBOX_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Device name to pick from the device file.
    #[arg(long, value_name = "NAME", global = true)]
    pub device: Option<String>,

    /// Talk to a Unix socket bridge instead of Bluetooth.
    #[arg(long, value_name = "PATH", global = true)]
    pub unix: Option<PathBuf>,

    /// Print the wire bytes instead of connecting.
    #[arg(long, global = true)]
    pub dry_run: bool,
}

impl DeviceOptions {
    pub fn target(&self) -> CliResult<Target> {
        resolve_target(&Selection {
            mac: self.mac.as_deref(),
            channel: self.channel,
            config: self.config.as_deref(),
            device: self.device.as_deref(),
            unix: self.unix.as_deref(),
        })
    }
}

pub fn describe(target: &Target) -> String {
    match target {
        Target::Rfcomm { address, channel } => format!("{address} channel {channel}"),
        Target::Unix(path) => path.display().to_string(),
    }
}

/// Connect to `target` and return an active connection.
///
/// `prepare` runs before the socket opens, so listeners it registers see
/// everything the device sends.
pub fn open<F>(target: &Target, prepare: F) -> CliResult<Connection>
where
    F: FnOnce(&Connection),
{
    match target {
        Target::Rfcomm { address, channel } => {
            let connection = Connection::new(ConnectionConfig::new(*address, *channel));
            prepare(&connection);
            connection
                .connect()
                .map_err(|err| device_error("connect failed", err))?;
            Ok(connection)
        }
        Target::Unix(path) => {
            // the address is only used for logging on bridged streams
            let connection = Connection::new(ConnectionConfig::new(BdAddr::new([0; 6]), 0));
            prepare(&connection);
            let stream = DeviceStream::connect_unix(path)
                .map_err(|err| transport_error("connect failed", err))?;
            connection
                .attach(stream)
                .map_err(|err| device_error("attach failed", err))?;
            Ok(connection)
        }
    }
}

/// Send prebuilt packets, or print them when `--dry-run` is set.
pub fn deliver(
    command: &str,
    packets: Vec<Vec<u8>>,
    options: &DeviceOptions,
    format: OutputFormat,
) -> CliResult<()> {
    if options.dry_run {
        print_packets(command, &packets, None, format);
        return Ok(());
    }

    let target = options.target()?;
    let connection = open(&target, |_| {})?;
    let sent = connection.send_all(&packets);
    let _ = connection.disconnect();
    sent.map_err(|err| device_error("send failed", err))?;

    debug!(command, packets = packets.len(), "delivered");
    print_packets(command, &packets, Some(describe(&target).as_str()), format);
    Ok(())
}
