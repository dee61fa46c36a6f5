use crossbeam::channel;
use pixelbox_protocol::constants::SETTINGS_SET;
use pixelbox_protocol::{get_settings, Message};
use tracing::info;

use crate::cmd::{parse_duration, SettingsArgs};
use crate::exit::{device_error, CliError, CliResult, SUCCESS, TIMEOUT};
use crate::output::{print_message, print_packets, OutputFormat};
use crate::session::{open, DeviceOptions};

/// Ask for a settings report and wait for the device's answer.
pub fn run(args: SettingsArgs, format: OutputFormat, device: &DeviceOptions) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let wire = get_settings();
    if device.dry_run {
        print_packets("settings", &[wire], None, format);
        return Ok(SUCCESS);
    }

    let (tx, rx) = channel::bounded::<Message>(1);
    let connection = open(&device.target()?, |connection| {
        connection.add_message_listener(true, move |message: &Message| {
            if message.command == SETTINGS_SET {
                let _ = tx.try_send(message.clone());
            }
        });
    })?;

    if let Err(err) = connection.send(&wire) {
        let _ = connection.disconnect();
        return Err(device_error("send failed", err));
    }
    info!(?timeout, "waiting for settings report");

    let report = rx.recv_timeout(timeout);
    let _ = connection.disconnect();
    match report {
        Ok(message) => {
            print_message(&message, false, format);
            Ok(SUCCESS)
        }
        Err(_) => Err(CliError::new(
            TIMEOUT,
            format!("no settings report within {timeout:?}"),
        )),
    }
}
