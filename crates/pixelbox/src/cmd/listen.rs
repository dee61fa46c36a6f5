use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{self, RecvTimeoutError};
use pixelbox_device::ConnectionState;
use pixelbox_protocol::Message;
use tracing::info;

use crate::cmd::ListenArgs;
use crate::exit::{CliError, CliResult, INTERNAL, SUCCESS, TRANSPORT_ERROR};
use crate::output::{print_message, OutputFormat};
use crate::session::{describe, open, DeviceOptions};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

pub fn run(args: ListenArgs, format: OutputFormat, device: &DeviceOptions) -> CliResult<i32> {
    if device.dry_run {
        return Err(CliError::usage("listen has nothing to print with --dry-run"));
    }

    let target = device.target()?;
    let (tx, rx) = channel::unbounded::<Message>();
    let lenient = args.lenient;
    let connection = open(&target, |connection| {
        connection.add_message_listener(lenient, move |message: &Message| {
            let _ = tx.send(message.clone());
        });
    })?;
    info!(device = %describe(&target), lenient, "listening");

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;
    let result = loop {
        if !running.load(Ordering::SeqCst) {
            break Ok(SUCCESS);
        }
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(message) => {
                print_message(&message, true, format);
                printed = printed.saturating_add(1);
                if args.count.is_some_and(|count| printed >= count) {
                    break Ok(SUCCESS);
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if connection.state() == ConnectionState::Failed {
                    break Err(CliError::new(TRANSPORT_ERROR, "device connection lost"));
                }
            }
            Err(RecvTimeoutError::Disconnected) => break Ok(SUCCESS),
        }
    };

    let _ = connection.disconnect();
    info!(printed, dropped = connection.dropped_chunks(), "stopped listening");
    result
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
