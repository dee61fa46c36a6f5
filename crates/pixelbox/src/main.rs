mod cmd;
mod config;
mod exit;
mod logging;
mod output;
mod session;

use clap::Parser;
use tracing::debug;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;
use crate::session::DeviceOptions;

#[derive(Parser, Debug)]
#[command(
    name = "pixelbox",
    version,
    about = "Control Pixelbox LED-matrix devices over Bluetooth"
)]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(flatten)]
    device: DeviceOptions,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    debug!(command = cli.command.name(), dry_run = cli.device.dry_run, "starting");
    let result = cmd::run(cli.command, format, &cli.device);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_device_options() {
        let cli = Cli::try_parse_from([
            "pixelbox",
            "--mac",
            "11:75:58:2A:3B:4C",
            "--channel",
            "4",
            "brightness",
            "50",
        ])
        .expect("brightness args should parse");

        assert_eq!(cli.device.mac.as_deref(), Some("11:75:58:2A:3B:4C"));
        assert_eq!(cli.device.channel, Some(4));
        assert!(matches!(cli.command, Command::Brightness(ref a) if a.value == 50));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["pixelbox", "off", "--dry-run", "--format", "json"])
            .expect("trailing globals should parse");
        assert!(cli.device.dry_run);
        assert_eq!(cli.format, Some(OutputFormat::Json));
    }

    #[test]
    fn negative_temperature_is_a_value() {
        let cli = Cli::try_parse_from(["pixelbox", "weather", "-5", "SNOW"])
            .expect("negative temperature should parse");
        match cli.command {
            Command::Weather(args) => {
                assert_eq!(args.temperature, -5);
                assert_eq!(args.weather, "SNOW");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn animation_durations_split_on_commas() {
        let cli = Cli::try_parse_from([
            "pixelbox",
            "animation",
            "a.rgb",
            "b.rgb",
            "--duration-ms",
            "100,250",
        ])
        .expect("animation args should parse");
        match cli.command {
            Command::Animation(args) => {
                assert_eq!(args.files.len(), 2);
                assert_eq!(args.duration_ms, vec![100, 250]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn animation_needs_frames() {
        let err = Cli::try_parse_from(["pixelbox", "animation"])
            .expect_err("missing frames should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn listen_flags() {
        let cli = Cli::try_parse_from(["pixelbox", "listen", "--count", "3", "--lenient"])
            .expect("listen args should parse");
        assert!(matches!(
            cli.command,
            Command::Listen(ref a) if a.count == Some(3) && a.lenient
        ));
    }
}
