use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;
use crate::session::DeviceOptions;

pub mod control;
pub mod decode;
pub mod image;
pub mod listen;
pub mod settings;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Set display brightness (0-100).
    Brightness(LevelArgs),
    /// Set speaker volume (0-16).
    Volume(LevelArgs),
    /// Set the weather shown on the clock face.
    Weather(WeatherArgs),
    /// Switch to the clock channel.
    Clock(ClockArgs),
    /// Switch to the mood light channel.
    Light(LightArgs),
    /// Switch to the cloud channel.
    Cloud,
    /// Show a VJ effect (0-15).
    Vj(LevelArgs),
    /// Show a music visualisation (0-11).
    Visualisation(LevelArgs),
    /// Show the scoreboard (scores 0-999).
    Scoreboard(ScoreboardArgs),
    /// Set the device clock.
    SyncTime(SyncTimeArgs),
    /// Turn the display off.
    Off,
    /// Request and print the device settings.
    Settings(SettingsArgs),
    /// Show a 16x16 raw RGB or RGBA image.
    Image(ImageArgs),
    /// Play an animation from 16x16 raw frames.
    Animation(AnimationArgs),
    /// Print messages received from the device.
    Listen(ListenArgs),
    /// Decode hex-encoded bytes received from a device.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Brightness(_) => "brightness",
            Command::Volume(_) => "volume",
            Command::Weather(_) => "weather",
            Command::Clock(_) => "clock",
            Command::Light(_) => "light",
            Command::Cloud => "cloud",
            Command::Vj(_) => "vj",
            Command::Visualisation(_) => "visualisation",
            Command::Scoreboard(_) => "scoreboard",
            Command::SyncTime(_) => "sync-time",
            Command::Off => "off",
            Command::Settings(_) => "settings",
            Command::Image(_) => "image",
            Command::Animation(_) => "animation",
            Command::Listen(_) => "listen",
            Command::Decode(_) => "decode",
            Command::Version(_) => "version",
        }
    }
}

pub fn run(command: Command, format: OutputFormat, device: &DeviceOptions) -> CliResult<i32> {
    match command {
        Command::Brightness(args) => control::brightness(args, format, device),
        Command::Volume(args) => control::volume(args, format, device),
        Command::Weather(args) => control::weather(args, format, device),
        Command::Clock(args) => control::clock(args, format, device),
        Command::Light(args) => control::light(args, format, device),
        Command::Vj(args) => control::vj(args, format, device),
        Command::Visualisation(args) => control::visualisation(args, format, device),
        Command::Scoreboard(args) => control::scoreboard(args, format, device),
        Command::SyncTime(args) => control::sync_time(args, format, device),
        Command::Cloud => control::cloud(format, device),
        Command::Off => control::off(format, device),
        Command::Settings(args) => settings::run(args, format, device),
        Command::Image(args) => image::image(args, format, device),
        Command::Animation(args) => image::animation(args, format, device),
        Command::Listen(args) => listen::run(args, format, device),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
#[command(allow_negative_numbers = true)]
pub struct LevelArgs {
    pub value: i32,
}

#[derive(Args, Debug)]
#[command(allow_negative_numbers = true)]
pub struct WeatherArgs {
    /// Temperature in degrees (-99 to 99).
    pub temperature: i32,
    /// Weather icon, e.g. RAIN or THUNDERSTORM.
    #[arg(value_name = "TYPE")]
    pub weather: String,
}

#[derive(Args, Debug)]
pub struct ClockArgs {
    /// Clock face, e.g. FULL_SCREEN or ANALOG_ROUND.
    #[arg(long, default_value = "FULL_SCREEN")]
    pub style: String,
    /// Clock color as #RRGGBB.
    #[arg(long, default_value = "#FFFFFF")]
    pub color: String,
    #[arg(long)]
    pub no_time: bool,
    #[arg(long)]
    pub no_weather: bool,
    #[arg(long)]
    pub no_temperature: bool,
    #[arg(long)]
    pub no_calendar: bool,
}

#[derive(Args, Debug)]
#[command(allow_negative_numbers = true)]
pub struct LightArgs {
    /// Light pattern, e.g. PLAIN.
    #[arg(long, default_value = "PLAIN")]
    pub style: String,
    /// Light color as #RRGGBB.
    #[arg(long, default_value = "#FFFFFF")]
    pub color: String,
    /// Light brightness (0-100).
    #[arg(long, default_value_t = 100)]
    pub brightness: i32,
}

#[derive(Args, Debug)]
#[command(allow_negative_numbers = true)]
pub struct ScoreboardArgs {
    pub red: i32,
    pub blue: i32,
}

#[derive(Args, Debug)]
pub struct SyncTimeArgs {
    /// Local time to set instead of now (YYYY-MM-DD HH:MM:SS).
    #[arg(long, value_name = "DATETIME")]
    pub at: Option<String>,
}

#[derive(Args, Debug)]
pub struct SettingsArgs {
    /// How long to wait for the settings report (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct ImageArgs {
    /// Raw 16x16 RGB (768 bytes) or RGBA (1024 bytes) file.
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct AnimationArgs {
    /// Raw 16x16 RGB or RGBA frame files, in order.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
    /// Frame durations in milliseconds; a single value applies to every frame.
    #[arg(long, value_delimiter = ',', default_value = "100")]
    pub duration_ms: Vec<u32>,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Exit after printing N messages.
    #[arg(long)]
    pub count: Option<usize>,
    /// Keep the messages of chunks that also contain undecodable data.
    #[arg(long)]
    pub lenient: bool,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Hex-encoded bytes; whitespace and colons are ignored.
    pub hex: String,
    /// Report bad envelopes and payloads instead of failing.
    #[arg(long)]
    pub lenient: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `5s`, `500ms` or a bare number of seconds.
pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
