//! Single-packet commands.

use chrono::NaiveDateTime;
use pixelbox_protocol::{
    display_off, set_brightness, set_time, set_volume, set_weather, show_clock, show_cloud,
    show_light, show_scoreboard, show_visualisation, show_vj_effect, sync_time as now_time,
    ClockElements, ClockStyle, Color, LightStyle, WeatherType,
};

use crate::cmd::{ClockArgs, LevelArgs, LightArgs, ScoreboardArgs, SyncTimeArgs, WeatherArgs};
use crate::exit::{protocol_error, CliError, CliResult, SUCCESS};
use crate::output::OutputFormat;
use crate::session::{deliver, DeviceOptions};

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

fn send_one(
    command: &str,
    wire: Vec<u8>,
    format: OutputFormat,
    device: &DeviceOptions,
) -> CliResult<i32> {
    deliver(command, vec![wire], device, format)?;
    Ok(SUCCESS)
}

fn parse_arg<T>(kind: &str, value: &str) -> CliResult<T>
where
    T: std::str::FromStr<Err = pixelbox_protocol::ProtocolError>,
{
    value.parse().map_err(|err| protocol_error(kind, err))
}

pub fn brightness(args: LevelArgs, format: OutputFormat, device: &DeviceOptions) -> CliResult<i32> {
    let wire = set_brightness(args.value).map_err(|err| protocol_error("brightness", err))?;
    send_one("brightness", wire, format, device)
}

pub fn volume(args: LevelArgs, format: OutputFormat, device: &DeviceOptions) -> CliResult<i32> {
    let wire = set_volume(args.value).map_err(|err| protocol_error("volume", err))?;
    send_one("volume", wire, format, device)
}

pub fn weather(args: WeatherArgs, format: OutputFormat, device: &DeviceOptions) -> CliResult<i32> {
    let kind: WeatherType = parse_arg("weather", &args.weather)?;
    let wire = set_weather(args.temperature, kind).map_err(|err| protocol_error("weather", err))?;
    send_one("weather", wire, format, device)
}

pub fn clock(args: ClockArgs, format: OutputFormat, device: &DeviceOptions) -> CliResult<i32> {
    let style: ClockStyle = parse_arg("clock", &args.style)?;
    let color: Color = parse_arg("clock", &args.color)?;
    let elements = ClockElements {
        time: !args.no_time,
        weather: !args.no_weather,
        temperature: !args.no_temperature,
        calendar: !args.no_calendar,
    };
    send_one("clock", show_clock(style, elements, color), format, device)
}

pub fn light(args: LightArgs, format: OutputFormat, device: &DeviceOptions) -> CliResult<i32> {
    let style: LightStyle = parse_arg("light", &args.style)?;
    let color: Color = parse_arg("light", &args.color)?;
    let wire =
        show_light(style, color, args.brightness).map_err(|err| protocol_error("light", err))?;
    send_one("light", wire, format, device)
}

pub fn vj(args: LevelArgs, format: OutputFormat, device: &DeviceOptions) -> CliResult<i32> {
    let wire = show_vj_effect(args.value).map_err(|err| protocol_error("vj", err))?;
    send_one("vj", wire, format, device)
}

pub fn visualisation(
    args: LevelArgs,
    format: OutputFormat,
    device: &DeviceOptions,
) -> CliResult<i32> {
    let wire =
        show_visualisation(args.value).map_err(|err| protocol_error("visualisation", err))?;
    send_one("visualisation", wire, format, device)
}

pub fn scoreboard(
    args: ScoreboardArgs,
    format: OutputFormat,
    device: &DeviceOptions,
) -> CliResult<i32> {
    let wire =
        show_scoreboard(args.red, args.blue).map_err(|err| protocol_error("scoreboard", err))?;
    send_one("scoreboard", wire, format, device)
}

pub fn sync_time(
    args: SyncTimeArgs,
    format: OutputFormat,
    device: &DeviceOptions,
) -> CliResult<i32> {
    let wire = match args.at.as_deref() {
        Some(input) => set_time(parse_datetime(input)?),
        None => now_time(),
    };
    send_one("sync-time", wire, format, device)
}

pub fn cloud(format: OutputFormat, device: &DeviceOptions) -> CliResult<i32> {
    send_one("cloud", show_cloud(), format, device)
}

pub fn off(format: OutputFormat, device: &DeviceOptions) -> CliResult<i32> {
    send_one("off", display_off(), format, device)
}

fn parse_datetime(input: &str) -> CliResult<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input.trim(), fmt).ok())
        .ok_or_else(|| {
            CliError::usage(format!(
                "invalid date-time {input:?} (expected YYYY-MM-DD HH:MM:SS)"
            ))
        })
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;
    use crate::exit::{DATA_INVALID, USAGE};

    #[test]
    fn datetime_accepts_space_or_t() {
        let moment = parse_datetime("2024-03-09 07:05:30").unwrap();
        assert_eq!((moment.year(), moment.month(), moment.day()), (2024, 3, 9));
        assert_eq!((moment.hour(), moment.minute(), moment.second()), (7, 5, 30));
        assert_eq!(parse_datetime("2024-03-09T07:05:30").unwrap(), moment);
    }

    #[test]
    fn datetime_rejects_garbage() {
        assert_eq!(parse_datetime("yesterday").unwrap_err().code, USAGE);
    }

    #[test]
    fn unknown_style_is_usage_error() {
        let err = parse_arg::<ClockStyle>("clock", "DIGITAL").unwrap_err();
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn out_of_range_is_data_invalid() {
        let args = LevelArgs { value: 101 };
        let err = brightness(args, OutputFormat::Pretty, &DeviceOptions::default()).unwrap_err();
        assert_eq!(err.code, DATA_INVALID);
    }
}
