//! Envelope-wrapped control commands.
//!
//! Every builder validates first and returns the complete wire bytes, ready
//! to hand to a writer. Image and animation commands live in [`crate::image`].

use chrono::{Datelike, Local, NaiveDateTime, Timelike};
use pixelbox_frame::wrap;
use serde::{Deserialize, Serialize};

use crate::constants::{
    GET_SETTINGS, SET_BRIGHTNESS, SET_CHANNEL, SET_TIME, SET_VOLUME, SET_WEATHER,
};
use crate::error::{ProtocolError, Result};
use crate::types::{Channel, ClockStyle, Color, LightStyle, WeatherType};

fn check_range(field: &'static str, value: i32, min: i32, max: i32) -> Result<u8> {
    if value < min || value > max {
        return Err(ProtocolError::OutOfRange {
            field,
            value: i64::from(value),
            min: i64::from(min),
            max: i64::from(max),
        });
    }
    Ok(value as u8)
}

/// Which sub-displays the clock face shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockElements {
    pub time: bool,
    pub weather: bool,
    pub temperature: bool,
    pub calendar: bool,
}

impl ClockElements {
    /// Every element enabled.
    pub const ALL: ClockElements = ClockElements {
        time: true,
        weather: true,
        temperature: true,
        calendar: true,
    };

    fn to_bytes(self) -> [u8; 4] {
        [
            u8::from(self.time),
            u8::from(self.weather),
            u8::from(self.temperature),
            u8::from(self.calendar),
        ]
    }
}

/// Set the display brightness, 0 to 100.
pub fn set_brightness(brightness: i32) -> Result<Vec<u8>> {
    let level = check_range("brightness", brightness, 0, 100)?;
    Ok(wrap(&[SET_BRIGHTNESS, level]))
}

/// Set the speaker volume, 0 to 16.
pub fn set_volume(volume: i32) -> Result<Vec<u8>> {
    let level = check_range("volume", volume, 0, 16)?;
    Ok(wrap(&[SET_VOLUME, level]))
}

/// Set the weather shown on the clock face.
///
/// The temperature is sent as a two's-complement byte and must lie strictly
/// between -100 and 100.
pub fn set_weather(temperature: i32, weather: WeatherType) -> Result<Vec<u8>> {
    check_range("temperature", temperature, -99, 99)?;
    Ok(wrap(&[SET_WEATHER, temperature as i8 as u8, weather.code()]))
}

/// Switch to the clock channel.
///
/// Style names are checked when parsing [`ClockStyle`], so this cannot fail.
pub fn show_clock(style: ClockStyle, elements: ClockElements, color: Color) -> Vec<u8> {
    let mut payload = vec![SET_CHANNEL, Channel::Clock.code(), 0x01, style.code()];
    payload.extend_from_slice(&elements.to_bytes());
    payload.extend_from_slice(&color.to_bytes());
    wrap(&payload)
}

/// Switch to the mood light channel.
pub fn show_light(style: LightStyle, color: Color, brightness: i32) -> Result<Vec<u8>> {
    let level = check_range("brightness", brightness, 0, 100)?;
    let [r, g, b] = color.to_bytes();
    Ok(wrap(&[
        SET_CHANNEL,
        Channel::Light.code(),
        r,
        g,
        b,
        level,
        style.code(),
        0x01, // power on
        0x00,
        0x00,
        0x00,
    ]))
}

/// Switch to the cloud channel.
pub fn show_cloud() -> Vec<u8> {
    wrap(&[SET_CHANNEL, Channel::Cloud.code()])
}

/// Switch to a VJ effect, 0 to 15.
pub fn show_vj_effect(effect: i32) -> Result<Vec<u8>> {
    let effect = check_range("effect", effect, 0, 15)?;
    Ok(wrap(&[SET_CHANNEL, Channel::Vj.code(), effect]))
}

/// Switch to a music visualisation, 0 to 11.
pub fn show_visualisation(visualisation: i32) -> Result<Vec<u8>> {
    let visualisation = check_range("visualisation", visualisation, 0, 11)?;
    Ok(wrap(&[SET_CHANNEL, Channel::Visualisation.code(), visualisation]))
}

/// Show the scoreboard with both scores, each 0 to 999.
pub fn show_scoreboard(red: i32, blue: i32) -> Result<Vec<u8>> {
    for (field, score) in [("red score", red), ("blue score", blue)] {
        if !(0..=999).contains(&score) {
            return Err(ProtocolError::OutOfRange {
                field,
                value: i64::from(score),
                min: 0,
                max: 999,
            });
        }
    }
    let [red_lo, red_hi] = (red as u16).to_le_bytes();
    let [blue_lo, blue_hi] = (blue as u16).to_le_bytes();
    Ok(wrap(&[
        SET_CHANNEL,
        Channel::Scoreboard.code(),
        0x00,
        red_lo,
        red_hi,
        blue_lo,
        blue_hi,
    ]))
}

/// Set the device clock to `moment`.
pub fn set_time(moment: NaiveDateTime) -> Vec<u8> {
    let year = moment.year();
    wrap(&[
        SET_TIME,
        (year % 100) as u8,
        (year / 100) as u8,
        moment.month() as u8,
        moment.day() as u8,
        moment.hour() as u8,
        moment.minute() as u8,
        moment.second() as u8,
        0x00,
    ])
}

/// Set the device clock to the local wall-clock time.
pub fn sync_time() -> Vec<u8> {
    set_time(Local::now().naive_local())
}

/// Ask the device for a settings report.
pub fn get_settings() -> Vec<u8> {
    wrap(&[GET_SETTINGS])
}

/// Blank the display by switching the light channel off.
pub fn display_off() -> Vec<u8> {
    wrap(&[
        SET_CHANNEL,
        Channel::Light.code(),
        0x00,
        0x00,
        0x00, // color
        0x00, // brightness
        0x00, // style
        0x00, // power off
        0x00,
        0x00,
        0x00,
    ])
}
