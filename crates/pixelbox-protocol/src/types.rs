//! Lookup tables for named protocol arguments.
//!
//! Names are matched exactly and case-sensitively; anything else is an
//! [`ProtocolError::UnknownType`], never a silent default.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

macro_rules! code_table {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident = $code:literal => $text:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Every entry, in table order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Byte sent to the device.
            pub fn code(self) -> u8 {
                match self {
                    $($name::$variant => $code,)+
                }
            }

            /// Table name as accepted by `FromStr`.
            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }

            /// Reverse lookup by device byte.
            pub fn from_code(code: u8) -> Option<Self> {
                match code {
                    $($code => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl FromStr for $name {
            type Err = ProtocolError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err(ProtocolError::UnknownType {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

code_table! {
    /// Display mode of the device.
    Channel, "channel" {
        Clock = 0 => "CLOCK",
        Light = 1 => "LIGHT",
        Cloud = 2 => "CLOUD",
        Vj = 3 => "VJ",
        Visualisation = 4 => "VISUALISATION",
        Animation = 5 => "ANIMATION",
        Scoreboard = 6 => "SCOREBOARD",
    }
}

code_table! {
    /// Clock face layouts.
    ClockStyle, "clock" {
        FullScreen = 0 => "FULL_SCREEN",
        Rainbow = 1 => "RAINBOW",
        Boxed = 2 => "BOXED",
        AnalogSquare = 3 => "ANALOG_SQUARE",
        FullScreenInverted = 4 => "FULL_SCREEN_INVERTED",
        AnalogRound = 5 => "ANALOG_ROUND",
    }
}

code_table! {
    /// Mood light patterns.
    LightStyle, "light" {
        Plain = 0 => "PLAIN",
        TintedPink = 1 => "TINTED_PINK",
        RedBlueStriped = 2 => "RED_BLUE_STRIPED",
    }
}

code_table! {
    /// Weather icons. Codes 2 and 7 are unused by the vendor app.
    WeatherType, "weather" {
        OutdoorVeryLightClouds = 1 => "OUTDOOR_VERY_LIGHT_CLOUDS",
        CityCloudy = 3 => "CITY_CLOUDY",
        CityLightClouds = 4 => "CITY_LIGHT_CLOUDS",
        Thunderstorm = 5 => "THUNDERSTORM",
        Rain = 6 => "RAIN",
        Snow = 8 => "SNOW",
        Fog = 9 => "FOG",
    }
}

/// A 24-bit RGB color. Alpha never reaches the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(0xFF, 0xFF, 0xFF);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

/// Parses `#RRGGBB` or `RRGGBB`.
impl FromStr for Color {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ProtocolError::UnknownType {
            kind: "color",
            value: s.to_string(),
        };
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}
