//! Command encoders and message decoder for the Pixelbox LED-matrix protocol.
//!
//! Outgoing commands are plain `[opcode, args...]` payloads wrapped in the
//! envelope from `pixelbox-frame`. Incoming device messages use the same
//! envelope but carry a `[0x04, command, 0x55, data...]` sub-header.
//!
//! All builders validate their arguments before encoding anything; a
//! rejected argument never produces bytes.

pub mod constants;
pub mod error;
pub mod image;
pub mod incoming;
pub mod outgoing;
pub mod types;

pub use error::{ProtocolError, Result};
pub use image::{
    bits_per_pixel, build_animation_command, build_image_command, convert_image, decode_image,
    packetize_animation, EncodedImage, Raster, RASTER_HEIGHT, RASTER_WIDTH,
};
pub use incoming::{decode_message, parse_incoming, parse_incoming_partial, Message, PartialParse};
pub use outgoing::{
    display_off, get_settings, set_brightness, set_time, set_volume, set_weather, show_clock,
    show_cloud, show_light, show_scoreboard, show_visualisation, show_vj_effect, sync_time,
    ClockElements,
};
pub use types::{Channel, ClockStyle, Color, LightStyle, WeatherType};
