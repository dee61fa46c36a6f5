//! Opcodes and fixed marker bytes.
//!
//! All of these were recovered by watching the vendor app talk to the
//! device; names describe observed behaviour, not documentation.

// Incoming sub-header
pub const INCOMING_HEADER: u8 = 0x04;
pub const INCOMING_MARKER: u8 = 0x55;

// Incoming command ids
pub const VOLUME_SET: u8 = 0x09;
pub const ALARM_CONFIG: u8 = 0x13;
pub const TIME_SET: u8 = 0x18;
pub const ACKNOWLEDGE: u8 = 0x31;
pub const BRIGHTNESS_SET: u8 = 0x32;
pub const IMAGE_SET: u8 = 0x44;
pub const CHANNEL_SET: u8 = 0x45;
pub const SETTINGS_SET: u8 = 0x46;
pub const ANIMATION_SET: u8 = 0x49;
pub const BUTTON_PRESS: u8 = 0xBD;

// Outgoing opcodes
pub const SET_VOLUME: u8 = 0x08;
pub const SET_TIME: u8 = 0x18;
pub const SET_IMAGE: u8 = 0x44;
pub const SET_CHANNEL: u8 = 0x45;
pub const GET_SETTINGS: u8 = 0x46;
pub const SET_ANIMATION: u8 = 0x49;
pub const SET_WEATHER: u8 = 0x5F;
pub const SET_BRIGHTNESS: u8 = 0x74;

// Image frames
pub const START_OF_FRAME: u8 = 0xAA;
pub const RESET_PALETTE: u8 = 0x00;
/// Bytes between the image opcode and the first frame; meaning unknown.
pub const IMAGE_PREAMBLE: [u8; 4] = [0x00, 0x0A, 0x0A, 0x04];

// Animation streaming
pub const ANIMATION_PACKET_STRIDE: usize = 200;
pub const ANIMATION_PACKET_WINDOW: usize = 400;
