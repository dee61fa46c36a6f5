//! Decoder for messages the device sends back.

use std::fmt;

use pixelbox_frame::{unwrap, unwrap_partial};
use serde::Serialize;
use tracing::{debug, warn};

use crate::constants::{
    ACKNOWLEDGE, ALARM_CONFIG, ANIMATION_SET, BRIGHTNESS_SET, BUTTON_PRESS, CHANNEL_SET,
    IMAGE_SET, INCOMING_HEADER, INCOMING_MARKER, SETTINGS_SET, TIME_SET, VOLUME_SET,
};
use crate::error::{ProtocolError, Result};
use crate::types::Channel;

/// Known button press patterns and their descriptions.
const BUTTON_PATTERNS: &[(&[u8], &str)] = &[
    (&[19, 1, 50, 0], "Play button was pressed"),
    (&[23, 0], "Light button was double-clicked"),
    (&[19, 1, 30, 0], "Clock button was double-clicked"),
];

/// One decoded device message.
///
/// Only the fields the command is known to carry are set. The description is
/// empty for command ids (or data shapes) nobody has identified yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub command: u8,
    pub data: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<u8>,
    pub description: String,
}

impl Message {
    /// Table name of the reported channel, if it has one.
    pub fn channel_name(&self) -> Option<&'static str> {
        self.channel.and_then(Channel::from_code).map(Channel::name)
    }

    pub fn is_known(&self) -> bool {
        !self.description.is_empty()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_known() {
            f.write_str(&self.description)
        } else {
            write!(f, "Unknown message with command ID {} and data [", self.command)?;
            for (i, byte) in self.data.iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{byte}")?;
            }
            f.write_str("]")
        }
    }
}

/// Decode one unwrapped payload of the form `[0x04, command, 0x55, data...]`.
pub fn decode_message(payload: &[u8]) -> Result<Message> {
    let [header, command, marker, data @ ..] = payload else {
        return Err(ProtocolError::Malformed { len: payload.len() });
    };
    if *header != INCOMING_HEADER || *marker != INCOMING_MARKER {
        return Err(ProtocolError::Malformed { len: payload.len() });
    }

    let mut message = Message {
        command: *command,
        data: data.to_vec(),
        channel: None,
        brightness: None,
        volume: None,
        description: String::new(),
    };

    match *command {
        SETTINGS_SET if data.len() >= 21 => {
            let channel = data[20];
            let name = Channel::from_code(channel).map_or("", Channel::name);
            message.channel = Some(channel);
            message.brightness = Some(data[6]);
            message.description = format!(
                "Updated settings to brightness {} and channel {channel} ({name})",
                data[6]
            );
        }
        SETTINGS_SET if data.len() >= 20 => {
            message.brightness = Some(data[6]);
            message.description =
                format!("Received requested settings with brightness {}", data[6]);
        }
        CHANNEL_SET => {
            if let Some(&channel) = data.first() {
                message.channel = Some(channel);
                message.description = format!("Set channel to {channel}");
            }
        }
        BRIGHTNESS_SET => {
            if let Some(&brightness) = data.first() {
                message.brightness = Some(brightness);
                message.description = format!("Set brightness to {brightness}");
            }
        }
        TIME_SET => message.description = "Time was set".to_string(),
        IMAGE_SET => message.description = "Image was shown".to_string(),
        ANIMATION_SET => message.description = "Animation was shown".to_string(),
        ACKNOWLEDGE => {
            if let Some(&brightness) = data.first() {
                message.brightness = Some(brightness);
                message.description =
                    format!("Light or clock was set with brightness {brightness}");
            }
        }
        VOLUME_SET => {
            if let Some(&volume) = data.first() {
                message.volume = Some(volume);
                message.description = format!("Volume was set to {volume}/16");
            }
        }
        BUTTON_PRESS => {
            if let Some((_, text)) = BUTTON_PATTERNS.iter().find(|(pattern, _)| *pattern == data) {
                message.description = (*text).to_string();
            }
        }
        ALARM_CONFIG => match data {
            [0] => message.description = "Exit alarm config".to_string(),
            [10] => message.description = "Entered alarm config".to_string(),
            _ => {}
        },
        _ => {}
    }

    if !message.is_known() {
        debug!(command = message.command, len = data.len(), "unrecognized device message");
    }
    Ok(message)
}

/// Unwrap and decode every message in a received buffer.
///
/// All or nothing: one bad envelope or malformed payload fails the batch.
pub fn parse_incoming(buffer: &[u8]) -> Result<Vec<Message>> {
    unwrap(buffer)?
        .iter()
        .map(|payload| decode_message(payload))
        .collect()
}

/// Result of [`parse_incoming_partial`].
#[derive(Debug, Default)]
pub struct PartialParse {
    /// Messages that decoded cleanly, in arrival order.
    pub messages: Vec<Message>,
    /// Framing failure (at most one, and always last) and malformed payloads.
    pub errors: Vec<ProtocolError>,
}

impl PartialParse {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Decode what can be decoded from a received buffer.
///
/// Malformed payloads are skipped and reported. A framing error stops
/// unwrapping, keeping the messages decoded before it.
pub fn parse_incoming_partial(buffer: &[u8]) -> PartialParse {
    let unwrapped = unwrap_partial(buffer);
    let mut result = PartialParse::default();

    for payload in &unwrapped.payloads {
        match decode_message(payload) {
            Ok(message) => result.messages.push(message),
            Err(err) => {
                warn!(error = %err, "skipping malformed device message");
                result.errors.push(err);
            }
        }
    }
    if let Some(err) = unwrapped.error {
        warn!(error = %err, "stopped decoding at bad envelope");
        result.errors.push(err.into());
    }
    result
}
