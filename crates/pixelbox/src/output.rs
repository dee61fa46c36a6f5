use std::io::{IsTerminal, Write};

use chrono::Local;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use pixelbox_protocol::Message;
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Lowercase hex without separators.
pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[derive(Serialize)]
struct PacketsOutput<'a> {
    command: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<&'a str>,
    sent: bool,
    packets: Vec<String>,
    bytes: usize,
}

/// Report wire packets that were sent to `target`, or only built when
/// `target` is `None`.
pub fn print_packets(
    command: &str,
    packets: &[Vec<u8>],
    target: Option<&str>,
    format: OutputFormat,
) {
    let bytes = packets.iter().map(Vec::len).sum();
    match format {
        OutputFormat::Json => {
            let out = PacketsOutput {
                command,
                target,
                sent: target.is_some(),
                packets: packets.iter().map(|p| hex(p)).collect(),
                bytes,
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["COMMAND", "PACKET", "SIZE", "HEX"]);
            for (index, packet) in packets.iter().enumerate() {
                table.add_row(vec![
                    command.to_string(),
                    index.to_string(),
                    packet.len().to_string(),
                    hex(packet),
                ]);
            }
            println!("{table}");
            if let Some(target) = target {
                println!("sent {bytes} bytes to {target}");
            }
        }
        OutputFormat::Pretty => {
            for packet in packets {
                println!("{}", hex(packet));
            }
        }
        OutputFormat::Raw => {
            for packet in packets {
                print_raw(packet);
            }
        }
    }
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    #[serde(flatten)]
    message: &'a Message,
    #[serde(skip_serializing_if = "Option::is_none")]
    channel_name: Option<&'static str>,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    received_at: Option<String>,
}

/// Print one decoded message. `live` adds a local receive timestamp.
pub fn print_message(message: &Message, live: bool, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = MessageOutput {
                message,
                channel_name: message.channel_name(),
                text: message.to_string(),
                received_at: live.then(|| Local::now().to_rfc3339()),
            };
            print_json(&out);
        }
        OutputFormat::Table => print_message_table(std::slice::from_ref(message)),
        OutputFormat::Pretty => println!("{message}"),
        OutputFormat::Raw => print_raw(&message.data),
    }
}

/// Print a batch of decoded messages; tables share one header.
pub fn print_messages(messages: &[Message], format: OutputFormat) {
    match format {
        OutputFormat::Table => print_message_table(messages),
        _ => {
            for message in messages {
                print_message(message, false, format);
            }
        }
    }
}

fn print_message_table(messages: &[Message]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["COMMAND", "DATA", "MESSAGE"]);
    for message in messages {
        table.add_row(vec![
            format!("0x{:02X}", message.command),
            hex(&message.data),
            message.to_string(),
        ]);
    }
    println!("{table}");
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}
