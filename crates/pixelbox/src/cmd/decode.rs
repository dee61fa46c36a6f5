use pixelbox_protocol::{parse_incoming, parse_incoming_partial};

use crate::cmd::DecodeArgs;
use crate::exit::{protocol_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_messages, OutputFormat};

/// Decode captured device bytes without a connection.
///
/// Lenient mode prints what decodes, reports the rest on stderr and exits
/// with data-invalid if anything was skipped.
pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = parse_hex(&args.hex)?;

    if !args.lenient {
        let messages = parse_incoming(&bytes).map_err(|err| protocol_error("decode", err))?;
        print_messages(&messages, format);
        return Ok(SUCCESS);
    }

    let parsed = parse_incoming_partial(&bytes);
    print_messages(&parsed.messages, format);
    for err in &parsed.errors {
        eprintln!("skipped: {err}");
    }
    Ok(if parsed.is_clean() { SUCCESS } else { DATA_INVALID })
}

fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let digits: Vec<u8> = input
        .bytes()
        .filter(|b| !b.is_ascii_whitespace() && *b != b':')
        .collect();
    if digits.len() % 2 != 0 {
        return Err(CliError::usage("hex input has an odd number of digits"));
    }

    digits
        .chunks_exact(2)
        .map(|pair| match (hex_digit(pair[0]), hex_digit(pair[1])) {
            (Some(hi), Some(lo)) => Ok(hi << 4 | lo),
            _ => Err(CliError::usage(format!("invalid hex input {input:?}"))),
        })
        .collect()
}

fn hex_digit(byte: u8) -> Option<u8> {
    (byte as char).to_digit(16).map(|d| d as u8)
}
