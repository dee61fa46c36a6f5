//! Image and animation upload from raw 16x16 pixel files.

use std::fs;
use std::path::Path;

use pixelbox_protocol::{
    build_animation_command, build_image_command, Raster, RASTER_HEIGHT, RASTER_WIDTH,
};
use tracing::debug;

use crate::cmd::{AnimationArgs, ImageArgs};
use crate::exit::{io_error, protocol_error, CliResult, SUCCESS};
use crate::output::OutputFormat;
use crate::session::{deliver, DeviceOptions};

const RGBA_LEN: usize = RASTER_WIDTH * RASTER_HEIGHT * 4;

pub fn image(args: ImageArgs, format: OutputFormat, device: &DeviceOptions) -> CliResult<i32> {
    let raster = load_raster(&args.file)?;
    let wire = build_image_command(&raster).map_err(|err| protocol_error("image", err))?;
    deliver("image", vec![wire], device, format)?;
    Ok(SUCCESS)
}

pub fn animation(
    args: AnimationArgs,
    format: OutputFormat,
    device: &DeviceOptions,
) -> CliResult<i32> {
    let frames = args
        .files
        .iter()
        .map(|path| load_raster(path))
        .collect::<CliResult<Vec<_>>>()?;
    let durations = expand_durations(&args.duration_ms, frames.len());

    let packets = build_animation_command(&frames, &durations)
        .map_err(|err| protocol_error("animation", err))?;
    debug!(frames = frames.len(), packets = packets.len(), "animation built");
    deliver("animation", packets, device, format)?;
    Ok(SUCCESS)
}

/// One duration stretches over every frame; otherwise the list is used as given.
fn expand_durations(durations: &[u32], frames: usize) -> Vec<u32> {
    match durations {
        [single] => vec![*single; frames],
        many => many.to_vec(),
    }
}

/// Read a raw RGBA file (1024 bytes) or anything else as RGB.
fn load_raster(path: &Path) -> CliResult<Raster> {
    let data = fs::read(path)
        .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
    let raster = if data.len() == RGBA_LEN {
        Raster::from_rgba(RASTER_WIDTH, RASTER_HEIGHT, &data)
    } else {
        Raster::from_rgb(RASTER_WIDTH, RASTER_HEIGHT, &data)
    };
    raster.map_err(|err| protocol_error(&path.display().to_string(), err))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::exit::DATA_INVALID;

    fn raw_file(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file should be creatable");
        file.write_all(bytes).expect("temp file should be writable");
        file
    }

    #[test]
    fn loads_rgb_and_rgba() {
        let rgb = raw_file(&[0x10; 768]);
        let raster = load_raster(rgb.path()).expect("rgb should load");
        assert_eq!(raster.pixel(0, 0).map(|c| c.to_bytes()), Some([0x10; 3]));

        let mut rgba = Vec::with_capacity(1024);
        for _ in 0..256 {
            rgba.extend_from_slice(&[0xFF, 0x00, 0x00, 0x80]);
        }
        let rgba = raw_file(&rgba);
        let raster = load_raster(rgba.path()).expect("rgba should load");
        assert_eq!(raster.pixel(15, 15).map(|c| c.to_bytes()), Some([0xFF, 0, 0]));
    }

    #[test]
    fn wrong_size_is_data_invalid() {
        let file = raw_file(&[0; 100]);
        assert_eq!(load_raster(file.path()).unwrap_err().code, DATA_INVALID);
    }

    #[test]
    fn single_duration_applies_to_all_frames() {
        assert_eq!(expand_durations(&[250], 3), vec![250, 250, 250]);
        assert_eq!(expand_durations(&[10, 20], 3), vec![10, 20]);
    }
}
