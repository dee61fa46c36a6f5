//! Palette image encoding and animation streaming.
//!
//! A frame is sent as an indexed palette plus a bit-packed index stream.
//! Indices are `ceil(log2(colors))` bits wide and packed LSB-first: the top
//! left pixel occupies the lowest bits of the first byte.

use pixelbox_frame::wrap;
use tracing::debug;

use crate::constants::{
    ANIMATION_PACKET_STRIDE, ANIMATION_PACKET_WINDOW, IMAGE_PREAMBLE, RESET_PALETTE,
    SET_ANIMATION, SET_IMAGE, START_OF_FRAME,
};
use crate::error::{ProtocolError, Result};
use crate::types::Color;

/// Width of the device display.
pub const RASTER_WIDTH: usize = 16;

/// Height of the device display.
pub const RASTER_HEIGHT: usize = 16;

/// Bytes in a frame block before the palette:
/// start marker (1) + frame size (2) + duration (2) + palette reset (1) + color count (1).
const FRAME_HEADER_SIZE: usize = 7;

/// A row-major grid of colors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: usize,
    height: usize,
    pixels: Vec<Color>,
}

impl Raster {
    /// Create a raster from row-major pixels.
    pub fn new(width: usize, height: usize, pixels: Vec<Color>) -> Result<Self> {
        let expected = width * height;
        if pixels.len() != expected {
            return Err(ProtocolError::RasterSize {
                len: pixels.len(),
                expected,
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A raster of one color.
    pub fn filled(width: usize, height: usize, color: Color) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width * height],
        }
    }

    /// Build from packed `RGB` bytes.
    pub fn from_rgb(width: usize, height: usize, data: &[u8]) -> Result<Self> {
        Self::from_packed(width, height, data, 3)
    }

    /// Build from packed `RGBA` bytes. Alpha is dropped.
    pub fn from_rgba(width: usize, height: usize, data: &[u8]) -> Result<Self> {
        Self::from_packed(width, height, data, 4)
    }

    fn from_packed(width: usize, height: usize, data: &[u8], stride: usize) -> Result<Self> {
        let expected = width * height * stride;
        if data.len() != expected {
            return Err(ProtocolError::RasterSize {
                len: data.len(),
                expected,
            });
        }
        let pixels = data
            .chunks_exact(stride)
            .map(|px| Color::new(px[0], px[1], px[2]))
            .collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Pixels in row-major order.
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }

    /// Set one pixel; coordinates outside the raster are ignored.
    pub fn set_pixel(&mut self, x: usize, y: usize, color: Color) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = color;
        }
    }
}

/// Palette and packed indices for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// `[r, g, b]` per color, in first-occurrence order.
    pub palette: Vec<u8>,
    /// Bit-packed palette indices, one per pixel.
    pub indices: Vec<u8>,
}

impl EncodedImage {
    /// Number of palette entries.
    pub fn color_count(&self) -> usize {
        self.palette.len() / 3
    }

    /// Width of each packed index.
    pub fn bits_per_pixel(&self) -> u32 {
        bits_per_pixel(self.color_count())
    }

    /// Frame block: start marker, size, duration, palette reset, color
    /// count, palette, indices. The size covers the whole block.
    fn frame_block(&self, duration_ms: u16) -> Vec<u8> {
        let size = FRAME_HEADER_SIZE + self.palette.len() + self.indices.len();
        let mut block = Vec::with_capacity(size);
        block.push(START_OF_FRAME);
        block.extend_from_slice(&(size as u16).to_le_bytes());
        block.extend_from_slice(&duration_ms.to_le_bytes());
        block.push(RESET_PALETTE);
        // 256 colors wraps to 0, as the device firmware expects
        block.push(self.color_count() as u8);
        block.extend_from_slice(&self.palette);
        block.extend_from_slice(&self.indices);
        block
    }
}

/// `ceil(log2(colors))`. A single color needs zero bits.
pub fn bits_per_pixel(colors: usize) -> u32 {
    if colors <= 1 {
        0
    } else {
        usize::BITS - (colors - 1).leading_zeros()
    }
}

/// Convert a 16×16 raster into a palette and a packed index stream.
pub fn convert_image(raster: &Raster) -> Result<EncodedImage> {
    if raster.width() != RASTER_WIDTH || raster.height() != RASTER_HEIGHT {
        return Err(ProtocolError::Dimension {
            width: raster.width(),
            height: raster.height(),
        });
    }

    // At most 256 pixels, so a linear scan per pixel stays cheap.
    let mut palette: Vec<Color> = Vec::new();
    let mut indices: Vec<u8> = Vec::with_capacity(raster.pixels().len());
    for color in raster.pixels() {
        let index = match palette.iter().position(|c| c == color) {
            Some(index) => index,
            None => {
                palette.push(*color);
                palette.len() - 1
            }
        };
        indices.push(index as u8);
    }

    let bpp = bits_per_pixel(palette.len());
    Ok(EncodedImage {
        palette: palette.iter().flat_map(|c| c.to_bytes()).collect(),
        indices: pack_indices(&indices, bpp),
    })
}

fn pack_indices(indices: &[u8], bpp: u32) -> Vec<u8> {
    let total = (indices.len() * bpp as usize).div_ceil(8);
    let mut out = vec![0u8; total];
    if bpp == 0 {
        return out;
    }

    let mut cursor = 0usize;
    let mut offset = 0u32;
    for &index in indices {
        let bits = u16::from(index) << offset;
        out[cursor] |= bits as u8;
        if let Some(next) = out.get_mut(cursor + 1) {
            *next |= (bits >> 8) as u8;
        }
        offset += bpp;
        if offset >= 8 {
            offset -= 8;
            cursor += 1;
        }
    }
    out
}

/// Rebuild a 16×16 raster from a palette and packed indices.
pub fn decode_image(palette: &[u8], indices: &[u8]) -> Result<Raster> {
    let corrupt = |reason: String| ProtocolError::CorruptImage { reason };

    if palette.is_empty() || palette.len() % 3 != 0 {
        return Err(corrupt(format!("palette length {} is not a positive multiple of 3", palette.len())));
    }
    let colors: Vec<Color> = palette
        .chunks_exact(3)
        .map(|c| Color::new(c[0], c[1], c[2]))
        .collect();

    let pixel_count = RASTER_WIDTH * RASTER_HEIGHT;
    let bpp = bits_per_pixel(colors.len()) as usize;
    let needed = (pixel_count * bpp).div_ceil(8);
    if indices.len() < needed {
        return Err(corrupt(format!("index stream has {} bytes, need {needed}", indices.len())));
    }

    let mask = (1u16 << bpp) - 1;
    let mut pixels = Vec::with_capacity(pixel_count);
    for i in 0..pixel_count {
        let bit = i * bpp;
        let low = u16::from(indices.get(bit / 8).copied().unwrap_or(0));
        let high = u16::from(indices.get(bit / 8 + 1).copied().unwrap_or(0));
        let index = usize::from(((low | high << 8) >> (bit % 8)) & mask);
        let color = colors.get(index).copied().ok_or_else(|| {
            corrupt(format!("pixel {i} uses index {index} of {} colors", colors.len()))
        })?;
        pixels.push(color);
    }
    Raster::new(RASTER_WIDTH, RASTER_HEIGHT, pixels)
}

/// Build the wrapped command that shows a still image until replaced.
pub fn build_image_command(raster: &Raster) -> Result<Vec<u8>> {
    let encoded = convert_image(raster)?;

    let mut command = Vec::with_capacity(1 + IMAGE_PREAMBLE.len() + FRAME_HEADER_SIZE + 1024);
    command.push(SET_IMAGE);
    command.extend_from_slice(&IMAGE_PREAMBLE);
    // duration 0: hold the frame
    command.extend_from_slice(&encoded.frame_block(0));

    debug!(
        colors = encoded.color_count(),
        bpp = encoded.bits_per_pixel(),
        "built image command"
    );
    Ok(wrap(&command))
}

/// Build the wrapped packets that stream an animation.
///
/// Durations are in milliseconds and are truncated to 16 bits. The returned
/// packets must be written in order by one writer.
pub fn build_animation_command(frames: &[Raster], durations_ms: &[u32]) -> Result<Vec<Vec<u8>>> {
    if frames.len() != durations_ms.len() {
        return Err(ProtocolError::DurationMismatch {
            frames: frames.len(),
            durations: durations_ms.len(),
        });
    }

    let mut buffer = Vec::new();
    for (frame, duration) in frames.iter().zip(durations_ms) {
        let encoded = convert_image(frame)?;
        buffer.extend_from_slice(&encoded.frame_block(*duration as u16));
    }

    let packets = packetize_animation(&buffer);
    debug!(
        frames = frames.len(),
        bytes = buffer.len(),
        packets = packets.len(),
        "built animation command"
    );
    Ok(packets)
}

/// Split an animation frame buffer into wrapped transport packets.
///
/// Packet `k` carries `buffer[k*200 .. min(k*200 + 400, len)]`, so
/// neighbouring packets overlap by up to 200 bytes. Every packet is
/// prefixed with the opcode, the total buffer size and its sequence number.
///
/// The total is a 16-bit field and wraps for buffers over 65535 bytes.
pub fn packetize_animation(buffer: &[u8]) -> Vec<Vec<u8>> {
    let total = (buffer.len() as u16).to_le_bytes();

    (0..buffer.len())
        .step_by(ANIMATION_PACKET_STRIDE)
        .enumerate()
        .map(|(sequence, start)| {
            let end = (start + ANIMATION_PACKET_WINDOW).min(buffer.len());
            let mut command = Vec::with_capacity(4 + end - start);
            command.push(SET_ANIMATION);
            command.extend_from_slice(&total);
            command.push(sequence as u8);
            command.extend_from_slice(&buffer[start..end]);
            wrap(&command)
        })
        .collect()
}
