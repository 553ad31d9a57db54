//! Image decoders for TIFF and PNG
//!
//! Decoders hand back the samples exactly as stored; converting them into a
//! 16-bit field (and rejecting anything else) is left to the core.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use radiant_core::{DecodedImage, Field16, Samples};

/// Decode an image file by extension.
pub fn decode_image<P: AsRef<Path>>(path: P) -> Result<DecodedImage> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .ok_or_else(|| anyhow!("no file extension found: {}", path.display()))?;

    match extension.as_str() {
        "tif" | "tiff" => decode_tiff(path),
        "png" => decode_png(path),
        _ => bail!("unsupported file format: {}", extension),
    }
}

/// Decode a file straight into a 16-bit grayscale field.
pub fn decode_field<P: AsRef<Path>>(path: P) -> Result<Field16> {
    let path = path.as_ref();
    let image = decode_image(path)?;
    Field16::try_from(image).with_context(|| format!("cannot process {}", path.display()))
}

/// Decode a TIFF file
fn decode_tiff(path: &Path) -> Result<DecodedImage> {
    use tiff::decoder::{Decoder, DecodingResult, Limits};

    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;

    // Large detector panels exceed the default limits
    let mut limits = Limits::default();
    limits.decoding_buffer_size = 1024 * 1024 * 1024;
    limits.ifd_value_size = 1024 * 1024 * 1024;
    limits.intermediate_buffer_size = 1024 * 1024 * 1024;

    let mut decoder = Decoder::new(BufReader::new(file))
        .context("failed to create TIFF decoder")?
        .with_limits(limits);

    let (width, height) = decoder.dimensions().context("failed to get TIFF dimensions")?;
    let color_type = decoder.colortype().context("failed to get TIFF color type")?;

    let channels = match color_type {
        tiff::ColorType::Gray(_) => 1,
        tiff::ColorType::GrayA(_) => 2,
        tiff::ColorType::RGB(_) => 3,
        tiff::ColorType::RGBA(_) => 4,
        other => bail!("unsupported TIFF color type: {:?}", other),
    };

    let samples = match decoder.read_image().context("failed to read TIFF image data")? {
        DecodingResult::U8(buf) => Samples::U8(buf),
        DecodingResult::U16(buf) => Samples::U16(buf),
        DecodingResult::F32(buf) => Samples::F32(buf),
        _ => bail!("unsupported TIFF sample format ({:?})", color_type),
    };

    Ok(DecodedImage {
        width,
        height,
        channels,
        samples,
    })
}

/// Decode a PNG file
fn decode_png(path: &Path) -> Result<DecodedImage> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let decoder = png::Decoder::new(BufReader::new(file));
    let mut reader = decoder.read_info().context("failed to read PNG info")?;

    let info = reader.info();
    let width = info.width;
    let height = info.height;
    let color_type = info.color_type;
    let bit_depth = info.bit_depth;

    let channels = match color_type {
        png::ColorType::Grayscale => 1,
        png::ColorType::GrayscaleAlpha => 2,
        png::ColorType::Rgb => 3,
        png::ColorType::Rgba => 4,
        png::ColorType::Indexed => bail!("indexed PNG not supported"),
    };

    let buffer_size = reader
        .output_buffer_size()
        .ok_or_else(|| anyhow!("failed to determine PNG buffer size"))?;
    let mut buf = vec![0u8; buffer_size];
    let frame_info = reader
        .next_frame(&mut buf)
        .context("failed to read PNG frame")?;
    let bytes = &buf[..frame_info.buffer_size()];

    let samples = match bit_depth {
        png::BitDepth::Eight => Samples::U8(bytes.to_vec()),
        // PNG 16-bit is big-endian
        png::BitDepth::Sixteen => Samples::U16(
            bytes
                .chunks_exact(2)
                .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
                .collect(),
        ),
        other => bail!("unsupported PNG bit depth: {:?}", other),
    };

    Ok(DecodedImage {
        width,
        height,
        channels,
        samples,
    })
}
