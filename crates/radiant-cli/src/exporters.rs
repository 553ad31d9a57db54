//! Image exporters
//!
//! Enhanced fields are written as 16-bit grayscale TIFF, display images as
//! 8-bit grayscale PNG.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use radiant_core::{Field16, Field8};

/// Write a 16-bit field as a single-channel TIFF.
pub fn export_tiff16<P: AsRef<Path>>(field: &Field16, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("failed to create TIFF file {}", path.display()))?;

    let mut encoder = tiff::encoder::TiffEncoder::new(BufWriter::new(file))
        .context("failed to create TIFF encoder")?;
    encoder
        .write_image::<tiff::encoder::colortype::Gray16>(field.width(), field.height(), field.data())
        .context("failed to write grayscale TIFF image")?;
    Ok(())
}

/// Write an 8-bit display image as a grayscale PNG.
pub fn export_png8<P: AsRef<Path>>(field: &Field8, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("failed to create PNG file {}", path.display()))?;

    let mut encoder = png::Encoder::new(BufWriter::new(file), field.width(), field.height());
    encoder.set_color(png::ColorType::Grayscale);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder.write_header().context("failed to write PNG header")?;
    writer
        .write_image_data(field.data())
        .context("failed to write PNG image data")?;
    writer.finish().context("failed to finish PNG file")?;
    Ok(())
}
