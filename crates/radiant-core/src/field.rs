//! Dense row-major sample fields
//!
//! `PixelField<T>` is the buffer every stage consumes and produces. The
//! buffer length always equals `width * height` and both dimensions are
//! non-zero; the constructor is the only way in.
//!
//! `DecodedImage` is what an external loader hands over before the element
//! kind and channel count have been checked.

use crate::error::{Error, Result};
use crate::parallel::for_each_row_mut;

/// Largest 16-bit sample value, as the normalization divisor.
pub const MAX_SAMPLE: f32 = 65535.0;

/// A single-channel image buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelField<T> {
    width: u32,
    height: u32,
    data: Vec<T>,
}

/// 16-bit radiograph samples.
pub type Field16 = PixelField<u16>;
/// Normalized floating-point samples (nominally 0.0-1.0).
pub type FieldF32 = PixelField<f32>;
/// 8-bit display samples.
pub type Field8 = PixelField<u8>;

impl<T> PixelField<T> {
    /// Wrap a row-major buffer, validating its shape.
    pub fn new(width: u32, height: u32, data: Vec<T>) -> Result<Self> {
        validate_dimensions(width, height)?;
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(Error::invalid(format!(
                "buffer holds {} samples, {}x{} needs {}",
                data.len(),
                width,
                height,
                expected
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build a field by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> T) -> Result<Self> {
        validate_dimensions(width, height)?;
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false for a constructed field; kept for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    /// Borrow row `y`.
    ///
    /// # Panics
    /// Panics if `y >= height`.
    pub fn row(&self, y: u32) -> &[T] {
        let w = self.width as usize;
        let start = y as usize * w;
        &self.data[start..start + w]
    }

    pub fn get(&self, x: u32, y: u32) -> Option<&T> {
        if x < self.width && y < self.height {
            self.data
                .get(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Fails with `ShapeMismatch` unless `other` has the same dimensions.
    pub fn ensure_same_shape<U>(&self, other: &PixelField<U>) -> Result<()> {
        if self.dimensions() != other.dimensions() {
            return Err(Error::ShapeMismatch {
                expected: self.dimensions(),
                actual: other.dimensions(),
            });
        }
        Ok(())
    }

    /// Replace the buffer with a same-shape one produced by a stage.
    pub(crate) fn with_data<U>(&self, data: Vec<U>) -> PixelField<U> {
        debug_assert_eq!(data.len(), self.data.len());
        PixelField {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

impl<T: Copy + Default> PixelField<T> {
    /// A field filled with the element type's default (zero).
    pub fn zeros(width: u32, height: u32) -> Result<Self> {
        Self::filled(width, height, T::default())
    }

    pub fn filled(width: u32, height: u32, value: T) -> Result<Self> {
        validate_dimensions(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![value; width as usize * height as usize],
        })
    }
}

impl Field16 {
    /// Minimum and maximum sample.
    pub fn min_max(&self) -> (u16, u16) {
        self.data
            .iter()
            .fold((u16::MAX, u16::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }
}

fn validate_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::invalid(format!(
            "field dimensions must be positive, got {}x{}",
            width, height
        )));
    }
    Ok(())
}

/// Raw samples as produced by a decoder.
#[derive(Debug, Clone)]
pub enum Samples {
    U8(Vec<u8>),
    U16(Vec<u16>),
    F32(Vec<f32>),
}

impl Samples {
    pub fn bit_depth(&self) -> u8 {
        match self {
            Samples::U8(_) => 8,
            Samples::U16(_) => 16,
            Samples::F32(_) => 32,
        }
    }
}

/// Decoded image data handed over by a loader.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Image width in pixels
    pub width: u32,

    /// Image height in pixels
    pub height: u32,

    /// Interleaved channel count (1 for grayscale)
    pub channels: u8,

    /// Row-major interleaved samples
    pub samples: Samples,
}

impl TryFrom<DecodedImage> for Field16 {
    type Error = Error;

    /// Accepts only single-channel 16-bit data.
    fn try_from(image: DecodedImage) -> Result<Self> {
        validate_dimensions(image.width, image.height)?;
        match image.samples {
            Samples::U16(data) if image.channels == 1 => {
                Field16::new(image.width, image.height, data)
            }
            other => Err(Error::FormatError {
                channels: image.channels,
                bit_depth: other.bit_depth(),
            }),
        }
    }
}

/// Convert 16-bit samples to a float field, dividing each by 65535.
pub fn normalize(field: &Field16) -> Result<FieldF32> {
    let width = field.width() as usize;
    let src = field.data();
    let mut out = vec![0.0f32; src.len()];

    for_each_row_mut(&mut out, width, |y, row| {
        let src_row = &src[y * width..(y + 1) * width];
        for (dst, &s) in row.iter_mut().zip(src_row) {
            *dst = s as f32 / MAX_SAMPLE;
        }
    });

    Ok(field.with_data(out))
}

/// Scale a normalized field back to 16 bits, rounding and clamping.
pub fn denormalize(field: &FieldF32) -> Field16 {
    let width = field.width() as usize;
    let src = field.data();
    let mut out = vec![0u16; src.len()];

    for_each_row_mut(&mut out, width, |y, row| {
        let src_row = &src[y * width..(y + 1) * width];
        for (dst, &s) in row.iter_mut().zip(src_row) {
            *dst = to_sample(s * MAX_SAMPLE);
        }
    });

    field.with_data(out)
}

/// Round and saturate a 16-bit-scaled value.
#[inline]
pub(crate) fn to_sample(value: f32) -> u16 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, MAX_SAMPLE) as u16
}

/// Flip polarity: `65535 - v` for every sample.
///
/// Raw modality data is acquired with inverted polarity; applying this
/// twice returns the original field.
pub fn invert_polarity(field: &Field16) -> Field16 {
    let width = field.width() as usize;
    let src = field.data();
    let mut out = vec![0u16; src.len()];

    for_each_row_mut(&mut out, width, |y, row| {
        let src_row = &src[y * width..(y + 1) * width];
        for (dst, &s) in row.iter_mut().zip(src_row) {
            *dst = u16::MAX - s;
        }
    });

    field.with_data(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_zero_dimensions() {
        let result = Field16::new(0, 4, vec![]);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_new_rejects_wrong_length() {
        let result = Field16::new(3, 3, vec![0; 8]);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_row_and_get() {
        let field = Field16::from_fn(3, 2, |x, y| (y * 10 + x) as u16).unwrap();
        assert_eq!(field.row(1), &[10, 11, 12]);
        assert_eq!(field.get(2, 0), Some(&2));
        assert_eq!(field.get(3, 0), None);
    }

    #[test]
    fn test_decoded_image_conversion() {
        let gray16 = DecodedImage {
            width: 2,
            height: 2,
            channels: 1,
            samples: Samples::U16(vec![1, 2, 3, 4]),
        };
        let field = Field16::try_from(gray16).unwrap();
        assert_eq!(field.data(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_decoded_image_rejects_rgb() {
        let rgb16 = DecodedImage {
            width: 1,
            height: 1,
            channels: 3,
            samples: Samples::U16(vec![1, 2, 3]),
        };
        match Field16::try_from(rgb16) {
            Err(Error::FormatError {
                channels,
                bit_depth,
            }) => {
                assert_eq!(channels, 3);
                assert_eq!(bit_depth, 16);
            }
            other => panic!("expected FormatError, got {:?}", other),
        }
    }

    #[test]
    fn test_decoded_image_rejects_8bit() {
        let gray8 = DecodedImage {
            width: 2,
            height: 1,
            channels: 1,
            samples: Samples::U8(vec![0, 255]),
        };
        assert!(matches!(
            Field16::try_from(gray8),
            Err(Error::FormatError { bit_depth: 8, .. })
        ));
    }

    #[test]
    fn test_normalize_round_trip_within_one() {
        // Every representable sample, laid out as a 256x256 field
        let field = Field16::from_fn(256, 256, |x, y| (y * 256 + x) as u16).unwrap();

        let normalized = normalize(&field).unwrap();
        let restored = denormalize(&normalized);

        for (&original, &back) in field.data().iter().zip(restored.data()) {
            let diff = (original as i32 - back as i32).abs();
            assert!(diff <= 1, "sample {} came back as {}", original, back);
        }
        assert!(normalized.data().iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_invert_polarity_is_involution() {
        let field = Field16::from_fn(5, 3, |x, y| (x * 9000 + y * 1000) as u16).unwrap();
        let inverted = invert_polarity(&field);

        assert_eq!(inverted.data()[0], 65535);
        assert_eq!(invert_polarity(&inverted), field);
    }

    #[test]
    fn test_min_max() {
        let field = Field16::new(2, 2, vec![300, 7, 65000, 12]).unwrap();
        assert_eq!(field.min_max(), (7, 65000));
    }
}
