//! Frame validation utilities for test pattern verification.
//!
//! Validators operate on converted RGBA output, so the same checks run
//! against the mock backend in unit tests and against vivid virtual cameras
//! in integration tests.

use thiserror::Error;

use crate::convert::Rgba;
use crate::traits::FrameMetadata;

/// A frame failed pattern validation.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ValidationError(String);

/// Result type for validators.
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Expected RGBA values for the eight vertical color bars, as produced by
/// running studio-range bar YUV through the integer converter.
///
/// Colors in order: white, yellow, cyan, green, magenta, red, blue, black.
const COLOR_BARS_RGB: [(u8, u8, u8); 8] = [
    (255, 255, 255),
    (255, 255, 0),
    (0, 255, 255),
    (0, 255, 1),
    (255, 0, 254),
    (255, 0, 0),
    (0, 0, 255),
    (0, 0, 0),
];

/// Tolerance for color matching (absorbs chroma subsampling and rounding).
const COLOR_TOLERANCE: u32 = 15;

/// Validates that a converted frame contains the vertical color bar pattern.
///
/// Samples the center of each of the eight bars on the middle row and
/// compares against [`COLOR_BARS_RGB`] within [`COLOR_TOLERANCE`]. Also
/// checks that every sampled pixel is fully opaque.
pub fn validate_color_bars(pixels: &[Rgba], width: u32, height: u32) -> Result<()> {
    let bar_width = width / 8;
    let center_y = height / 2;

    for (bar, expected) in COLOR_BARS_RGB.iter().enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        let sample_x = (bar as u32 * bar_width) + (bar_width / 2);
        let actual = pixel_at(pixels, sample_x, center_y, width)?;

        if actual.a != 255 {
            return Err(ValidationError(format!(
                "pixel at ({sample_x}, {center_y}) is not opaque: alpha {}",
                actual.a
            )));
        }
        if !colors_match(actual, *expected, COLOR_TOLERANCE) {
            return Err(ValidationError(format!(
                "color bar {bar} mismatch at ({sample_x}, {center_y}): \
                 expected RGB{expected:?}, got RGB({}, {}, {})",
                actual.r, actual.g, actual.b
            )));
        }
    }

    Ok(())
}

/// Validates that a converted frame contains a horizontal luma gradient.
///
/// Samples the middle row every 10 pixels and verifies that luminance rises
/// monotonically (within rounding) and changes significantly across the
/// frame.
pub fn validate_gradient(pixels: &[Rgba], width: u32, height: u32) -> Result<()> {
    let center_y = height / 2;
    let sample_step = 10usize;

    let mut first: Option<f32> = None;
    let mut prev: Option<f32> = None;
    let mut last: Option<f32> = None;

    for x in (0..width).step_by(sample_step) {
        let pixel = pixel_at(pixels, x, center_y, width)?;
        let luminance = 0.114f32.mul_add(
            f32::from(pixel.b),
            0.587f32.mul_add(f32::from(pixel.g), 0.299 * f32::from(pixel.r)),
        );

        if first.is_none() {
            first = Some(luminance);
        }
        if let Some(prev) = prev {
            // Allow small decreases due to rounding
            if luminance < prev - 1.0 {
                return Err(ValidationError(format!(
                    "gradient not monotonically increasing at x={x}: \
                     luminance {luminance} < previous {prev}"
                )));
            }
        }
        prev = Some(luminance);
        last = Some(luminance);
    }

    if let (Some(first), Some(last)) = (first, last) {
        let change = last - first;
        if change < 50.0 {
            return Err(ValidationError(format!(
                "insufficient luminance change for gradient: {change} \
                 (expected at least 50.0)"
            )));
        }
    }

    Ok(())
}

/// Validates that acquired frames carry incrementing sequence numbers with no
/// gaps.
pub fn validate_frame_sequence(frames: &[FrameMetadata]) -> Result<()> {
    let Some(head) = frames.first() else {
        return Err(ValidationError(
            "cannot validate empty frame sequence".to_owned(),
        ));
    };

    let mut expected = head.sequence;
    for (i, frame) in frames.iter().enumerate() {
        if frame.sequence != expected {
            return Err(ValidationError(format!(
                "frame sequence gap at index {i}: expected {expected}, got {}",
                frame.sequence
            )));
        }
        expected += 1;
    }

    Ok(())
}

fn pixel_at(pixels: &[Rgba], x: u32, y: u32, width: u32) -> Result<Rgba> {
    pixels
        .get((y * width + x) as usize)
        .copied()
        .ok_or_else(|| ValidationError(format!("no pixel at ({x}, {y})")))
}

fn colors_match(actual: Rgba, expected: (u8, u8, u8), tolerance: u32) -> bool {
    let (er, eg, eb) = expected;
    u32::from(actual.r).abs_diff(u32::from(er)) <= tolerance
        && u32::from(actual.g).abs_diff(u32::from(eg)) <= tolerance
        && u32::from(actual.b).abs_diff(u32::from(eb)) <= tolerance
}
