//! Packed YUYV to RGBA pixel conversion.
//!
//! Pure and allocation-free: the session calls [`yuyv_to_rgba`] once per
//! acquired frame, writing into a caller-owned pixel slice. Four input bytes
//! produce two horizontally adjacent output pixels that share one chroma pair.

use crate::error::ConvertError;

/// A 32-bit RGBA pixel. Alpha is always 255 for YUYV sources, which carry no
/// transparency.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba {
    /// Construct an opaque pixel.
    #[must_use]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// Convert packed YUYV bytes into RGBA pixels.
///
/// Processes `width`/2 chroma-sharing pixel pairs per row using the integer
/// studio-range BT.601 transform. Writes exactly `width * height` pixels into
/// the front of `out` on success; `out` may be larger.
///
/// # Errors
///
/// * [`ConvertError::OddWidth`] - pairs cannot straddle rows, so `width` must
///   be even.
/// * [`ConvertError::InputTooShort`] - `raw` holds fewer than
///   `width * height * 2` bytes.
/// * [`ConvertError::OutputTooSmall`] - `out` holds fewer than
///   `width * height` pixels.
pub fn yuyv_to_rgba(
    raw: &[u8],
    out: &mut [Rgba],
    width: u32,
    height: u32,
) -> std::result::Result<(), ConvertError> {
    if width % 2 != 0 {
        return Err(ConvertError::OddWidth(width));
    }

    let pixels = width as usize * height as usize;
    let required = pixels * 2;
    let raw = raw.get(..required).ok_or(ConvertError::InputTooShort {
        required,
        actual: raw.len(),
    })?;
    let out_len = out.len();
    let out = out.get_mut(..pixels).ok_or(ConvertError::OutputTooSmall {
        required: pixels,
        actual: out_len,
    })?;

    for (group, pair) in raw.chunks_exact(4).zip(out.chunks_exact_mut(2)) {
        if let (&[y0, u, y1, v], [p0, p1]) = (group, pair) {
            *p0 = yuv_pixel(y0, u, v);
            *p1 = yuv_pixel(y1, u, v);
        }
    }

    Ok(())
}

/// Integer studio-range BT.601 conversion of one luma sample plus shared
/// chroma.
fn yuv_pixel(y: u8, u: u8, v: u8) -> Rgba {
    let c = i32::from(y) - 16;
    let d = i32::from(u) - 128;
    let e = i32::from(v) - 128;

    let r = (298 * c + 409 * e + 128) >> 8;
    let g = (298 * c - 100 * d - 208 * e + 128) >> 8;
    let b = (298 * c + 516 * d + 128) >> 8;

    Rgba::opaque(clamp_channel(r), clamp_channel(g), clamp_channel(b))
}

/// Saturate a channel value into [0, 255].
fn clamp_channel(value: i32) -> u8 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        value.clamp(0, 255) as u8
    }
}
