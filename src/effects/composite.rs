use crate::foundation::error::{FxError, FxResult};
use crate::foundation::math::{lerp_u8, mul_div255_u8};
use crate::pixels::buffer::{PixelBuffer, premul_over_px};

pub type PremulRgba8 = [u8; 4];

/// `src` over `dst`, with an extra opacity multiplier on `src`.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }
    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let scaled = [
        mul_div255_u8(u16::from(src[0]), op),
        mul_div255_u8(u16::from(src[1]), op),
        mul_div255_u8(u16::from(src[2]), op),
        mul_div255_u8(u16::from(src[3]), op),
    ];
    premul_over_px(dst, scaled)
}

/// `src` atop `dst`: src is drawn only where dst has coverage, dst alpha is preserved.
pub fn atop(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    let da = u16::from(dst[3]);
    let inv_sa = 255u16 - u16::from(src[3]);
    let mut out = [0u8; 4];
    out[3] = dst[3];
    for c in 0..3 {
        let v = mul_div255_u8(u16::from(src[c]), da)
            .saturating_add(mul_div255_u8(u16::from(dst[c]), inv_sa));
        out[c] = v.min(dst[3]);
    }
    out
}

/// `dst + src * intensity`, channel-wise saturating.
pub fn add(dst: PremulRgba8, src: PremulRgba8, intensity: f32) -> PremulRgba8 {
    let k = intensity.max(0.0);
    let mut out = [0u8; 4];
    for c in 0..4 {
        let v = f32::from(dst[c]) + f32::from(src[c]) * k;
        out[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    // Alpha saturates first; keep colors inside it.
    for c in 0..3 {
        out[c] = out[c].min(out[3]);
    }
    out
}

/// Linear interpolation between two premultiplied pixels.
pub fn mix(a: PremulRgba8, b: PremulRgba8, t: f32) -> PremulRgba8 {
    [
        lerp_u8(a[0], b[0], t),
        lerp_u8(a[1], b[1], t),
        lerp_u8(a[2], b[2], t),
        lerp_u8(a[3], b[3], t),
    ]
}

/// Composite `top` over `bottom` pixel-for-pixel into a new buffer.
pub fn over_buffers(bottom: &PixelBuffer, top: &PixelBuffer) -> FxResult<PixelBuffer> {
    ensure_same_size(bottom, top, "over_buffers")?;
    let mut out = bottom.clone();
    for (d, s) in out.data_mut().chunks_exact_mut(4).zip(top.data().chunks_exact(4)) {
        let px = premul_over_px([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&px);
    }
    Ok(out)
}

/// Composite `top` atop `base` into a new buffer.
pub fn atop_buffers(base: &PixelBuffer, top: &PixelBuffer) -> FxResult<PixelBuffer> {
    ensure_same_size(base, top, "atop_buffers")?;
    let mut out = base.clone();
    for (d, s) in out.data_mut().chunks_exact_mut(4).zip(top.data().chunks_exact(4)) {
        let px = atop([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&px);
    }
    Ok(out)
}

pub(crate) fn ensure_same_size(a: &PixelBuffer, b: &PixelBuffer, op: &str) -> FxResult<()> {
    if a.width() != b.width() || a.height() != b.height() {
        return Err(FxError::validation(format!(
            "{op} expects equal-size buffers, got {}x{} and {}x{}",
            a.width(),
            a.height(),
            b.width(),
            b.height()
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/effects/composite.rs"]
mod tests;
