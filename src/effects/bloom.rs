use crate::effects::blur::gaussian_blur;
use crate::effects::composite::add;
use crate::foundation::error::FxResult;
use crate::pixels::buffer::PixelBuffer;

/// Bright-pass, blur, add back.
///
/// Luminance is measured on the straight (unpremultiplied) color so faint but bright pixels still
/// qualify; the mask keeps the premultiplied pixel, weighted by its coverage.
pub fn bloom(src: &PixelBuffer, threshold: f64, radius: f64, intensity: f64) -> FxResult<PixelBuffer> {
    let threshold = threshold.clamp(0.0, 1.0) as f32;
    let mut mask = src.blank_like();
    let mut any = false;
    for (m, s) in mask
        .data_mut()
        .chunks_exact_mut(4)
        .zip(src.data().chunks_exact(4))
    {
        if s[3] == 0 {
            continue;
        }
        if luminance([s[0], s[1], s[2], s[3]]) >= threshold {
            m.copy_from_slice(s);
            any = true;
        }
    }
    if !any {
        return Ok(src.clone());
    }

    let glow = gaussian_blur(&mask, radius)?;
    let mut out = src.clone();
    let k = intensity.max(0.0) as f32;
    for (d, g) in out.data_mut().chunks_exact_mut(4).zip(glow.data().chunks_exact(4)) {
        if g[3] == 0 {
            continue;
        }
        let px = add([d[0], d[1], d[2], d[3]], [g[0], g[1], g[2], g[3]], k);
        d.copy_from_slice(&px);
    }
    Ok(out)
}

/// Rec. 709 luma of a premultiplied pixel, in `[0, 1]`.
pub(crate) fn luminance(px: [u8; 4]) -> f32 {
    if px[3] == 0 {
        return 0.0;
    }
    let a = f32::from(px[3]);
    let r = f32::from(px[0]) / a;
    let g = f32::from(px[1]) / a;
    let b = f32::from(px[2]) / a;
    (0.2126 * r + 0.7152 * g + 0.0722 * b).clamp(0.0, 1.0)
}

#[cfg(test)]
#[path = "../../tests/unit/effects/bloom.rs"]
mod tests;
