use crate::effects::blur::gaussian_blur;
use crate::effects::composite::{atop_buffers, over_buffers};
use crate::effects::config::ShadowParams;
use crate::foundation::core::Rgba8Premul;
use crate::foundation::error::FxResult;
use crate::foundation::math::mul_div255_u8;
use crate::pixels::buffer::PixelBuffer;

/// Drop shadow: tinted, offset and blurred silhouette composited behind `src`.
pub fn drop_shadow(src: &PixelBuffer, params: &ShadowParams) -> FxResult<PixelBuffer> {
    let tint = params.color.premul_with_opacity(params.opacity);
    let (dx, dy) = offset_px(params);
    let (w, h) = (src.width(), src.height());

    let mut silhouette = src.blank_like();
    for y in 0..h {
        for x in 0..w {
            let a = src.sample(x as i32 - dx, y as i32 - dy)[3];
            if a != 0 {
                silhouette.set_pixel(x, y, tinted(tint, a));
            }
        }
    }
    let shadow = gaussian_blur(&silhouette, params.blur)?;
    over_buffers(&shadow, src)
}

/// Inner shadow: the inverted silhouette, offset and blurred, clipped to `src` coverage.
///
/// Everything outside the buffer counts as "outside the shape", so edges facing away from the
/// offset darken the way a cut-out would.
pub fn inner_shadow(src: &PixelBuffer, params: &ShadowParams) -> FxResult<PixelBuffer> {
    let tint = params.color.premul_with_opacity(params.opacity);
    let (dx, dy) = offset_px(params);
    let (w, h) = (src.width(), src.height());

    // Pad so the blur sees solid "outside" beyond the buffer edge instead of transparency.
    let pad = params.blur.max(0.0).ceil() as u32 + 1;
    let mut inverted = PixelBuffer::new(w + 2 * pad, h + 2 * pad)?;
    for y in 0..inverted.height() {
        for x in 0..inverted.width() {
            let sx = x as i32 - pad as i32 - dx;
            let sy = y as i32 - pad as i32 - dy;
            let inside = if sx < 0 || sy < 0 || sx >= w as i32 || sy >= h as i32 {
                0
            } else {
                src.sample(sx, sy)[3]
            };
            let a = 255 - inside;
            if a != 0 {
                inverted.set_pixel(x, y, tinted(tint, a));
            }
        }
    }
    let blurred = gaussian_blur(&inverted, params.blur)?;

    let mut shadow = src.blank_like();
    for y in 0..h {
        for x in 0..w {
            shadow.set_pixel(x, y, blurred.sample((x + pad) as i32, (y + pad) as i32));
        }
    }
    atop_buffers(src, &shadow)
}

fn offset_px(params: &ShadowParams) -> (i32, i32) {
    (
        params.offset_x.round() as i32,
        params.offset_y.round() as i32,
    )
}

fn tinted(tint: Rgba8Premul, alpha: u8) -> [u8; 4] {
    let a = u16::from(alpha);
    [
        mul_div255_u8(u16::from(tint.r), a),
        mul_div255_u8(u16::from(tint.g), a),
        mul_div255_u8(u16::from(tint.b), a),
        mul_div255_u8(u16::from(tint.a), a),
    ]
}

#[cfg(test)]
#[path = "../../tests/unit/effects/shadow.rs"]
mod tests;
