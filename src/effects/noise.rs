use crate::foundation::math::XorShift32;
use crate::pixels::buffer::PixelBuffer;

const GRAIN_SCALE: f32 = 128.0;

/// Additive luminance noise, one random value per `block_size` square.
///
/// Noise is scaled by pixel coverage so transparent areas stay transparent.
pub fn grain(src: &PixelBuffer, seed: u64, strength: f64, block_size: u32) -> PixelBuffer {
    let (w, h) = (src.width(), src.height());
    let block = block_size.max(1);
    let cols = w.div_ceil(block);
    let rows = h.div_ceil(block);
    let amp = strength.clamp(0.0, 1.0) as f32 * GRAIN_SCALE;

    let mut rng = XorShift32::new(seed);
    let values: Vec<f32> = (0..cols * rows).map(|_| rng.next_signed() * amp).collect();

    let mut out = src.clone();
    for y in 0..h {
        for x in 0..w {
            let mut px = out.sample(x as i32, y as i32);
            if px[3] == 0 {
                continue;
            }
            let n = values[((y / block) * cols + x / block) as usize];
            let a = f32::from(px[3]);
            let delta = n * a / 255.0;
            for c in px.iter_mut().take(3) {
                *c = (f32::from(*c) + delta).round().clamp(0.0, a) as u8;
            }
            out.set_pixel(x, y, px);
        }
    }
    out
}

/// Hand-drawn wobble: anti-aliased edge pixels (0 < alpha < 255) are replaced by a randomly
/// displaced sample; fully transparent and fully opaque pixels are left alone.
pub fn doodle(src: &PixelBuffer, seed: u64, amount: f64) -> PixelBuffer {
    let (w, h) = (src.width(), src.height());
    let max = amount.max(0.0) as f32;
    let mut rng = XorShift32::new(seed);
    let mut out = src.clone();

    for y in 0..h {
        for x in 0..w {
            let a = src.alpha_at(x, y);
            if a == 0 || a == 255 {
                continue;
            }
            let dx = rng.next_offset(max);
            let dy = rng.next_offset(max);
            out.set_pixel(x, y, src.sample(x as i32 + dx, y as i32 + dy));
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/effects/noise.rs"]
mod tests;
