use crate::effects::config::Ramp;
use crate::effects::ramp::field_for;
use crate::foundation::math::XorShift32;
use crate::pixels::buffer::PixelBuffer;

/// Knobs for [`glitch`], already scaled to device pixels.
#[derive(Clone, Copy, Debug)]
pub struct GlitchParams {
    pub seed: u64,
    pub shift: f64,
    pub rgb_split: f64,
    pub line_chance: f64,
    pub darken_chance: f64,
    pub darken_amount: f64,
}

/// Scanline glitch: per-row horizontal shift, red/blue channel split and random row darkening.
///
/// Every row draws the same three numbers from the generator regardless of which features are
/// active, so toggling one knob never reshuffles the others.
pub fn glitch(src: &PixelBuffer, p: &GlitchParams) -> PixelBuffer {
    let mut rng = XorShift32::new(p.seed);
    let split = p.rgb_split.max(0.0).round() as i32;
    let keep = (1.0 - p.darken_amount.clamp(0.0, 1.0)) as f32;
    let (w, h) = (src.width(), src.height());
    let mut out = src.blank_like();

    for y in 0..h {
        let line_roll = rng.next_f32();
        let offset = rng.next_offset(p.shift as f32);
        let darken_roll = rng.next_f32();

        let row_shift = if f64::from(line_roll) < p.line_chance {
            offset
        } else {
            0
        };
        let darken = f64::from(darken_roll) < p.darken_chance;

        for x in 0..w {
            let sx = x as i32 - row_shift;
            let r = src.sample(sx - split, y as i32);
            let g = src.sample(sx, y as i32);
            let b = src.sample(sx + split, y as i32);
            let a = r[3].max(g[3]).max(b[3]);
            if a == 0 {
                continue;
            }
            let mut px = [r[0], g[1], b[2], a];
            if darken {
                for c in px.iter_mut().take(3) {
                    *c = (f32::from(*c) * keep).round() as u8;
                }
            }
            out.set_pixel(x, y, px);
        }
    }
    out
}

/// Knobs for [`mosh`], already scaled to device pixels.
#[derive(Clone, Debug)]
pub struct MoshParams {
    pub seed: u64,
    pub block_size: u32,
    pub displacement: f64,
    pub ramp: Option<Ramp>,
    pub dither: f64,
}

const DITHER_SALT: u64 = 0x9E37_79B9_7F4A_7C15;
const DITHER_SCALE: f32 = 24.0;

/// Datamosh-style block displacement with light dither on covered pixels.
pub fn mosh(src: &PixelBuffer, p: &MoshParams) -> PixelBuffer {
    let (w, h) = (src.width(), src.height());
    let block = p.block_size.max(1);
    let field = field_for(p.ramp.as_ref(), w, h);
    let mut rng = XorShift32::new(p.seed);
    let mut out = src.blank_like();

    let mut by = 0;
    while by < h {
        let mut bx = 0;
        while bx < w {
            let dx = rng.next_offset(p.displacement as f32);
            let dy = rng.next_offset(p.displacement as f32);
            let weight = field.as_ref().map_or(1.0, |f| {
                f.weight_at((bx + block / 2).min(w - 1), (by + block / 2).min(h - 1))
            });
            let ox = (dx as f32 * weight).round() as i32;
            let oy = (dy as f32 * weight).round() as i32;

            for y in by..(by + block).min(h) {
                for x in bx..(bx + block).min(w) {
                    let px = src.sample(x as i32 + ox, y as i32 + oy);
                    if px[3] != 0 {
                        out.set_pixel(x, y, px);
                    }
                }
            }
            bx += block;
        }
        by += block;
    }

    if p.dither > 0.0 {
        let mut noise = XorShift32::new(p.seed ^ DITHER_SALT);
        let amp = p.dither.clamp(0.0, 1.0) as f32 * DITHER_SCALE;
        for px in out.data_mut().chunks_exact_mut(4) {
            if px[3] == 0 {
                continue;
            }
            let n = noise.next_signed() * amp;
            let a = f32::from(px[3]);
            for c in px.iter_mut().take(3) {
                *c = (f32::from(*c) + n).round().clamp(0.0, a) as u8;
            }
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/effects/glitch.rs"]
mod tests;
