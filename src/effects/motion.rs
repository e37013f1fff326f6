use crate::effects::config::{MAX_MOTION_SAMPLES, MIN_MOTION_SAMPLES};
use crate::pixels::buffer::PixelBuffer;

/// Average of `samples` copies of `src` translated along `angle` (degrees) over `distance` pixels.
///
/// Samples are centred on the original position, so the result spreads at most `distance / 2`
/// in either direction.
pub fn motion_blur(src: &PixelBuffer, angle: f64, distance: f64, samples: u32) -> PixelBuffer {
    if !distance.is_finite() || distance < 1.0 {
        return src.clone();
    }
    let n = samples.clamp(MIN_MOTION_SAMPLES, MAX_MOTION_SAMPLES);
    let rad = angle.to_radians();
    let (dx, dy) = (rad.cos() * distance, rad.sin() * distance);

    let offsets: Vec<(i32, i32)> = (0..n)
        .map(|i| {
            let t = f64::from(i) / f64::from(n - 1) - 0.5;
            ((dx * t).round() as i32, (dy * t).round() as i32)
        })
        .collect();

    let (w, h) = (src.width(), src.height());
    let mut out = src.blank_like();
    let n = offsets.len() as u32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u32; 4];
            for &(ox, oy) in &offsets {
                let px = src.sample(x as i32 - ox, y as i32 - oy);
                for c in 0..4 {
                    acc[c] += u32::from(px[c]);
                }
            }
            if acc[3] == 0 {
                continue;
            }
            let avg = acc.map(|v| ((v + n / 2) / n).min(255) as u8);
            out.set_pixel(x, y, avg);
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/effects/motion.rs"]
mod tests;
