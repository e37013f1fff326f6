use crate::effects::blur::gaussian_blur;
use crate::effects::composite::mix;
use crate::effects::config::{Distortion, Effect, EffectStackConfig, Ramp};
use crate::effects::glitch::{GlitchParams, MoshParams, glitch, mosh};
use crate::effects::ramp::RampField;
use crate::effects::{bloom, motion, noise, shadow};
use crate::foundation::error::FxResult;
use crate::pixels::buffer::PixelBuffer;

/// Apply `stack` to `src`: effects first, then distortions, each in list order.
///
/// `stack` must already be in device pixels (see [`EffectStackConfig::scaled`]). Disabled and
/// no-op entries are skipped. The output has the same dimensions as the input.
pub fn apply_stack(src: &PixelBuffer, stack: &EffectStackConfig) -> FxResult<PixelBuffer> {
    stack.validate()?;
    let stack = stack.normalized();

    let mut cur = src.clone();
    for effect in &stack.effects {
        cur = apply_effect(&cur, effect)?;
    }
    for distortion in &stack.distortions {
        cur = apply_distortion(&cur, distortion)?;
    }
    Ok(cur)
}

fn apply_effect(src: &PixelBuffer, effect: &Effect) -> FxResult<PixelBuffer> {
    match effect {
        Effect::DropShadow(p) => shadow::drop_shadow(src, p),
        Effect::InnerShadow(p) => shadow::inner_shadow(src, p),
    }
}

fn apply_distortion(src: &PixelBuffer, distortion: &Distortion) -> FxResult<PixelBuffer> {
    Ok(match distortion {
        Distortion::Blur { radius, ramp, .. } => {
            let blurred = gaussian_blur(src, *radius)?;
            match ramp {
                Some(ramp) => blend_by_ramp(src, &blurred, ramp),
                None => blurred,
            }
        }
        Distortion::MotionBlur {
            angle,
            distance,
            samples,
            ..
        } => motion::motion_blur(src, *angle, *distance, *samples),
        Distortion::Bloom {
            threshold,
            radius,
            intensity,
            ..
        } => bloom::bloom(src, *threshold, *radius, *intensity)?,
        Distortion::Glitch {
            seed,
            shift,
            rgb_split,
            line_chance,
            darken_chance,
            darken_amount,
            ..
        } => glitch(
            src,
            &GlitchParams {
                seed: *seed,
                shift: *shift,
                rgb_split: *rgb_split,
                line_chance: *line_chance,
                darken_chance: *darken_chance,
                darken_amount: *darken_amount,
            },
        ),
        Distortion::Mosh {
            seed,
            block_size,
            displacement,
            ramp,
            dither,
            ..
        } => mosh(
            src,
            &MoshParams {
                seed: *seed,
                block_size: *block_size,
                displacement: *displacement,
                ramp: ramp.clone(),
                dither: *dither,
            },
        ),
        Distortion::Grain {
            seed,
            strength,
            block_size,
            ..
        } => noise::grain(src, *seed, *strength, *block_size),
        Distortion::Doodle { seed, amount, .. } => noise::doodle(src, *seed, *amount),
    })
}

// Per-pixel mix of original and blurred, weighted by the ramp.
fn blend_by_ramp(original: &PixelBuffer, blurred: &PixelBuffer, ramp: &Ramp) -> PixelBuffer {
    let (w, h) = (original.width(), original.height());
    let field = RampField::new(ramp, w, h);
    let mut out = original.blank_like();
    for y in 0..h {
        for x in 0..w {
            let t = field.weight_at(x, y);
            let a = original.sample(x as i32, y as i32);
            let b = blurred.sample(x as i32, y as i32);
            out.set_pixel(x, y, mix(a, b, t));
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/effects/stack.rs"]
mod tests;
