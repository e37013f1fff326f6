use crate::foundation::core::Rgba8;
use crate::foundation::error::{FxError, FxResult};

/// Ordered effect configuration attached to a source shape.
///
/// Effects (shadows) run before distortions; each list runs in order. A stack with no enabled,
/// non-trivial entry is equivalent to "no effect" and never produces a proxy.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectStackConfig {
    #[serde(default)]
    pub effects: Vec<Effect>,
    #[serde(default)]
    pub distortions: Vec<Distortion>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Effect {
    DropShadow(ShadowParams),
    InnerShadow(ShadowParams),
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShadowParams {
    #[serde(default = "enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub offset_x: f64,
    #[serde(default)]
    pub offset_y: f64,
    /// Gaussian blur radius in document pixels.
    #[serde(default)]
    pub blur: f64,
    #[serde(default)]
    pub color: Rgba8,
    #[serde(default = "one")]
    pub opacity: f64,
}

impl Default for ShadowParams {
    fn default() -> Self {
        Self {
            enabled: true,
            offset_x: 0.0,
            offset_y: 0.0,
            blur: 0.0,
            color: Rgba8::BLACK,
            opacity: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Distortion {
    #[serde(rename_all = "camelCase")]
    Blur {
        #[serde(default = "enabled")]
        enabled: bool,
        radius: f64,
        #[serde(default)]
        ramp: Option<Ramp>,
    },
    #[serde(rename_all = "camelCase")]
    MotionBlur {
        #[serde(default = "enabled")]
        enabled: bool,
        /// Direction in degrees, 0 = +x, clockwise in screen space.
        #[serde(default)]
        angle: f64,
        distance: f64,
        #[serde(default = "default_samples")]
        samples: u32,
    },
    #[serde(rename_all = "camelCase")]
    Bloom {
        #[serde(default = "enabled")]
        enabled: bool,
        /// Luminance cutoff in `[0, 1]`.
        #[serde(default = "default_bloom_threshold")]
        threshold: f64,
        radius: f64,
        #[serde(default = "one")]
        intensity: f64,
    },
    #[serde(rename_all = "camelCase")]
    Glitch {
        #[serde(default = "enabled")]
        enabled: bool,
        #[serde(default)]
        seed: u64,
        /// Maximum horizontal scanline shift in pixels.
        #[serde(default)]
        shift: f64,
        /// Horizontal red/blue channel offset in pixels.
        #[serde(default)]
        rgb_split: f64,
        /// Probability a scanline is shifted.
        #[serde(default = "default_glitch_chance")]
        line_chance: f64,
        /// Probability a scanline is darkened.
        #[serde(default)]
        darken_chance: f64,
        /// Darkening factor applied to selected scanlines, `[0, 1]`.
        #[serde(default = "default_darken_amount")]
        darken_amount: f64,
    },
    #[serde(rename_all = "camelCase")]
    Mosh {
        #[serde(default = "enabled")]
        enabled: bool,
        #[serde(default)]
        seed: u64,
        #[serde(default = "default_block_size")]
        block_size: u32,
        /// Maximum block displacement in pixels.
        displacement: f64,
        #[serde(default)]
        ramp: Option<Ramp>,
        /// Dither noise strength in `[0, 1]`.
        #[serde(default)]
        dither: f64,
    },
    #[serde(rename_all = "camelCase")]
    Grain {
        #[serde(default = "enabled")]
        enabled: bool,
        #[serde(default)]
        seed: u64,
        /// Noise strength in `[0, 1]`.
        strength: f64,
        #[serde(default = "one_u32")]
        block_size: u32,
    },
    #[serde(rename_all = "camelCase")]
    Doodle {
        #[serde(default = "enabled")]
        enabled: bool,
        #[serde(default)]
        seed: u64,
        /// Maximum edge displacement in pixels.
        amount: f64,
    },
}

/// Directional weighting of a distortion across the buffer.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ramp {
    /// Gradient direction in degrees, 0 = left to right.
    #[serde(default)]
    pub angle: f64,
    #[serde(default)]
    pub stops: Vec<RampStop>,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RampStop {
    /// Position along the gradient in `[0, 1]`.
    pub offset: f64,
    /// Effect weight at this position in `[0, 1]`.
    pub weight: f64,
}

fn enabled() -> bool {
    true
}

fn one() -> f64 {
    1.0
}

fn one_u32() -> u32 {
    1
}

fn default_samples() -> u32 {
    12
}

fn default_bloom_threshold() -> f64 {
    0.7
}

fn default_glitch_chance() -> f64 {
    0.3
}

fn default_darken_amount() -> f64 {
    0.35
}

fn default_block_size() -> u32 {
    8
}

pub(crate) const MIN_MOTION_SAMPLES: u32 = 2;
pub(crate) const MAX_MOTION_SAMPLES: u32 = 64;
pub(crate) const MAX_BLOCK_SIZE: u32 = 256;
/// Radii, offsets and displacements beyond this are treated as configuration errors.
const MAX_EXTENT_PX: f64 = 4096.0;

impl Effect {
    pub fn params(&self) -> &ShadowParams {
        match self {
            Self::DropShadow(p) | Self::InnerShadow(p) => p,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.params().enabled
    }

    fn is_noop(&self) -> bool {
        let p = self.params();
        p.opacity <= 0.0 || p.color.a == 0
    }

    fn scaled(&self, k: f64) -> Self {
        let scale = |p: &ShadowParams| ShadowParams {
            offset_x: p.offset_x * k,
            offset_y: p.offset_y * k,
            blur: p.blur * k,
            ..p.clone()
        };
        match self {
            Self::DropShadow(p) => Self::DropShadow(scale(p)),
            Self::InnerShadow(p) => Self::InnerShadow(scale(p)),
        }
    }
}

impl Distortion {
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::Blur { enabled, .. }
            | Self::MotionBlur { enabled, .. }
            | Self::Bloom { enabled, .. }
            | Self::Glitch { enabled, .. }
            | Self::Mosh { enabled, .. }
            | Self::Grain { enabled, .. }
            | Self::Doodle { enabled, .. } => *enabled,
        }
    }

    fn is_noop(&self) -> bool {
        match self {
            Self::Blur { radius, .. } => *radius <= 0.0,
            Self::MotionBlur { distance, .. } => *distance <= 0.0,
            Self::Bloom {
                radius, intensity, ..
            } => *intensity <= 0.0 || *radius < 0.0,
            Self::Glitch {
                shift,
                rgb_split,
                darken_chance,
                darken_amount,
                ..
            } => *shift <= 0.0 && *rgb_split <= 0.0 && (*darken_chance <= 0.0 || *darken_amount <= 0.0),
            Self::Mosh {
                displacement,
                dither,
                ..
            } => *displacement <= 0.0 && *dither <= 0.0,
            Self::Grain { strength, .. } => *strength <= 0.0,
            Self::Doodle { amount, .. } => *amount <= 0.0,
        }
    }

    fn clamped(&self) -> Self {
        let unit = |v: f64| v.clamp(0.0, 1.0);
        match self.clone() {
            Self::MotionBlur {
                enabled,
                angle,
                distance,
                samples,
            } => Self::MotionBlur {
                enabled,
                angle,
                distance,
                samples: samples.clamp(MIN_MOTION_SAMPLES, MAX_MOTION_SAMPLES),
            },
            Self::Bloom {
                enabled,
                threshold,
                radius,
                intensity,
            } => Self::Bloom {
                enabled,
                threshold: unit(threshold),
                radius,
                intensity,
            },
            Self::Glitch {
                enabled,
                seed,
                shift,
                rgb_split,
                line_chance,
                darken_chance,
                darken_amount,
            } => Self::Glitch {
                enabled,
                seed,
                shift,
                rgb_split,
                line_chance: unit(line_chance),
                darken_chance: unit(darken_chance),
                darken_amount: unit(darken_amount),
            },
            Self::Mosh {
                enabled,
                seed,
                block_size,
                displacement,
                ramp,
                dither,
            } => Self::Mosh {
                enabled,
                seed,
                block_size: block_size.clamp(1, MAX_BLOCK_SIZE),
                displacement,
                ramp,
                dither: unit(dither),
            },
            Self::Grain {
                enabled,
                seed,
                strength,
                block_size,
            } => Self::Grain {
                enabled,
                seed,
                strength: unit(strength),
                block_size: block_size.clamp(1, MAX_BLOCK_SIZE),
            },
            other => other,
        }
    }

    /// Scale every pixel-denominated parameter by `k` (document pixels to device pixels).
    fn scaled(&self, k: f64) -> Self {
        match self.clone() {
            Self::Blur {
                enabled,
                radius,
                ramp,
            } => Self::Blur {
                enabled,
                radius: radius * k,
                ramp,
            },
            Self::MotionBlur {
                enabled,
                angle,
                distance,
                samples,
            } => Self::MotionBlur {
                enabled,
                angle,
                distance: distance * k,
                samples,
            },
            Self::Bloom {
                enabled,
                threshold,
                radius,
                intensity,
            } => Self::Bloom {
                enabled,
                threshold,
                radius: radius * k,
                intensity,
            },
            Self::Glitch {
                enabled,
                seed,
                shift,
                rgb_split,
                line_chance,
                darken_chance,
                darken_amount,
            } => Self::Glitch {
                enabled,
                seed,
                shift: shift * k,
                rgb_split: rgb_split * k,
                line_chance,
                darken_chance,
                darken_amount,
            },
            Self::Mosh {
                enabled,
                seed,
                block_size,
                displacement,
                ramp,
                dither,
            } => Self::Mosh {
                enabled,
                seed,
                block_size: ((f64::from(block_size) * k).round() as u32).max(1),
                displacement: displacement * k,
                ramp,
                dither,
            },
            Self::Grain {
                enabled,
                seed,
                strength,
                block_size,
            } => Self::Grain {
                enabled,
                seed,
                strength,
                block_size: ((f64::from(block_size) * k).round() as u32).max(1),
            },
            Self::Doodle {
                enabled,
                seed,
                amount,
            } => Self::Doodle {
                enabled,
                seed,
                amount: amount * k,
            },
        }
    }

    fn numeric_params(&self) -> Vec<(&'static str, f64)> {
        match self {
            Self::Blur { radius, ramp, .. } => {
                let mut v = vec![("blur.radius", *radius)];
                push_ramp(&mut v, ramp.as_ref());
                v
            }
            Self::MotionBlur {
                angle, distance, ..
            } => vec![("motionBlur.angle", *angle), ("motionBlur.distance", *distance)],
            Self::Bloom {
                threshold,
                radius,
                intensity,
                ..
            } => vec![
                ("bloom.threshold", *threshold),
                ("bloom.radius", *radius),
                ("bloom.intensity", *intensity),
            ],
            Self::Glitch {
                shift,
                rgb_split,
                line_chance,
                darken_chance,
                darken_amount,
                ..
            } => vec![
                ("glitch.shift", *shift),
                ("glitch.rgbSplit", *rgb_split),
                ("glitch.lineChance", *line_chance),
                ("glitch.darkenChance", *darken_chance),
                ("glitch.darkenAmount", *darken_amount),
            ],
            Self::Mosh {
                displacement,
                ramp,
                dither,
                ..
            } => {
                let mut v = vec![("mosh.displacement", *displacement), ("mosh.dither", *dither)];
                push_ramp(&mut v, ramp.as_ref());
                v
            }
            Self::Grain { strength, .. } => vec![("grain.strength", *strength)],
            Self::Doodle { amount, .. } => vec![("doodle.amount", *amount)],
        }
    }
}

fn push_ramp(v: &mut Vec<(&'static str, f64)>, ramp: Option<&Ramp>) {
    if let Some(r) = ramp {
        v.push(("ramp.angle", r.angle));
        for s in &r.stops {
            v.push(("ramp.stop.offset", s.offset));
            v.push(("ramp.stop.weight", s.weight));
        }
    }
}

impl EffectStackConfig {
    /// Reject non-finite numbers and negative extents.
    pub fn validate(&self) -> FxResult<()> {
        for e in &self.effects {
            let p = e.params();
            for (name, v) in [
                ("shadow.offsetX", p.offset_x),
                ("shadow.offsetY", p.offset_y),
                ("shadow.blur", p.blur),
                ("shadow.opacity", p.opacity),
            ] {
                check_finite(name, v)?;
            }
            if p.blur < 0.0 {
                return Err(FxError::validation("shadow.blur must be >= 0"));
            }
            if p.blur > MAX_EXTENT_PX || p.offset_x.abs() > MAX_EXTENT_PX || p.offset_y.abs() > MAX_EXTENT_PX {
                return Err(FxError::validation(format!(
                    "shadow extent must be <= {MAX_EXTENT_PX}px"
                )));
            }
        }
        for d in &self.distortions {
            for (name, v) in d.numeric_params() {
                check_finite(name, v)?;
            }
            let extent = match d {
                Distortion::Blur { radius, .. } => Some(("blur.radius", *radius)),
                Distortion::MotionBlur { distance, .. } => Some(("motionBlur.distance", *distance)),
                Distortion::Bloom { radius, .. } => Some(("bloom.radius", *radius)),
                Distortion::Mosh { displacement, .. } => Some(("mosh.displacement", *displacement)),
                Distortion::Doodle { amount, .. } => Some(("doodle.amount", *amount)),
                Distortion::Glitch { shift, .. } => Some(("glitch.shift", *shift)),
                Distortion::Grain { .. } => None,
            };
            if let Some((name, v)) = extent {
                if v < 0.0 {
                    return Err(FxError::validation(format!("{name} must be >= 0")));
                }
                if v > MAX_EXTENT_PX {
                    return Err(FxError::validation(format!(
                        "{name} must be <= {MAX_EXTENT_PX}px"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Enabled, non-trivial entries only, with parameters clamped to their legal ranges.
    pub fn normalized(&self) -> Self {
        Self {
            effects: self
                .effects
                .iter()
                .filter(|e| e.is_enabled() && !e.is_noop())
                .cloned()
                .collect(),
            distortions: self
                .distortions
                .iter()
                .filter(|d| d.is_enabled() && !d.is_noop())
                .map(Distortion::clamped)
                .collect(),
        }
    }

    /// True when applying the stack would be a no-op.
    pub fn is_empty(&self) -> bool {
        let n = self.normalized();
        n.effects.is_empty() && n.distortions.is_empty()
    }

    /// Same stack with pixel extents multiplied by `pixel_ratio`.
    pub fn scaled(&self, pixel_ratio: f64) -> Self {
        Self {
            effects: self.effects.iter().map(|e| e.scaled(pixel_ratio)).collect(),
            distortions: self
                .distortions
                .iter()
                .map(|d| d.scaled(pixel_ratio))
                .collect(),
        }
    }

    /// Parse from the JSON authored by the style editor.
    pub fn from_json_str(s: &str) -> FxResult<Self> {
        let stack: Self = serde_json::from_str(s)
            .map_err(|e| FxError::validation(format!("effect stack json: {e}")))?;
        stack.validate()?;
        Ok(stack)
    }
}

/// The stack to actually apply: validated, normalized, and absent when it would do nothing.
pub fn active_stack(stack: Option<&EffectStackConfig>) -> Option<EffectStackConfig> {
    let stack = stack?;
    if stack.validate().is_err() {
        return None;
    }
    let n = stack.normalized();
    if n.effects.is_empty() && n.distortions.is_empty() {
        None
    } else {
        Some(n)
    }
}

fn check_finite(name: &str, v: f64) -> FxResult<()> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(FxError::validation(format!("{name} must be finite")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/config.rs"]
mod tests;
