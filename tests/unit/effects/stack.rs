use super::*;
use crate::effects::config::{RampStop, ShadowParams};

fn sample_source() -> PixelBuffer {
    let mut buf = PixelBuffer::new(48, 48).unwrap();
    for y in 12..36 {
        for x in 12..36 {
            let v = ((x * 7 + y * 13) % 200) as u8 + 40;
            buf.set_pixel(x, y, [v, v / 2, 255 - v, 255]);
        }
    }
    // Soft rim so doodle has edge pixels to work with.
    for x in 12..36 {
        buf.set_pixel(x, 11, [60, 60, 60, 120]);
    }
    buf
}

fn everything(seed: u64) -> EffectStackConfig {
    EffectStackConfig {
        effects: vec![
            Effect::DropShadow(ShadowParams {
                offset_x: 3.0,
                offset_y: 3.0,
                blur: 2.0,
                ..ShadowParams::default()
            }),
            Effect::InnerShadow(ShadowParams {
                offset_x: -1.0,
                offset_y: 1.0,
                blur: 1.0,
                opacity: 0.6,
                ..ShadowParams::default()
            }),
        ],
        distortions: vec![
            Distortion::Blur {
                enabled: true,
                radius: 1.5,
                ramp: Some(Ramp {
                    angle: 45.0,
                    stops: vec![
                        RampStop {
                            offset: 0.0,
                            weight: 0.0,
                        },
                        RampStop {
                            offset: 1.0,
                            weight: 1.0,
                        },
                    ],
                }),
            },
            Distortion::MotionBlur {
                enabled: true,
                angle: 30.0,
                distance: 4.0,
                samples: 6,
            },
            Distortion::Bloom {
                enabled: true,
                threshold: 0.4,
                radius: 2.0,
                intensity: 0.7,
            },
            Distortion::Glitch {
                enabled: true,
                seed,
                shift: 4.0,
                rgb_split: 1.0,
                line_chance: 0.4,
                darken_chance: 0.2,
                darken_amount: 0.3,
            },
            Distortion::Mosh {
                enabled: true,
                seed,
                block_size: 6,
                displacement: 2.0,
                ramp: None,
                dither: 0.3,
            },
            Distortion::Grain {
                enabled: true,
                seed,
                strength: 0.2,
                block_size: 2,
            },
            Distortion::Doodle {
                enabled: true,
                seed,
                amount: 2.0,
            },
        ],
    }
}

#[test]
fn applying_twice_is_byte_identical() {
    let src = sample_source();
    let stack = everything(1234);
    let a = apply_stack(&src, &stack).unwrap();
    let b = apply_stack(&src, &stack).unwrap();
    assert_eq!(a.data(), b.data());
    assert_ne!(a.data(), src.data());
}

#[test]
fn seed_changes_output() {
    let src = sample_source();
    let a = apply_stack(&src, &everything(1)).unwrap();
    let b = apply_stack(&src, &everything(2)).unwrap();
    assert_ne!(a.data(), b.data());
}

#[test]
fn empty_stack_is_identity() {
    let src = sample_source();
    let out = apply_stack(&src, &EffectStackConfig::default()).unwrap();
    assert_eq!(out, src);
}

#[test]
fn disabled_entries_are_skipped() {
    let src = sample_source();
    let stack = EffectStackConfig {
        effects: vec![],
        distortions: vec![Distortion::Blur {
            enabled: false,
            radius: 5.0,
            ramp: None,
        }],
    };
    assert_eq!(apply_stack(&src, &stack).unwrap(), src);
}

#[test]
fn order_matters() {
    let src = sample_source();
    let blur = Distortion::Blur {
        enabled: true,
        radius: 3.0,
        ramp: None,
    };
    let glitch = Distortion::Glitch {
        enabled: true,
        seed: 5,
        shift: 6.0,
        rgb_split: 2.0,
        line_chance: 0.8,
        darken_chance: 0.0,
        darken_amount: 0.0,
    };
    let ab = EffectStackConfig {
        effects: vec![],
        distortions: vec![blur.clone(), glitch.clone()],
    };
    let ba = EffectStackConfig {
        effects: vec![],
        distortions: vec![glitch, blur],
    };
    assert_ne!(
        apply_stack(&src, &ab).unwrap().data(),
        apply_stack(&src, &ba).unwrap().data()
    );
}

#[test]
fn ramped_blur_leaves_zero_weight_side_sharp() {
    let src = sample_source();
    let stack = EffectStackConfig {
        effects: vec![],
        distortions: vec![Distortion::Blur {
            enabled: true,
            radius: 4.0,
            ramp: Some(Ramp {
                angle: 0.0,
                stops: vec![
                    RampStop {
                        offset: 0.0,
                        weight: 0.0,
                    },
                    RampStop {
                        offset: 0.3,
                        weight: 0.0,
                    },
                    RampStop {
                        offset: 0.7,
                        weight: 1.0,
                    },
                ],
            }),
        }],
    };
    let out = apply_stack(&src, &stack).unwrap();
    let uniform = gaussian_blur(&src, 4.0).unwrap();
    // Left edge of the square (x = 12) sits in the zero-weight zone.
    assert_eq!(out.sample(12, 20), src.sample(12, 20));
    // Right edge (x = 35) is fully blurred.
    assert_eq!(out.sample(35, 20), uniform.sample(35, 20));
}

#[test]
fn invalid_stack_is_rejected() {
    let src = sample_source();
    let stack = EffectStackConfig {
        effects: vec![],
        distortions: vec![Distortion::Blur {
            enabled: true,
            radius: f64::NAN,
            ramp: None,
        }],
    };
    assert!(apply_stack(&src, &stack).is_err());
}
