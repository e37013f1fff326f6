use super::*;
use crate::effects::config::ShadowParams;

fn shadow_stack(ox: f64, oy: f64, blur: f64) -> EffectStackConfig {
    EffectStackConfig {
        effects: vec![Effect::DropShadow(ShadowParams {
            offset_x: ox,
            offset_y: oy,
            blur,
            ..ShadowParams::default()
        })],
        distortions: vec![],
    }
}

fn blur_stack(radius: f64) -> EffectStackConfig {
    EffectStackConfig {
        effects: vec![],
        distortions: vec![Distortion::Blur {
            enabled: true,
            radius,
            ramp: None,
        }],
    }
}

#[test]
fn shadow_margin_covers_offset_plus_blur() {
    let m = margin_for(&shadow_stack(4.0, 4.0, 6.0), 2.0);
    assert!(m.right >= 20);
    assert!(m.bottom >= 20);
    assert_eq!(m.left, 4);
    assert_eq!(m.top, 4);
}

#[test]
fn blur_margin_is_symmetric() {
    let m = margin_for(&blur_stack(3.0), 1.5);
    assert_eq!(
        m,
        Margin {
            left: 5,
            top: 5,
            right: 5,
            bottom: 5
        }
    );
}

#[test]
fn motion_blur_projects_half_distance() {
    let stack = EffectStackConfig {
        effects: vec![],
        distortions: vec![Distortion::MotionBlur {
            enabled: true,
            angle: 0.0,
            distance: 10.0,
            samples: 8,
        }],
    };
    let m = margin_for(&stack, 1.0);
    assert_eq!((m.left, m.right), (5, 5));
    assert_eq!((m.top, m.bottom), (0, 0));
}

#[test]
fn pixel_space_distortions_need_no_margin() {
    let stack = EffectStackConfig {
        effects: vec![],
        distortions: vec![
            Distortion::Glitch {
                enabled: true,
                seed: 1,
                shift: 20.0,
                rgb_split: 3.0,
                line_chance: 0.5,
                darken_chance: 0.0,
                darken_amount: 0.0,
            },
            Distortion::Grain {
                enabled: true,
                seed: 1,
                strength: 0.5,
                block_size: 1,
            },
            Distortion::Doodle {
                enabled: true,
                seed: 1,
                amount: 4.0,
            },
        ],
    };
    assert!(margin_for(&stack, 2.0).is_zero());
    assert!(margin_for_opt(None, 2.0).is_zero());
}

#[test]
fn margin_is_monotonic_in_radius() {
    let mut prev = Margin::ZERO;
    for i in 0..20 {
        let r = f64::from(i) * 0.75;
        let m = margin_for(&blur_stack(r), 2.0);
        assert!(m.left >= prev.left && m.right >= prev.right);
        assert!(m.top >= prev.top && m.bottom >= prev.bottom);
        prev = m;

        let s = margin_for(&shadow_stack(2.0, -3.0, r), 2.0);
        let s_next = margin_for(&shadow_stack(2.0, -3.0, r + 0.5), 2.0);
        assert!(s_next.left >= s.left && s_next.right >= s.right);
        assert!(s_next.top >= s.top && s_next.bottom >= s.bottom);
    }
}

#[test]
fn later_blur_widens_earlier_shadow() {
    let mut stack = shadow_stack(5.0, 0.0, 0.0);
    stack.distortions = blur_stack(2.0).distortions;
    let m = margin_for(&stack, 1.0);
    assert_eq!(m.right, 7);
    assert_eq!(m.left, 2);
}

#[test]
fn expand_divides_by_pixel_ratio() {
    let m = Margin {
        left: 4,
        top: 2,
        right: 8,
        bottom: 6,
    };
    let r = m.expand(Rect::new(10.0, 10.0, 20.0, 20.0), 2.0);
    assert_eq!(r, Rect::new(8.0, 9.0, 24.0, 23.0));
}

#[test]
fn device_size_rounds_up() {
    assert_eq!(device_size(Rect::new(0.0, 0.0, 10.0, 5.0), 2.0), (20, 10));
    assert_eq!(device_size(Rect::new(0.0, 0.0, 10.2, 0.1), 1.0), (11, 1));
}
