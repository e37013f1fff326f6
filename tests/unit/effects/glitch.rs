use super::*;

fn stripes(w: u32, h: u32) -> PixelBuffer {
    let mut buf = PixelBuffer::new(w, h).unwrap();
    for y in 0..h {
        for x in 0..w {
            let v = ((x * 37 + y * 11) % 256) as u8;
            buf.set_pixel(x, y, [v / 2, v / 3, v / 4, 255]);
        }
    }
    buf
}

fn glitch_params(seed: u64) -> GlitchParams {
    GlitchParams {
        seed,
        shift: 6.0,
        rgb_split: 2.0,
        line_chance: 0.5,
        darken_chance: 0.3,
        darken_amount: 0.4,
    }
}

#[test]
fn glitch_is_deterministic_per_seed() {
    let src = stripes(32, 32);
    let a = glitch(&src, &glitch_params(7));
    let b = glitch(&src, &glitch_params(7));
    let c = glitch(&src, &glitch_params(8));
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn glitch_with_no_features_is_identity() {
    let src = stripes(16, 16);
    let p = GlitchParams {
        seed: 1,
        shift: 0.0,
        rgb_split: 0.0,
        line_chance: 1.0,
        darken_chance: 0.0,
        darken_amount: 0.5,
    };
    assert_eq!(glitch(&src, &p), src);
}

#[test]
fn rgb_split_separates_channels() {
    let mut src = PixelBuffer::new(11, 1).unwrap();
    src.set_pixel(5, 0, [255, 255, 255, 255]);
    let p = GlitchParams {
        seed: 3,
        shift: 0.0,
        rgb_split: 2.0,
        line_chance: 0.0,
        darken_chance: 0.0,
        darken_amount: 0.0,
    };
    let out = glitch(&src, &p);
    assert_eq!(out.sample(7, 0), [255, 0, 0, 255]);
    assert_eq!(out.sample(5, 0), [0, 255, 0, 255]);
    assert_eq!(out.sample(3, 0), [0, 0, 255, 255]);
}

#[test]
fn full_darkening_blackens_rows() {
    let src = stripes(8, 8);
    let p = GlitchParams {
        seed: 9,
        shift: 0.0,
        rgb_split: 0.0,
        line_chance: 0.0,
        darken_chance: 1.0,
        darken_amount: 1.0,
    };
    let out = glitch(&src, &p);
    for px in out.data().chunks_exact(4) {
        assert_eq!(px, [0, 0, 0, 255]);
    }
}

fn mosh_params(seed: u64) -> MoshParams {
    MoshParams {
        seed,
        block_size: 4,
        displacement: 3.0,
        ramp: None,
        dither: 0.5,
    }
}

#[test]
fn mosh_is_deterministic_per_seed() {
    let src = stripes(24, 24);
    assert_eq!(mosh(&src, &mosh_params(42)), mosh(&src, &mosh_params(42)));
    assert_ne!(mosh(&src, &mosh_params(42)), mosh(&src, &mosh_params(43)));
}

#[test]
fn mosh_keeps_premultiplied_invariant() {
    let mut src = stripes(16, 16);
    src.set_pixel(3, 3, [10, 10, 10, 20]);
    let out = mosh(&src, &mosh_params(5));
    for px in out.data().chunks_exact(4) {
        assert!(px[0] <= px[3] && px[1] <= px[3] && px[2] <= px[3]);
    }
}

#[test]
fn zero_weight_ramp_disables_displacement() {
    let src = stripes(16, 16);
    let p = MoshParams {
        ramp: Some(Ramp {
            angle: 0.0,
            stops: vec![crate::effects::config::RampStop {
                offset: 0.0,
                weight: 0.0,
            }],
        }),
        dither: 0.0,
        ..mosh_params(11)
    };
    assert_eq!(mosh(&src, &p), src);
}
