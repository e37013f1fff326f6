use super::*;

#[test]
fn over_opacity_0_is_noop() {
    let dst = [1, 2, 3, 4];
    let src = [200, 200, 200, 200];
    assert_eq!(over(dst, src, 0.0), dst);
}

#[test]
fn over_src_alpha_0_is_noop() {
    let dst = [10, 20, 30, 40];
    let src = [255, 255, 255, 0];
    assert_eq!(over(dst, src, 1.0), dst);
}

#[test]
fn over_src_opaque_replaces_dst() {
    let dst = [0, 0, 0, 255];
    let src = [255, 0, 0, 255];
    assert_eq!(over(dst, src, 1.0), src);
}

#[test]
fn over_dst_transparent_returns_src() {
    let dst = [0, 0, 0, 0];
    let src = [100, 110, 120, 200];
    assert_eq!(over(dst, src, 1.0), src);
}

#[test]
fn atop_keeps_destination_alpha() {
    let dst = [0, 0, 100, 100];
    let src = [50, 0, 0, 255];
    let out = atop(dst, src);
    assert_eq!(out[3], 100);
    assert!(out[0] > 0);
    assert_eq!(out[2], 0);

    // Nothing shows through transparent destination.
    assert_eq!(atop([0, 0, 0, 0], [255, 255, 255, 255]), [0, 0, 0, 0]);
}

#[test]
fn add_saturates_and_stays_premultiplied() {
    let out = add([200, 200, 200, 200], [200, 10, 10, 200], 1.0);
    assert_eq!(out[3], 255);
    assert!(out.iter().take(3).all(|&c| c <= out[3]));
    assert_eq!(add([1, 2, 3, 4], [9, 9, 9, 9], 0.0), [1, 2, 3, 4]);
}

#[test]
fn mix_endpoints() {
    let a = [10, 20, 30, 40];
    let b = [200, 210, 220, 230];
    assert_eq!(mix(a, b, 0.0), a);
    assert_eq!(mix(a, b, 1.0), b);
}

#[test]
fn buffer_ops_reject_size_mismatch() {
    let a = PixelBuffer::new(2, 2).unwrap();
    let b = PixelBuffer::new(3, 2).unwrap();
    assert!(over_buffers(&a, &b).is_err());
    assert!(atop_buffers(&a, &b).is_err());
}
