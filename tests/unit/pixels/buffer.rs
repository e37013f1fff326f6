use super::*;

#[test]
fn new_rejects_empty_and_oversized() {
    assert!(PixelBuffer::new(0, 4).is_err());
    assert!(PixelBuffer::new(4, 0).is_err());
    assert!(PixelBuffer::new(PixelBuffer::MAX_DIM + 1, 1).is_err());
    let b = PixelBuffer::new(3, 2).unwrap();
    assert_eq!(b.data().len(), 3 * 2 * 4);
    assert!(b.is_fully_transparent());
}

#[test]
fn from_premul_checks_length() {
    assert!(PixelBuffer::from_premul(2, 2, vec![0u8; 15]).is_err());
    assert!(PixelBuffer::from_premul(2, 2, vec![0u8; 16]).is_ok());
}

#[test]
fn from_straight_premultiplies() {
    let b = PixelBuffer::from_straight(1, 1, vec![100, 50, 200, 128]).unwrap();
    assert_eq!(
        b.data(),
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn sample_out_of_range_is_transparent() {
    let b = PixelBuffer::filled(2, 2, Rgba8Premul::from_straight_rgba(255, 0, 0, 255)).unwrap();
    assert_eq!(b.sample(-1, 0), [0, 0, 0, 0]);
    assert_eq!(b.sample(2, 0), [0, 0, 0, 0]);
    assert_eq!(b.sample(1, 1), [255, 0, 0, 255]);
    assert_eq!(b.sample_clamped(5, -3), [255, 0, 0, 255]);
}

#[test]
fn draw_over_places_at_offset_and_clips() {
    let mut dst = PixelBuffer::new(4, 4).unwrap();
    let src = PixelBuffer::filled(2, 2, Rgba8Premul::from_straight_rgba(0, 0, 255, 255)).unwrap();
    dst.draw_over(&src, 3, 3);
    assert_eq!(dst.sample(3, 3), [0, 0, 255, 255]);
    assert_eq!(dst.sample(2, 2), [0, 0, 0, 0]);

    let mut dst = PixelBuffer::new(4, 4).unwrap();
    dst.draw_over(&src, -1, -1);
    assert_eq!(dst.sample(0, 0), [0, 0, 255, 255]);
    assert_eq!(dst.sample(1, 1), [0, 0, 0, 0]);
}

#[test]
fn draw_over_blends_translucent_source() {
    let mut dst = PixelBuffer::filled(1, 1, Rgba8Premul::from_straight_rgba(0, 0, 0, 255)).unwrap();
    let src = PixelBuffer::filled(1, 1, Rgba8Premul::from_straight_rgba(255, 255, 255, 128))
        .unwrap();
    dst.draw_over(&src, 0, 0);
    let px = dst.sample(0, 0);
    assert_eq!(px[3], 255);
    assert_eq!(px[0], 128);
}

#[test]
fn visible_content_probe_finds_blocks() {
    let mut b = PixelBuffer::new(64, 64).unwrap();
    assert!(!b.has_visible_content(8));
    for y in 8..24 {
        for x in 8..24 {
            b.set_pixel(x, y, [10, 10, 10, 255]);
        }
    }
    assert!(b.has_visible_content(8));
}

#[test]
fn unpremultiply_inverts_premultiply_for_opaque_and_clear() {
    let mut px = vec![10u8, 20, 30, 255, 0, 0, 0, 0];
    let orig = px.clone();
    premultiply_rgba8_in_place(&mut px);
    unpremultiply_rgba8_in_place(&mut px);
    assert_eq!(px, orig);
}

#[test]
fn pixmap_view_draws_into_buffer() {
    let mut b = PixelBuffer::new(4, 4).unwrap();
    b.with_pixmap_mut(|pm| {
        let mut paint = resvg::tiny_skia::Paint::default();
        paint.set_color_rgba8(0, 255, 0, 255);
        let rect = resvg::tiny_skia::Rect::from_xywh(0.0, 0.0, 4.0, 4.0).unwrap();
        pm.fill_rect(rect, &paint, resvg::tiny_skia::Transform::identity(), None);
    })
    .unwrap();
    assert_eq!(b.sample(2, 2), [0, 255, 0, 255]);
}
