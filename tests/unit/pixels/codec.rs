use std::io::Cursor;

use super::*;

#[test]
fn decode_image_png_dimensions_and_premul() {
    let src_rgba = vec![100u8, 50u8, 200u8, 128u8];
    let img = image::RgbaImage::from_raw(1, 1, src_rgba).unwrap();

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();

    let decoded = decode_image(&buf).unwrap();
    assert_eq!(decoded.width(), 1);
    assert_eq!(decoded.height(), 1);
    assert_eq!(
        decoded.data(),
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn decode_garbage_is_decode_error() {
    let err = decode_image(b"definitely not a png").unwrap_err();
    assert!(matches!(err, FxError::Decode(_)));
    assert!(matches!(decode_image(&[]).unwrap_err(), FxError::Decode(_)));
}

#[test]
fn encode_then_decode_keeps_opaque_pixels() {
    let mut b = PixelBuffer::new(3, 2).unwrap();
    b.set_pixel(1, 1, [12, 34, 56, 255]);
    let png = encode_png(&b).unwrap();
    let back = decode_image(&png).unwrap();
    assert_eq!(back, b);
}

#[test]
fn handle_carries_png_payload() {
    let b = PixelBuffer::new(2, 2).unwrap();
    let png = encode_png(&b).unwrap();
    let handle = ImageHandle::from_png(&png);
    assert!(handle.url().starts_with("data:image/png;base64,"));
    assert_eq!(handle.png_bytes().unwrap(), png);
}

#[test]
fn resize_to_matches_requested_size() {
    let b = PixelBuffer::new(4, 4).unwrap();
    let r = resize_to(b, 8, 2).unwrap();
    assert_eq!((r.width(), r.height()), (8, 2));
}
