use super::*;

#[test]
fn proxy_id_is_derived_from_source() {
    let src = ShapeId::new("shape:abc");
    assert_eq!(ShapeId::proxy_for(&src).as_str(), "shape:abc::fx-proxy");
    assert_eq!(ShapeId::proxy_for(&src), ShapeId::proxy_for(&src));
}

#[test]
fn premul_with_opacity_scales_alpha() {
    let c = Rgba8::new(200, 100, 0, 255).premul_with_opacity(0.5);
    assert_eq!(c.a, 128);
    assert_eq!(c.r, ((200u16 * 128 + 127) / 255) as u8);
    assert_eq!(c.b, 0);
}

#[test]
fn premul_with_non_finite_opacity_is_transparent() {
    let c = Rgba8::WHITE.premul_with_opacity(f64::NAN);
    assert_eq!(c, Rgba8Premul::transparent());
}

#[test]
fn color_alpha_defaults_to_opaque_in_json() {
    let c: Rgba8 = serde_json::from_str(r#"{"r":1,"g":2,"b":3}"#).unwrap();
    assert_eq!(c, Rgba8::new(1, 2, 3, 255));
}
