use super::*;

#[test]
fn defaults_match_documented_values() {
    let c = EngineConfig::default();
    assert_eq!(c.pixel_ratio, 2.0);
    assert_eq!(c.resync_debounce(), Duration::from_millis(120));
    assert_eq!(c.render_debounce(), Duration::from_millis(250));
    assert_eq!(c.render_timeout(), Duration::from_secs(8));
    assert_eq!(c.raster.max_group_children, 180);
    c.validate().unwrap();
}

#[test]
fn partial_json_keeps_defaults() {
    let c = EngineConfig::from_json_str(r#"{"pixelRatio": 1.5, "raster": {"maxGroupChildren": 50}}"#)
        .unwrap();
    assert_eq!(c.pixel_ratio, 1.5);
    assert_eq!(c.raster.max_group_children, 50);
    assert_eq!(c.raster.alpha_probe_grid, 24);
    assert_eq!(c.max_in_flight, 2);
}

#[test]
fn invalid_values_are_rejected() {
    for json in [
        r#"{"pixelRatio": 0}"#,
        r#"{"pixelRatio": 100}"#,
        r#"{"renderTimeoutMs": 0}"#,
        r#"{"maxInFlight": 0}"#,
        r#"{"maxRenderAttempts": 0}"#,
    ] {
        let err = EngineConfig::from_json_str(json).unwrap_err();
        assert!(matches!(err, FxError::Validation(_)), "{json}: {err}");
    }
    assert!(EngineConfig::from_json_str("not json").is_err());
}
