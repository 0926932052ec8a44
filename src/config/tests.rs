use super::*;

#[test]
fn defaults_apply_when_nothing_is_configured() {
    let raw = RawSettings::default();
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.render.dot_path, DEFAULT_DOT_PATH);
    assert_eq!(settings.render.image_format, ImageFormat::Png);
    assert_eq!(settings.render.renderer, RendererKind::Image);
    assert_eq!(settings.render.max_concurrent_renders.get(), 4);
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.render.dot_path = Some("/usr/bin/dot".to_string());
    raw.render.image_format = Some("png".to_string());

    let overrides = RenderOverrides {
        dot_path: Some("/opt/graphviz/bin/dot".to_string()),
        image_format: Some("svg".to_string()),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.render.dot_path, "/opt/graphviz/bin/dot");
    assert_eq!(settings.render.image_format, ImageFormat::Svg);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn empty_dot_path_falls_back_to_default() {
    let mut raw = RawSettings::default();
    raw.render.dot_path = Some("   ".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.render.dot_path, DEFAULT_DOT_PATH);
}

#[test]
fn dot_path_is_trimmed() {
    let mut raw = RawSettings::default();
    raw.render.dot_path = Some("  /usr/local/bin/dot \n".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.render.dot_path, "/usr/local/bin/dot");
}

#[test]
fn unsupported_image_format_is_rejected() {
    let mut raw = RawSettings::default();
    raw.render.image_format = Some("gif".to_string());

    let err = Settings::from_raw(raw).expect_err("gif is unsupported");
    match err {
        LoadError::Invalid { key, reason } => {
            assert_eq!(key, "render.image_format");
            assert!(reason.contains("gif"), "reason should name the token: {reason}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn image_format_parsing_is_case_insensitive() {
    assert_eq!("PNG".parse::<ImageFormat>().unwrap(), ImageFormat::Png);
    assert_eq!(" Svg ".parse::<ImageFormat>().unwrap(), ImageFormat::Svg);
}

#[test]
fn renderer_kind_parses_both_pipelines() {
    assert_eq!("image".parse::<RendererKind>().unwrap(), RendererKind::Image);
    assert_eq!("d3".parse::<RendererKind>().unwrap(), RendererKind::D3);
    assert!("canvas".parse::<RendererKind>().is_err());
}

#[test]
fn zero_concurrency_is_rejected() {
    let mut raw = RawSettings::default();
    raw.render.max_concurrent_renders = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero permits is invalid");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "render.max_concurrent_renders",
            ..
        }
    ));
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = RenderOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn mime_types_track_the_configured_format() {
    assert_eq!(ImageFormat::Png.mime_type(), "image/png");
    assert_eq!(ImageFormat::Svg.mime_type(), "image/svg+xml");
    assert_eq!(ImageFormat::Png.as_str(), "png");
    assert_eq!(ImageFormat::Svg.as_str(), "svg");
}
