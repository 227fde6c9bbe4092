use super::*;

#[test]
fn parses_array_with_mime_style_type_tags() {
    let layers = parse_layers(
        r#"[
            {"type": "image/image", "file": "base.png"},
            {"type": "image/text", "text": "Label", "pointsize": 32}
        ]"#,
    )
    .unwrap();

    assert_eq!(layers.len(), 2);
    assert_eq!(layers[0], Layer::image("base.png"));
    let Layer::Text(text) = &layers[1] else {
        panic!("expected text layer");
    };
    assert_eq!(text.text, "Label");
    assert_eq!(text.pointsize, Some(PointSize::Points(32.0)));
    assert_eq!(text.color, "black");
    assert_eq!(text.gravity, Gravity::NorthWest);
    assert_eq!(text.offset(), Offset::new(0, 0));
}

#[test]
fn single_object_is_a_one_element_stack() {
    let layers = parse_layers(r#"{"type": "text", "text": "hi", "x": 4, "y": -2}"#).unwrap();
    assert_eq!(layers.len(), 1);
    let Layer::Text(text) = &layers[0] else {
        panic!("expected text layer");
    };
    assert_eq!(text.offset(), Offset::new(4, -2));
}

#[test]
fn unknown_type_parses_as_unknown() {
    let layers = parse_layers(
        r#"[{"type": "image/sparkle", "file": "x.png"}, {"type": "image", "file": "y.png"}]"#,
    )
    .unwrap();
    assert_eq!(layers[0], Layer::Unknown);
    assert_eq!(layers[0].file(), None);
    assert_eq!(layers[1].file(), Some("y.png"));
}

#[test]
fn image_layer_without_file_still_parses() {
    let layers = parse_layers(r#"[{"type": "image/image", "x": 3}]"#).unwrap();
    let Layer::Image(image) = &layers[0] else {
        panic!("expected image layer");
    };
    assert_eq!(image.file, None);
    assert_eq!(image.offset(), Offset::new(3, 0));
}

#[test]
fn text_requires_text() {
    let err = parse_layers(r#"{"type": "image/text", "color": "red"}"#).unwrap_err();
    assert!(matches!(err, LayercompError::Serde(_)));
}

#[test]
fn point_size_accepts_numbers_and_strings() {
    let layers = parse_layers(
        r#"[
            {"type": "text", "text": "a", "pointSize": "50%"},
            {"type": "text", "text": "b", "pointsize": "18"},
            {"type": "text", "text": "c", "pointsize": 12.9}
        ]"#,
    )
    .unwrap();
    let sizes: Vec<_> = layers
        .iter()
        .map(|l| match l {
            Layer::Text(t) => t.pointsize,
            _ => None,
        })
        .collect();
    assert_eq!(
        sizes,
        vec![
            Some(PointSize::Percent(50)),
            Some(PointSize::Points(18.0)),
            Some(PointSize::Points(12.9))
        ]
    );
}

#[test]
fn percent_point_size_resolves_against_canvas_height() {
    assert_eq!(PointSize::Percent(50).resolve(200), 100.0);
    assert_eq!(PointSize::Percent(33).resolve(100), 33.0);
    assert_eq!(PointSize::Percent(10).resolve(55), 5.0);
    assert_eq!(PointSize::Points(24.0).resolve(1000), 24.0);
    assert_eq!("50.5%".parse::<PointSize>().unwrap(), PointSize::Percent(50));
    assert!("big".parse::<PointSize>().is_err());
    assert!("%".parse::<PointSize>().is_err());
}

#[test]
fn gravity_is_case_insensitive() {
    assert_eq!("Center".parse::<Gravity>().unwrap(), Gravity::Center);
    assert_eq!("SOUTHEAST".parse::<Gravity>().unwrap(), Gravity::SouthEast);
    assert!("middle".parse::<Gravity>().is_err());
    assert_eq!("none".parse::<Gravity>().unwrap().as_str(), "none");
    assert_eq!("Forget".parse::<Gravity>().unwrap(), Gravity::Forget);

    let layers = parse_layers(r#"{"type": "text", "text": "t", "gravity": "NorthEast"}"#).unwrap();
    let Layer::Text(text) = &layers[0] else {
        panic!("expected text layer");
    };
    assert_eq!(text.gravity, Gravity::NorthEast);
}

#[test]
fn text_layer_serializes_with_mime_style_tags() {
    let mut text = TextLayer::new("Label");
    text.pointsize = Some(PointSize::Percent(25));
    let json = serde_json::to_value(Layer::Text(text)).unwrap();
    assert_eq!(json["type"], "image/text");
    assert_eq!(json["pointsize"], "25%");
    assert_eq!(json["gravity"], "northwest");
}

#[test]
fn options_require_both_dimensions() {
    assert!(ProcessingOptions::default().validate().is_ok());
    assert!(
        ProcessingOptions::default()
            .with_size(10, 20)
            .validate()
            .is_ok()
    );

    let lone = ProcessingOptions {
        width: Some(10),
        ..ProcessingOptions::default()
    };
    assert!(matches!(lone.validate(), Err(LayercompError::Validation(_))));
    assert_eq!(lone.explicit_canvas(), None);

    let zero = ProcessingOptions::default().with_size(0, 20);
    assert!(zero.validate().is_err());
}

#[test]
fn source_is_prepended_as_bottom_image() {
    let options = ProcessingOptions::default().with_source("base.png");
    let layers = options.effective_layers(vec![Layer::text("top")]);
    assert_eq!(layers, vec![Layer::image("base.png"), Layer::text("top")]);

    let untouched = ProcessingOptions::default().effective_layers(vec![Layer::text("top")]);
    assert_eq!(untouched, vec![Layer::text("top")]);
}

#[test]
fn layer_without_type_is_unknown() {
    let layers = parse_layers(r#"[{"text": "hi"}, {"type": "image/text", "text": "ok"}]"#).unwrap();
    assert_eq!(layers.len(), 2);
    assert_eq!(layers[0], Layer::Unknown);
    assert_eq!(layers[1], Layer::text("ok"));

    let single = parse_layers(r#"{"file": "a.png"}"#).unwrap();
    assert_eq!(single, vec![Layer::Unknown]);
}

#[test]
fn parse_errors_name_the_offending_layer() {
    let err = parse_layers(r#"[{"type": "image"}, {"type": "text", "x": 1}]"#).unwrap_err();
    let message = match err {
        LayercompError::Serde(message) => message,
        other => panic!("expected serde error, got {other}"),
    };
    assert!(message.starts_with("layer 1:"), "{message}");
    assert!(message.contains("text"), "{message}");

    assert!(parse_layers("[1]").is_err());
    assert!(parse_layers("\"text\"").is_err());
}

#[test]
fn fractional_point_size_is_kept_and_zero_is_dropped() {
    let layers = parse_layers(r#"{"type": "text", "text": "a", "pointsize": 12.5}"#).unwrap();
    let Layer::Text(text) = &layers[0] else {
        panic!("expected text layer");
    };
    assert_eq!(text.pointsize, Some(PointSize::Points(12.5)));
    assert_eq!(PointSize::Points(12.5).to_arg(100).as_deref(), Some("12.5"));
    assert_eq!(PointSize::Points(32.0).to_arg(100).as_deref(), Some("32"));
    assert_eq!(PointSize::Points(0.0).to_arg(100), None);
    assert_eq!(PointSize::Percent(1).to_arg(50), None);
}

#[test]
fn blank_image_file_counts_as_absent() {
    assert_eq!(Layer::image("").file(), None);
    assert_eq!(Layer::image("  ").file(), None);
    assert_eq!(Layer::image("a.png").file(), Some("a.png"));
}
