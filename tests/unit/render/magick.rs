use super::*;
use crate::layers::model::{Gravity, PointSize};

fn strings(args: Vec<OsString>) -> Vec<String> {
    args.into_iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

#[test]
fn blank_canvas_arguments() {
    let out = Path::new("/ws/temp.png");
    assert_eq!(
        strings(blank_args(out, Canvas::new(300, 200))),
        vec!["-size", "300x200", "xc:none", "/ws/temp.png"]
    );
}

#[test]
fn minimal_annotation_arguments() {
    let out = Path::new("/ws/temp.png");
    let layer = TextLayer::new("Label");
    assert_eq!(
        strings(annotate_args(out, Canvas::new(300, 200), &layer)),
        vec![
            "-gravity",
            "northwest",
            "-annotate",
            "+0+0",
            "Label",
            "-fill",
            "black",
            "/ws/temp.png",
            "/ws/temp.png",
        ]
    );
}

#[test]
fn full_annotation_arguments_resolve_percent_size() {
    let out = Path::new("/ws/temp.png");
    let layer = TextLayer {
        x: 10,
        y: 20,
        text: "Hello world".to_string(),
        color: "red".to_string(),
        font: Some("DejaVu-Sans".to_string()),
        pointsize: Some(PointSize::Percent(50)),
        gravity: Gravity::Center,
    };
    assert_eq!(
        strings(annotate_args(out, Canvas::new(400, 200), &layer)),
        vec![
            "-font",
            "DejaVu-Sans",
            "-pointsize",
            "100",
            "-gravity",
            "center",
            "-annotate",
            "+10+20",
            "Hello world",
            "-fill",
            "red",
            "/ws/temp.png",
            "/ws/temp.png",
        ]
    );
}

#[test]
fn absolute_point_size_is_passed_through_unchanged() {
    let out = Path::new("/ws/temp.png");
    let mut layer = TextLayer::new("t");
    layer.pointsize = Some(PointSize::Points(12.5));
    let args = strings(annotate_args(out, Canvas::new(100, 100), &layer));
    assert_eq!(&args[..2], ["-pointsize", "12.5"]);
}

#[test]
fn zero_point_size_omits_the_flag() {
    let out = Path::new("/ws/temp.png");
    let mut layer = TextLayer::new("t");
    layer.pointsize = Some(PointSize::Points(0.0));
    let args = strings(annotate_args(out, Canvas::new(100, 100), &layer));
    assert!(!args.iter().any(|a| a == "-pointsize"), "{args:?}");
    assert_eq!(args[0], "-gravity");
}

#[test]
fn overlay_arguments() {
    let out = Path::new("/ws/temp.png");
    assert_eq!(
        strings(overlay_args(out, Path::new("/img/logo.png"), Offset::new(5, 7))),
        vec![
            "-gravity",
            "center",
            "-geometry",
            "+5+7",
            "/img/logo.png",
            "/ws/temp.png",
            "/ws/temp.png",
        ]
    );
}

#[test]
fn operations_use_configured_programs() {
    let runner = crate::test_support::RecordingRunner::default();
    let opts = MagickOpts {
        convert: "magick-convert".to_string(),
        composite: "magick-composite".to_string(),
    };
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("temp.png");
    let magick = Magick::new(&opts, &runner);

    magick.create_blank(&out, Canvas::new(1, 1)).unwrap();
    magick
        .annotate(&out, Canvas::new(1, 1), &TextLayer::new("t"))
        .unwrap();
    magick
        .overlay(&out, Path::new("src.png"), Offset::default())
        .unwrap();

    let programs: Vec<_> = runner.calls().into_iter().map(|c| c.program).collect();
    assert_eq!(
        programs,
        vec!["magick-convert", "magick-convert", "magick-composite"]
    );
}
