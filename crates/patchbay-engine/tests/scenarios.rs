//! End-to-end behaviour of the public API.

use patchbay_engine::{
    Area, AtomKind, AtomBox, CanvasHeader, Edge, LogRangePolicy, Node, Object, PatchBuilder,
    PatchError, Point, Settings, decode_json, encode_json, from_xml_tag, layout, parse,
    to_xml_tag,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

#[test]
fn oscillator_patch_parses_and_survives_json() {
    // Given the smallest useful patch
    let source = "#N canvas 0 0 450 300 10; #X obj 10 10 osc~ 440; #X obj 10 50 dac~; #X connect 0 0 1 0;";
    let settings = Settings::default();

    // When it is parsed
    let patch = parse(source, &settings).unwrap();

    // Then there is one canvas with two objects and one edge 0 -> 1
    assert_eq!(patch.canvases.len(), 1);
    let root = &patch.canvases[0];
    assert_eq!(root.header, CanvasHeader::Root { font: 10.0 });
    assert_eq!(root.nodes.len(), 2);
    assert_eq!(root.nodes[0].label(), "osc~ 440");
    assert_eq!(root.nodes[1].label(), "dac~");
    assert_eq!(root.edges, vec![Edge::new(0, 0, 1, 0)]);

    // And the JSON round trip reproduces it
    let back = decode_json(&encode_json(&patch).unwrap(), &settings).unwrap();
    assert_eq!(back, patch);
}

#[test]
fn connection_past_the_last_node_is_dangling() {
    let source = "#N canvas 0 0 450 300 10;\n#X obj 10 10 osc~ 440;\n#X obj 10 50 dac~;\n#X connect 0 0 5 0;\n";

    let error = parse(source, &Settings::default()).unwrap_err();

    match error {
        PatchError::DanglingEdge {
            statement,
            canvas,
            from,
            to,
            len,
        } => {
            assert_eq!(statement, Some(3));
            assert_eq!(canvas, 0);
            assert_eq!((from, to, len), (0, 5, 2));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn number_box_with_inverted_range_is_rejected() {
    let source = "#N canvas 0 50 450 300 12;\n#X obj 10 10 nbx 5 14 10 0 0 0 empty empty empty 0 -8 0 10 #fcfcfc #000000 #000000 0 256;\n";

    let error = parse(source, &Settings::default()).unwrap_err();

    assert!(
        matches!(
            error,
            PatchError::Argument {
                statement: Some(1),
                ..
            }
        ),
        "{error}"
    );
}

#[test]
fn scalar_body_an_empty_element_cannot_take_is_rejected() {
    // Given an array of elements whose template has no fields
    let source = "#N struct e;\n#N struct a array x e;\n#N canvas 0 50 450 300 12;\n#X scalar a foo;\n";

    // When parsing, then it fails on the scalar statement rather than looping
    let error = parse(source, &Settings::default()).unwrap_err();

    assert!(
        matches!(
            error,
            PatchError::Argument {
                statement: Some(3),
                ..
            }
        ),
        "{error}"
    );
}

#[rstest]
#[case(LogRangePolicy::Strict, false)]
#[case(LogRangePolicy::AllowInverted, true)]
fn inverted_log_slider_follows_the_policy(#[case] policy: LogRangePolicy, #[case] accepted: bool) {
    let source = "#N canvas 0 50 450 300 12;\n#X obj 10 10 hsl 128 15 1000 1 1 0 empty empty empty -2 -8 0 10 #fcfcfc #000000 #000000 0 1;\n";
    let settings = Settings {
        log_range: policy,
        ..Settings::default()
    };

    assert_eq!(parse(source, &settings).is_ok(), accepted);
}

#[test]
fn auto_placed_boxes_never_overlap() {
    // Given a builder and thirty boxes without positions
    let settings = Settings::default();
    let mut builder = PatchBuilder::new("grid", &settings);
    builder.open_root(None, None).unwrap();
    for i in 0..30 {
        let class_name = if i % 3 == 0 { "metro" } else { "receive~" };
        builder
            .add_object(Object::new(class_name, Vec::new()), None)
            .unwrap();
    }
    builder
        .add_atom_box(AtomBox::new(AtomKind::List), None)
        .unwrap();

    // When the patch is finished
    let patch = builder.finish().unwrap();

    // Then no two boxes share any area
    let root = &patch.canvases[0];
    let font = 12.0;
    let areas: Vec<Area> = root
        .nodes
        .iter()
        .map(|node: &Node| {
            let origin = node.position().unwrap();
            Area::from_origin(origin, layout::extent(node, font, &settings.layout))
        })
        .collect();
    for (i, a) in areas.iter().enumerate() {
        for b in &areas[i + 1..] {
            assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
        }
    }
    assert!(areas.iter().all(|a| a.a.x >= settings.layout.margin));
    assert_eq!(root.nodes[0].position(), Some(Point::new(10.0, 10.0)));
}

#[rstest]
#[case("osc~")]
#[case("*~")]
#[case(">=")]
#[case("list split")]
#[case("cyclone/comb~")]
#[case("my_canvas")]
#[case("_tilde")]
#[case("x_y_")]
#[case("ü")]
fn xml_tags_map_back_to_their_class(#[case] class_name: &str) {
    let tag = to_xml_tag(class_name).unwrap();

    assert_eq!(from_xml_tag(&tag).unwrap(), class_name);
}

#[test]
fn unknown_statement_names_its_keyword() {
    let error = parse(
        "#N canvas 0 50 450 300 12;\n#X frobnicate 1 2;\n",
        &Settings::default(),
    )
    .unwrap_err();

    assert!(
        matches!(&error, PatchError::UnrecognizedStatement { statement: 1, keyword } if keyword == "#X frobnicate"),
        "{error}"
    );
}

#[test]
fn unterminated_escape_is_a_malformed_line() {
    let error = parse("#N canvas 0 50 450 300 12;\n#X obj 1 1 f\\", &Settings::default()).unwrap_err();

    assert!(
        matches!(error, PatchError::MalformedLine { line: 2, .. }),
        "{error}"
    );
}
