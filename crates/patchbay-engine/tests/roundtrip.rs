//! Every fixture patch must survive each representation unchanged.

use std::path::PathBuf;

use patchbay_engine::{
    Format, Settings, Snapshot, Translator, decode_json, decode_snapshot, decode_xml,
    encode_json, encode_native, encode_snapshot, encode_xml, parse,
};
use patchbay_syntax::{Word, split};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {e}", path.display()))
}

/// The statements of a native text as word lists, ignoring line breaks.
fn statements(text: &str) -> Vec<Vec<Word>> {
    split(text)
        .map(|binbuf| binbuf.unwrap().words)
        .collect()
}

#[rstest]
#[case("osc.pd")]
#[case("subpatch.pd")]
#[case("gui.pd")]
#[case("data.pd")]
#[case("messages.pd")]
fn native_text_survives_parse_and_emit(#[case] name: &str) {
    let source = fixture(name);

    let patch = parse(&source, &Settings::default()).unwrap();
    let emitted = encode_native(&patch).unwrap();

    assert_eq!(statements(&emitted), statements(&source));
}

#[rstest]
#[case("osc.pd")]
#[case("subpatch.pd")]
#[case("gui.pd")]
#[case("data.pd")]
#[case("messages.pd")]
fn json_and_xml_decode_to_the_same_patch(#[case] name: &str) {
    let settings = Settings::default();
    let patch = parse(&fixture(name), &settings).unwrap();

    let from_json = decode_json(&encode_json(&patch).unwrap(), &settings).unwrap();
    let from_xml = decode_xml(&encode_xml(&patch).unwrap(), &settings).unwrap();

    assert_eq!(from_json, patch);
    assert_eq!(from_xml, patch);
}

#[rstest]
#[case("subpatch.pd")]
#[case("gui.pd")]
#[case("data.pd")]
fn snapshots_decode_to_the_same_patch(#[case] name: &str) {
    let source = fixture(name);
    let patch = parse(&source, &Settings::default()).unwrap();

    let bytes = encode_snapshot(&Snapshot::new(source.as_bytes(), patch.clone())).unwrap();

    assert_eq!(decode_snapshot(&bytes).unwrap().patch, patch);
}

#[test]
fn native_through_every_format_and_back() {
    // Given a patch with subpatches, arrays and declarations
    let source = fixture("subpatch.pd");
    let translator = Translator::new(Settings::default());

    // When it is converted native -> xml -> json -> snapshot -> native
    let mut bytes = source.clone().into_bytes();
    let mut from = Format::Native;
    for to in [Format::Xml, Format::Json, Format::Snapshot, Format::Native] {
        bytes = translator.translate("subpatch", &bytes, from, to).unwrap().output;
        from = to;
    }

    // Then the native text has the same statements
    let text = String::from_utf8(bytes).unwrap();
    assert_eq!(statements(&text), statements(&source));
}
