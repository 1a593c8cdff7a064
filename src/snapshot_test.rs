#![allow(clippy::float_cmp)]

use super::*;
use crate::camera::Point;
use crate::item::{Shape, StampKind, TextAlign};

fn defaults() -> Defaults {
    Defaults::default()
}

#[test]
fn parses_every_item_type() {
    let raw = r##"{"items":[
        {"it":"anchor","ix":10,"iy":20},
        {"it":"belay","ix":5,"iy":5,"st":"B1","ic":"#ff0000"},
        {"it":"line","lp":[{"x":0,"y":0},{"x":10,"y":0}],"lon":5,"lof":3,"lc":true},
        {"it":"text","ix":1,"iy":2,"tt":"5.10a","ta":"c","tbg":true}
    ]}"##;
    let items = parse(raw, &defaults()).unwrap();
    assert_eq!(items.len(), 4);

    match &items[0].shape {
        Shape::Stamp(s) => {
            assert_eq!(s.kind, StampKind::Anchor);
            assert_eq!(s.position, Point::new(10.0, 20.0));
            assert_eq!((s.width, s.height), (10.0, 10.0));
        }
        _ => panic!("expected stamp"),
    }
    assert_eq!(items[1].style.color, "#ff0000");
    assert_eq!(items[1].text_content(), Some("B1"));
    let line = items[2].as_line().unwrap();
    assert_eq!((line.on_length, line.off_length), (5.0, 3.0));
    assert!(line.curved());
    match &items[3].shape {
        Shape::Text(t) => {
            assert_eq!(t.align, TextAlign::Center);
            assert!(t.background);
        }
        _ => panic!("expected text"),
    }
}

#[test]
fn missing_fields_use_defaults() {
    let items = parse(r#"{"items":[{"it":"piton"}]}"#, &defaults()).unwrap();
    assert_eq!(items[0].style.color, "#ffff00");
    assert_eq!(items[0].style.line_width, 3.0);
}

#[test]
fn bad_entries_are_skipped() {
    let raw = r#"{"items":[
        {"it":"spaceship"},
        {"ix":3},
        {"it":"anchor","ix":"ten"},
        {"it":"line","lp":[{"x":0,"y":0}]},
        {"it":"text","tt":"   "},
        {"it":"rappel"}
    ]}"#;
    let items = parse(raw, &defaults()).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].item_type(), ItemType::Rappel);
}

#[test]
fn top_level_garbage_is_invalid() {
    assert!(matches!(parse("not json", &defaults()), Err(SnapshotError::InvalidData)));
    assert!(matches!(parse("[1,2]", &defaults()), Err(SnapshotError::InvalidData)));
    assert!(matches!(parse(r#"{"items":3}"#, &defaults()), Err(SnapshotError::InvalidData)));
    assert_eq!(SnapshotError::InvalidData.to_string(), "invalid data");
}

#[test]
fn saved_document_reloads_to_same_fields() {
    let raw = r##"{"items":[
        {"it":"belay","ix":5,"iy":6,"st":"P2","is":2,"ia":0.5,"iw":4,"ic":"#00ff00"},
        {"it":"line","lp":[{"x":0,"y":0},{"x":10,"y":5},{"x":20,"y":0}],"lc":true},
        {"it":"text","ix":1,"iy":2,"tt":"crux\nbolt","ta":"r"}
    ]}"##;
    let items = parse(raw, &defaults()).unwrap();
    let saved = to_json(&items).unwrap();
    let reloaded = parse(&saved, &defaults()).unwrap();

    assert_eq!(items.len(), reloaded.len());
    for (a, b) in items.iter().zip(&reloaded) {
        assert_eq!(a.serialize(), b.serialize());
        assert_ne!(a.id, b.id);
    }
}

#[test]
fn saved_document_uses_short_keys() {
    let items = parse(r#"{"items":[{"it":"anchor","ix":1,"iy":2}]}"#, &defaults()).unwrap();
    let saved: serde_json::Value = serde_json::from_str(&to_json(&items).unwrap()).unwrap();
    let entry = &saved["items"][0];
    assert_eq!(entry["it"], "anchor");
    assert_eq!(entry["ix"], 1.0);
    assert_eq!(entry["sw"], 10.0);
    assert!(entry.get("st").is_none());
    assert!(entry.get("id").is_none());
}
