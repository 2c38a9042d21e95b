use std::collections::HashMap;

use cardlayout::rendering::segment::Column;
use cardlayout::{
    migrate, segment, CondensedCardConfig, CondensedCardSectionInstance, DimensionValue, PositionConfig, SectionType,
    Segment,
};
use serde_json::json;

fn px(x: f64, y: f64, w: f64, h: f64) -> PositionConfig {
    PositionConfig {
        x: DimensionValue::pixels(x),
        y: DimensionValue::pixels(y),
        width: DimensionValue::pixels(w),
        height: DimensionValue::pixels(h),
        ..Default::default()
    }
}

#[test]
fn header_columns_footer_make_three_segments() {
    let mut cfg = CondensedCardConfig::default();
    cfg.sections = vec![
        CondensedCardSectionInstance::new("footer", SectionType::Contact, px(0.0, 400.0, 1080.0, 150.0)),
        CondensedCardSectionInstance::new("right", SectionType::Map, px(540.0, 200.0, 540.0, 180.0)),
        CondensedCardSectionInstance::new("header", SectionType::Header, px(0.0, 0.0, 1080.0, 180.0)),
        CondensedCardSectionInstance::new("left", SectionType::Bio, px(0.0, 200.0, 540.0, 180.0)),
    ];

    let layout = segment(&cfg);
    assert_eq!(layout.segments.len(), 3);

    match &layout.segments[0] {
        Segment::Full(s) => assert_eq!(s.id, "header"),
        other => panic!("expected full header, got {:?}", other),
    }
    match &layout.segments[1] {
        two @ Segment::TwoColumn { .. } => {
            let left: Vec<&str> = two.left().map(|s| s.id.as_str()).collect();
            let right: Vec<&str> = two.right().map(|s| s.id.as_str()).collect();
            assert_eq!(left, vec!["left"]);
            assert_eq!(right, vec!["right"]);
        }
        other => panic!("expected two columns, got {:?}", other),
    }
    match &layout.segments[2] {
        Segment::Full(s) => assert_eq!(s.id, "footer"),
        other => panic!("expected full footer, got {:?}", other),
    }
}

fn sample_configs() -> Vec<CondensedCardConfig> {
    let mut hand_built = CondensedCardConfig::default();
    hand_built.sections = vec![
        CondensedCardSectionInstance::new("a", SectionType::Bio, px(0.0, 500.0, 400.0, 100.0)),
        CondensedCardSectionInstance::new("b", SectionType::Map, px(700.0, 20.0, 300.0, 100.0)),
        CondensedCardSectionInstance::new("c", SectionType::Header, px(0.0, 300.0, 1080.0, 100.0)),
        CondensedCardSectionInstance::new("d", SectionType::Hours, px(10.0, 20.0, 300.0, 100.0)),
        CondensedCardSectionInstance::new("e", SectionType::Social, px(600.0, 700.0, 400.0, 100.0)),
    ];
    let mut hidden = CondensedCardSectionInstance::new("f", SectionType::Video, px(0.0, 900.0, 1080.0, 100.0));
    hidden.position.visible = false;
    hand_built.sections.push(hidden);

    vec![
        hand_built,
        migrate(&json!(["header", "bio", "contact"])),
        migrate(&json!({"sections": [
            {"type": "header", "row": 0},
            {"type": "bio", "row": 1, "column": "left"},
            {"type": "map", "row": 1, "column": "right"},
            {"type": "hours", "row": 2, "column": "left"},
            {"type": "contact", "row": 3}
        ]})),
        CondensedCardConfig::default(),
    ]
}

#[test]
fn every_visible_section_appears_exactly_once() {
    for cfg in sample_configs() {
        let layout = segment(&cfg);
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for s in layout.flatten() {
            *seen.entry(s.id.as_str()).or_default() += 1;
        }
        let visible: Vec<&str> = cfg.visible_sections().map(|s| s.id.as_str()).collect();
        assert_eq!(seen.len(), visible.len());
        for id in visible {
            assert_eq!(seen.get(id), Some(&1), "section {} missing or duplicated", id);
        }
        assert!(layout.segments.iter().all(|s| !s.sections().is_empty()));
    }
}

#[test]
fn concatenation_follows_vertical_order() {
    for cfg in sample_configs() {
        let layout = segment(&cfg);
        let flat: Vec<_> = layout.flatten().collect();
        for pair in flat.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            assert!(
                a.bx.top < b.bx.top || (a.bx.top == b.bx.top && a.id < b.id),
                "{} ({}) emitted before {} ({})",
                a.id,
                a.bx.top,
                b.id,
                b.bx.top
            );
        }
    }
}

#[test]
fn full_sections_always_stand_alone() {
    for cfg in sample_configs() {
        for seg in segment(&cfg).segments {
            match seg {
                Segment::Full(s) => assert_eq!(s.column, Column::Full),
                Segment::TwoColumn { sections } => assert!(sections.iter().all(|s| s.column != Column::Full)),
            }
        }
    }
}
