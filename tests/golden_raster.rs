use std::fs;
use std::path::PathBuf;

use cardlayout::export::capture_blocking;
use cardlayout::rendering::paint::Rgba;
use cardlayout::rendering::raster::{decode_png, Bitmap};
use cardlayout::rendering::tree::{Backdrop, SectionNode};
use cardlayout::sections::ProfileData;
use cardlayout::{migrate, render, Element, LayoutTree, ResolvedBox, SectionType};
use serde_json::json;
use sha2::{Digest, Sha256};

fn golden_path(name: &str) -> PathBuf {
    let mut p = PathBuf::from("tests/goldens/expected");
    p.push(name);
    p
}

fn fixture() -> (cardlayout::CondensedCardConfig, ProfileData) {
    let config = migrate(&json!({
        "dimensions": {"preset": "custom", "width": 270, "height": 340},
        "styles": {
            "backgroundColor": "#f8fafc",
            "textColor": "#0f172a",
            "accentColor": "#2563eb",
            "gradient": {"angle": 180, "stops": [{"color": "#ffffff00", "offset": 0}, {"color": "#dbeafe", "offset": 1}]}
        },
        "sections": [
            {"id": "header", "sectionType": "header", "position": {"x": "0%", "y": "0%", "width": "100%", "height": "30%"}, "props": {"fontSize": 24}},
            {"id": "bio", "sectionType": "bio", "position": {"x": "0%", "y": "30%", "width": "50%", "height": "40%"}, "props": {"fontSize": 12, "backgroundColor": "#e2e8f0"}},
            {"id": "hours", "sectionType": "hours", "position": {"x": "50%", "y": "30%", "width": "50%", "height": "40%"}, "props": {"fontSize": 12}},
            {"id": "promo", "sectionType": "promotions", "position": {"x": "0%", "y": "70%", "width": "100%", "height": "30%"},
             "props": {"headline": "Spring open house", "body": "Saturday 10-2"}}
        ]
    }));
    let profile: ProfileData = serde_json::from_value(json!({
        "name": "Dana Reyes",
        "title": "Realtor",
        "bio": "Helping families find the right home for fifteen years.",
        "hours": [{"day": "Mon", "open": "9:00", "close": "17:00"}, {"day": "Sun"}]
    }))
    .expect("profile fixture");
    (config, profile)
}

/// Text-free tree: opaque and translucent fills, an unloaded image
/// placeholder and a nearest-neighbour scaled bitmap.
fn blocks() -> LayoutTree {
    let fill = |rect: ResolvedBox, color: &str| Element::Fill { rect, color: color.to_string() };
    let swatch = Bitmap {
        width: 2,
        height: 2,
        rgba: vec![220, 38, 38, 255, 22, 163, 74, 255, 37, 99, 235, 255, 250, 204, 21, 128],
    };
    let section = |id: &str, elements: Vec<Element>| SectionNode {
        id: id.to_string(),
        section_type: SectionType::Custom,
        bx: ResolvedBox::new(0.0, 0.0, 40.0, 30.0),
        elements,
    };
    LayoutTree {
        width: 40,
        height: 30,
        backdrop: Backdrop { color: "#f8fafc".into(), gradient: None },
        sections: vec![
            section("band", vec![fill(ResolvedBox::new(0.0, 0.0, 40.0, 9.3), "#2563eb")]),
            section("shade", vec![fill(ResolvedBox::new(5.2, 12.0, 20.0, 10.0), "#0f172a80")]),
            section(
                "media",
                vec![
                    Element::Image { rect: ResolvedBox::new(22.0, 14.0, 15.0, 12.0), src: "missing.png".into(), bitmap: None },
                    Element::Image { rect: ResolvedBox::new(2.0, 24.0, 6.0, 4.0), src: "swatch.png".into(), bitmap: Some(swatch) },
                ],
            ),
        ],
    }
}

#[test]
fn golden_blocks_raster_matches_digest() {
    let image = capture_blocking(&blocks(), 2.0).expect("capture");
    let bitmap = decode_png(&image.png_data).expect("decode");
    let digest = hex::encode(Sha256::digest(&bitmap.rgba));

    let expected_path = golden_path("card_blocks.rgba.sha256");
    if std::env::var("UPDATE_GOLDENS").is_ok() {
        fs::create_dir_all("tests/goldens/expected").ok();
        fs::write(&expected_path, format!("{}\n", digest)).expect("write golden");
        println!("Updated golden: {:?}", expected_path);
        return;
    }

    let expected = fs::read_to_string(&expected_path)
        .unwrap_or_else(|e| panic!("missing golden {:?} ({}); run with UPDATE_GOLDENS=1", expected_path, e));
    assert_eq!(digest, expected.trim());
}

#[test]
fn blocks_raster_pixels() {
    let bitmap = decode_png(&capture_blocking(&blocks(), 2.0).expect("capture").png_data).expect("decode");
    assert_eq!((bitmap.width, bitmap.height), (80, 60));

    // 9.3 * 2 rounds to a 19px band
    assert_eq!(bitmap.pixel(79, 18), Some(Rgba(0x25, 0x63, 0xeb, 255)));
    assert_eq!(bitmap.pixel(79, 19), Some(Rgba(0xf8, 0xfa, 0xfc, 255)));
    // half-alpha shade over the backdrop; 10.4 rounds to column 10
    assert_eq!(bitmap.pixel(10, 24), Some(Rgba(131, 136, 147, 255)));
    assert_eq!(bitmap.pixel(9, 24), Some(Rgba(0xf8, 0xfa, 0xfc, 255)));
    // placeholder fill and hatch stripe
    assert_eq!(bitmap.pixel(49, 43), Some(Rgba::PLACEHOLDER));
    assert_eq!(bitmap.pixel(44, 28), Some(Rgba::PLACEHOLDER_INK));
    // swatch quadrants, the translucent one blended over the backdrop
    assert_eq!(bitmap.pixel(4, 48), Some(Rgba(220, 38, 38, 255)));
    assert_eq!(bitmap.pixel(10, 49), Some(Rgba(22, 163, 74, 255)));
    assert_eq!(bitmap.pixel(15, 55), Some(Rgba(249, 227, 136, 255)));
}

#[test]
fn card_raster_has_expected_pixels() {
    let (config, profile) = fixture();
    let image = capture_blocking(&render(&config, &profile), 1.0).expect("capture");
    assert_eq!(hex::decode(&image.digest).map(|d| d.len()).ok(), Some(32));

    let bitmap = decode_png(&image.png_data).expect("decode");
    assert_eq!((bitmap.width, bitmap.height), (270, 340));

    // bio background fill, away from any text
    assert_eq!(bitmap.pixel(2, 230), Some(Rgba(0xe2, 0xe8, 0xf0, 255)));
    // every pixel is opaque: the backdrop covers the canvas
    assert!(bitmap.rgba.chunks_exact(4).all(|px| px[3] == 255));
}
