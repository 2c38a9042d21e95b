//! Built-in section renderers

use super::props::{SectionProps, TextAlign};
use super::registry::{SectionContext, SectionRenderer};
use crate::config::model::{paint_order, CustomObject, SectionType};
use crate::rendering::layout::{line_height, section_padding, text_width, wrap_text, Stack};
use crate::rendering::position::ResolvedBox;
use crate::rendering::tree::Element;

fn content_area(ctx: &SectionContext<'_>) -> ResolvedBox {
    ctx.bx.inset(section_padding(&ctx.bx))
}

fn gap_for(font_size: f64) -> f64 {
    font_size * 0.4
}

pub struct HeaderRenderer;

impl SectionRenderer for HeaderRenderer {
    fn kind(&self) -> SectionType {
        SectionType::Header
    }

    fn render(&self, props: &SectionProps, ctx: &SectionContext<'_>) -> Vec<Element> {
        let SectionProps::Header(p) = props else { return Vec::new() };
        let area = content_area(ctx);
        let mut stack = Stack::new(area, gap_for(p.font_size));
        let mut out = Vec::new();

        if let (true, Some(avatar)) = (p.show_avatar, ctx.profile.avatar_url.as_ref()) {
            let size = (area.height * 0.5).min(area.width * 0.3);
            if let Some(row) = stack.block(size) {
                let left = match p.align {
                    TextAlign::Left => row.left,
                    TextAlign::Center => row.left + (row.width - size) / 2.0,
                    TextAlign::Right => row.right() - size,
                };
                out.push(Element::Image {
                    rect: ResolvedBox::new(left, row.top, size, size),
                    src: avatar.clone(),
                    bitmap: None,
                });
            }
        }

        let title = p.title_override.as_deref().unwrap_or(&ctx.profile.name);
        out.extend(stack.text(title, p.font_size, &ctx.styles.text_color, p.align, Some(2)));
        if let Some(subtitle) = p.subtitle.as_deref().or(ctx.profile.title.as_deref()) {
            out.extend(stack.text(subtitle, p.font_size * 0.5, &ctx.styles.accent_color, p.align, Some(1)));
        }
        out
    }
}

pub struct BioRenderer;

impl SectionRenderer for BioRenderer {
    fn kind(&self) -> SectionType {
        SectionType::Bio
    }

    fn render(&self, props: &SectionProps, ctx: &SectionContext<'_>) -> Vec<Element> {
        let SectionProps::Bio(p) = props else { return Vec::new() };
        let mut stack = Stack::new(content_area(ctx), gap_for(p.font_size));
        let mut out = Vec::new();
        if p.show_heading && !p.heading.is_empty() {
            out.extend(stack.text(&p.heading, p.font_size * 1.2, &ctx.styles.accent_color, TextAlign::Left, Some(1)));
        }
        out.extend(stack.text(
            &ctx.profile.bio,
            p.font_size,
            &ctx.styles.text_color,
            TextAlign::Left,
            Some(p.max_lines as usize),
        ));
        out
    }
}

pub struct ContactRenderer;

impl SectionRenderer for ContactRenderer {
    fn kind(&self) -> SectionType {
        SectionType::Contact
    }

    fn render(&self, props: &SectionProps, ctx: &SectionContext<'_>) -> Vec<Element> {
        let SectionProps::Contact(p) = props else { return Vec::new() };
        let profile = ctx.profile;
        let entries = [
            (p.show_phone, profile.phone.as_ref(), "tel:"),
            (p.show_email, profile.email.as_ref(), "mailto:"),
            (p.show_website, profile.website.as_ref(), ""),
        ];
        let mut stack = Stack::new(content_area(ctx), gap_for(p.font_size));
        let mut out = Vec::new();
        for (label, scheme) in entries
            .iter()
            .filter_map(|(shown, value, scheme)| if *shown { value.map(|v| (v, *scheme)) } else { None })
        {
            let Some(rect) = stack.block(line_height(p.font_size)) else { break };
            out.push(Element::Link {
                rect,
                label: label.clone(),
                href: format!("{}{}", scheme, label),
                font_size: p.font_size,
                color: ctx.styles.accent_color.clone(),
            });
        }
        out
    }
}

pub struct MapRenderer;

impl SectionRenderer for MapRenderer {
    fn kind(&self) -> SectionType {
        SectionType::Map
    }

    fn render(&self, props: &SectionProps, ctx: &SectionContext<'_>) -> Vec<Element> {
        let SectionProps::Map(p) = props else { return Vec::new() };
        let area = content_area(ctx);
        let Some(location) = ctx.profile.locations.get(p.location_index) else {
            return vec![Element::Placeholder { rect: area, label: "No location".to_string() }];
        };

        let address_font = 20.0;
        let address_h = if p.show_address { line_height(address_font) } else { 0.0 };
        let map_h = (area.height - address_h).max(0.0);
        let mut out = vec![Element::MapWidget {
            rect: ResolvedBox::new(area.left, area.top, area.width, map_h),
            location: location.clone(),
            zoom: p.zoom,
        }];
        if p.show_address && !location.address.is_empty() {
            let mut lines = wrap_text(&location.address, address_font, area.width);
            lines.truncate(1);
            out.push(Element::Text {
                rect: ResolvedBox::new(area.left, area.top + map_h, area.width, address_h),
                lines,
                font_size: address_font,
                color: ctx.styles.text_color.clone(),
                align: TextAlign::Left,
            });
        }
        out
    }
}

pub struct GalleryRenderer;

impl SectionRenderer for GalleryRenderer {
    fn kind(&self) -> SectionType {
        SectionType::Gallery
    }

    fn render(&self, props: &SectionProps, ctx: &SectionContext<'_>) -> Vec<Element> {
        let SectionProps::Gallery(p) = props else { return Vec::new() };
        let area = content_area(ctx);
        let columns = p.columns.max(1) as usize;
        let cell = ((area.width - p.gap * (columns as f64 - 1.0)) / columns as f64).max(0.0);
        if cell <= 0.0 {
            return Vec::new();
        }

        let mut out = Vec::new();
        for (i, image) in ctx.profile.gallery.iter().take(p.max_images as usize).enumerate() {
            let (row, col) = (i / columns, i % columns);
            let top = area.top + row as f64 * (cell + p.gap);
            if top + cell > area.bottom() {
                break;
            }
            out.push(Element::Image {
                rect: ResolvedBox::new(area.left + col as f64 * (cell + p.gap), top, cell, cell),
                src: image.url.clone(),
                bitmap: None,
            });
        }
        out
    }
}

pub struct PromotionsRenderer;

impl SectionRenderer for PromotionsRenderer {
    fn kind(&self) -> SectionType {
        SectionType::Promotions
    }

    fn render(&self, props: &SectionProps, ctx: &SectionContext<'_>) -> Vec<Element> {
        let SectionProps::Promotions(p) = props else { return Vec::new() };
        let area = content_area(ctx);
        let mut out = Vec::new();

        // accent bar down the left edge
        let bar = (area.width * 0.02).clamp(2.0, 8.0);
        out.push(Element::Fill {
            rect: ResolvedBox::new(area.left, area.top, bar, area.height),
            color: p.badge_color.clone().unwrap_or_else(|| ctx.styles.accent_color.clone()),
        });

        let text_area = ResolvedBox::new(area.left + bar * 3.0, area.top, (area.width - bar * 3.0).max(0.0), area.height);
        let mut stack = Stack::new(text_area, 12.0);
        out.extend(stack.text(&p.headline, 36.0, &ctx.styles.text_color, TextAlign::Left, Some(2)));
        out.extend(stack.text(&p.body, 22.0, &ctx.styles.text_color, TextAlign::Left, Some(4)));
        if let (Some(label), Some(url)) = (&p.cta_label, &p.cta_url) {
            if let Some(rect) = stack.block(line_height(24.0)) {
                out.push(Element::Link {
                    rect: ResolvedBox { width: text_width(label, 24.0).min(rect.width), ..rect },
                    label: label.clone(),
                    href: url.clone(),
                    font_size: 24.0,
                    color: ctx.styles.accent_color.clone(),
                });
            }
        }
        out
    }
}

pub struct HoursRenderer;

impl SectionRenderer for HoursRenderer {
    fn kind(&self) -> SectionType {
        SectionType::Hours
    }

    fn render(&self, props: &SectionProps, ctx: &SectionContext<'_>) -> Vec<Element> {
        let SectionProps::Hours(p) = props else { return Vec::new() };
        let mut stack = Stack::new(content_area(ctx), gap_for(p.font_size) * 0.5);
        let color = &ctx.styles.text_color;
        if p.compact {
            let joined = ctx.profile.hours.iter().map(|h| h.display()).collect::<Vec<_>>().join(" · ");
            return stack.text(&joined, p.font_size, color, TextAlign::Left, None).into_iter().collect();
        }
        ctx.profile
            .hours
            .iter()
            .map_while(|h| stack.text(&h.display(), p.font_size, color, TextAlign::Left, Some(1)))
            .collect()
    }
}

pub struct SocialRenderer;

impl SectionRenderer for SocialRenderer {
    fn kind(&self) -> SectionType {
        SectionType::Social
    }

    fn render(&self, props: &SectionProps, ctx: &SectionContext<'_>) -> Vec<Element> {
        let SectionProps::Social(p) = props else { return Vec::new() };
        let area = content_area(ctx);
        let step = p.icon_size + p.gap;
        let per_row = if step > 0.0 { (((area.width + p.gap) / step).floor() as usize).max(1) } else { 1 };

        let mut out = Vec::new();
        for (i, link) in ctx.profile.social.iter().enumerate() {
            let (row, col) = (i / per_row, i % per_row);
            let rect = ResolvedBox::new(
                area.left + col as f64 * step,
                area.top + row as f64 * step,
                p.icon_size,
                p.icon_size,
            );
            if rect.bottom() > area.bottom() {
                break;
            }
            out.push(Element::Link {
                rect,
                label: link.platform.chars().next().map(|c| c.to_uppercase().to_string()).unwrap_or_default(),
                href: link.url.clone(),
                font_size: p.icon_size * 0.5,
                color: ctx.styles.accent_color.clone(),
            });
        }
        out
    }
}

pub struct VideoRenderer;

impl SectionRenderer for VideoRenderer {
    fn kind(&self) -> SectionType {
        SectionType::Video
    }

    fn render(&self, props: &SectionProps, ctx: &SectionContext<'_>) -> Vec<Element> {
        let SectionProps::Video(p) = props else { return Vec::new() };
        let area = content_area(ctx);
        if p.url.is_empty() {
            return vec![Element::Placeholder { rect: area, label: "No video".to_string() }];
        }
        vec![Element::Video { rect: area, src: p.url.clone(), poster: p.poster_url.clone(), autoplay: p.autoplay }]
    }
}

/// Free layout: objects painted in `zIndex` order, offset by the section box
pub struct CustomRenderer;

impl SectionRenderer for CustomRenderer {
    fn kind(&self) -> SectionType {
        SectionType::Custom
    }

    fn render(&self, _props: &SectionProps, ctx: &SectionContext<'_>) -> Vec<Element> {
        paint_order(ctx.objects)
            .into_iter()
            .map(|object| {
                let f = object.frame();
                let rect = ResolvedBox::new(ctx.bx.left + f.x, ctx.bx.top + f.y, f.width.max(0.0), f.height.max(0.0));
                match object {
                    CustomObject::Text(t) => Element::Text {
                        rect,
                        lines: wrap_text(&t.text, t.font_size, rect.width),
                        font_size: t.font_size,
                        color: t.color.clone().unwrap_or_else(|| ctx.styles.text_color.clone()),
                        align: TextAlign::Left,
                    },
                    CustomObject::Image(i) => Element::Image { rect, src: i.src.clone(), bitmap: None },
                    CustomObject::Link(l) => Element::Link {
                        rect,
                        label: l.label.clone(),
                        href: l.href.clone(),
                        font_size: (rect.height / 1.3).min(32.0),
                        color: l.color.clone().unwrap_or_else(|| ctx.styles.accent_color.clone()),
                    },
                    CustomObject::Spacer(_) => Element::Spacer { rect },
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::default_styles;
    use crate::config::model::{ObjectFrame, SpacerObject, TextObject};
    use crate::sections::profile::{Location, ProfileData};

    fn ctx<'a>(profile: &'a ProfileData, styles: &'a crate::config::model::CondensedCardStyles, objects: &'a [CustomObject]) -> SectionContext<'a> {
        SectionContext { id: "s", bx: ResolvedBox::new(0.0, 100.0, 1080.0, 400.0), profile, styles, objects }
    }

    #[test]
    fn elements_stay_inside_the_section_box() {
        let profile = ProfileData {
            name: "Dana Reyes".into(),
            bio: "word ".repeat(400),
            avatar_url: Some("avatar.png".into()),
            gallery: (0..12).map(|i| crate::sections::GalleryImage { url: format!("{}.png", i), caption: None }).collect(),
            ..Default::default()
        };
        let styles = default_styles();
        let c = ctx(&profile, &styles, &[]);
        for kind in [SectionType::Header, SectionType::Bio, SectionType::Gallery] {
            let renderer = crate::sections::SectionRegistry::standard();
            let elements = renderer.get(kind).unwrap().render(&SectionProps::default_for(kind), &c);
            assert!(!elements.is_empty(), "{} rendered nothing", kind);
            for el in elements {
                let r = el.rect();
                assert!(r.top >= c.bx.top && r.bottom() <= c.bx.bottom() + 1e-9, "{:?} escapes {:?}", el, c.bx);
            }
        }
    }

    #[test]
    fn map_without_location_is_a_placeholder() {
        let profile = ProfileData::default();
        let styles = default_styles();
        let out = MapRenderer.render(&SectionProps::default_for(SectionType::Map), &ctx(&profile, &styles, &[]));
        assert!(matches!(out.as_slice(), [Element::Placeholder { .. }]));

        let profile = ProfileData {
            locations: vec![Location { label: "Office".into(), address: "1 Main St".into(), lat: 40.0, lng: -74.0 }],
            ..Default::default()
        };
        let out = MapRenderer.render(&SectionProps::default_for(SectionType::Map), &ctx(&profile, &styles, &[]));
        assert!(out[0].is_dynamic());
    }

    #[test]
    fn custom_objects_paint_by_z_index() {
        let text = |z: i32, s: &str| {
            CustomObject::Text(TextObject {
                frame: ObjectFrame { x: 10.0, y: 10.0, width: 300.0, height: 40.0, z_index: z },
                text: s.into(),
                font_size: 24.0,
                color: None,
            })
        };
        let objects = vec![
            text(2, "two"),
            text(0, "zero"),
            CustomObject::Spacer(SpacerObject { frame: ObjectFrame { x: 0.0, y: 0.0, width: 5.0, height: 5.0, z_index: 1 } }),
        ];
        let profile = ProfileData::default();
        let styles = default_styles();
        let out = CustomRenderer.render(&SectionProps::default_for(SectionType::Custom), &ctx(&profile, &styles, &objects));
        assert!(matches!(&out[0], Element::Text { lines, .. } if lines[0] == "zero"));
        assert!(matches!(&out[1], Element::Spacer { .. }));
        assert!(matches!(&out[2], Element::Text { lines, .. } if lines[0] == "two"));
        // frames are relative to the section box
        assert_eq!(out[0].rect().top, 110.0);
    }
}
