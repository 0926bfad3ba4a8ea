//! Debug image rendering.
//!
//! Draws header boxes and captured-value boxes onto a copy of the scanned
//! image so a person can check what was picked up and why.

use image::{Rgba, RgbaImage};

use crate::extract::{Annotation, AnnotationKind, PixelRect};

/// Color constants for debug rendering.
pub const COLOR_HEADER: Rgba<u8> = Rgba([0, 255, 0, 255]); // Green
pub const COLOR_COLUMN_VALUE: Rgba<u8> = Rgba([0, 0, 255, 255]); // Blue
pub const COLOR_PATTERN_VALUE: Rgba<u8> = Rgba([255, 128, 0, 255]); // Orange

pub const HEADER_THICKNESS: u32 = 3;
pub const VALUE_THICKNESS: u32 = 2;

/// Color and border thickness for each annotation kind.
pub fn style(kind: AnnotationKind) -> (Rgba<u8>, u32) {
    match kind {
        AnnotationKind::Header => (COLOR_HEADER, HEADER_THICKNESS),
        AnnotationKind::ColumnValue => (COLOR_COLUMN_VALUE, VALUE_THICKNESS),
        AnnotationKind::PatternValue => (COLOR_PATTERN_VALUE, VALUE_THICKNESS),
    }
}

pub const CAPTION_TEXT: Rgba<u8> = Rgba([0, 0, 0, 255]);
const HEADER_CAPTION: &str = "HEADER";
const GLYPH_W: i64 = 3;
const GLYPH_H: i64 = 5;
const CAPTION_SCALE: i64 = 2;
const CAPTION_PAD: i64 = 2;

/// Draws every annotation in order; later boxes paint over earlier ones.
/// Header boxes also get a caption tab.
pub fn render_annotations(img: &mut RgbaImage, annotations: &[Annotation]) {
    for annotation in annotations {
        let (color, thickness) = style(annotation.kind);
        draw_rect(img, &annotation.rect, color, thickness);
        if annotation.kind == AnnotationKind::Header {
            draw_caption(img, &annotation.rect, HEADER_CAPTION, color);
        }
    }
}

/// Clips `rect` to the image. `None` when nothing of it is visible.
fn clip(img: &RgbaImage, rect: &PixelRect) -> Option<PixelRect> {
    let (img_w, img_h) = img.dimensions();
    if img_w == 0 || img_h == 0 {
        return None;
    }
    let (max_x, max_y) = (img_w as i64 - 1, img_h as i64 - 1);
    if rect.x1 < 0 || rect.y1 < 0 || rect.x0 > max_x || rect.y0 > max_y {
        return None;
    }
    Some(PixelRect {
        x0: rect.x0.max(0),
        y0: rect.y0.max(0),
        x1: rect.x1.min(max_x),
        y1: rect.y1.min(max_y),
    })
}

/// Draws a rectangle border on an image, clipped to the image bounds.
///
/// Edges lying outside the image are not drawn. Work is bounded by the image
/// size, whatever the rectangle's coordinates.
pub fn draw_rect(img: &mut RgbaImage, rect: &PixelRect, color: Rgba<u8>, thickness: u32) {
    let Some(visible) = clip(img, rect) else {
        return;
    };
    let (img_w, img_h) = img.dimensions();
    let t = (thickness as i64).min(img_w.max(img_h) as i64);

    let mut put = |x: i64, y: i64| {
        if x >= 0 && y >= 0 && (x as u64) < img_w as u64 && (y as u64) < img_h as u64 {
            img.put_pixel(x as u32, y as u32, color);
        }
    };

    for d in 0..t {
        // Top and bottom edges
        for x in visible.x0..=visible.x1 {
            put(x, rect.y0.saturating_add(d));
            put(x, rect.y1.saturating_sub(d));
        }
        // Left and right edges
        for y in visible.y0..=visible.y1 {
            put(rect.x0.saturating_add(d), y);
            put(rect.x1.saturating_sub(d), y);
        }
    }
}

/// Fills a rectangle, clipped to the image bounds.
pub fn fill_rect(img: &mut RgbaImage, rect: &PixelRect, color: Rgba<u8>) {
    let Some(visible) = clip(img, rect) else {
        return;
    };
    for y in visible.y0..=visible.y1 {
        for x in visible.x0..=visible.x1 {
            img.put_pixel(x as u32, y as u32, color);
        }
    }
}

/// 3x5 bitmaps for the caption letters, one row per entry, MSB on the left.
fn glyph(c: char) -> Option<[u8; 5]> {
    match c {
        'A' => Some([0b010, 0b101, 0b111, 0b101, 0b101]),
        'D' => Some([0b110, 0b101, 0b101, 0b101, 0b110]),
        'E' => Some([0b111, 0b100, 0b110, 0b100, 0b111]),
        'H' => Some([0b101, 0b101, 0b111, 0b101, 0b101]),
        'R' => Some([0b110, 0b101, 0b110, 0b101, 0b101]),
        _ => None,
    }
}

/// Draws `text` on a filled tab sitting on the box's top-left corner.
///
/// The tab goes above the box, or inside it when the box touches the top
/// of the image. Characters without a glyph are left blank.
pub fn draw_caption(img: &mut RgbaImage, rect: &PixelRect, text: &str, color: Rgba<u8>) {
    let advance = (GLYPH_W + 1) * CAPTION_SCALE;
    let chars = text.chars().count() as i64;
    let tab_w = chars * advance - CAPTION_SCALE + 2 * CAPTION_PAD;
    let tab_h = GLYPH_H * CAPTION_SCALE + 2 * CAPTION_PAD;

    let top = if rect.y0 >= tab_h { rect.y0 - tab_h } else { rect.y0 };
    let tab = PixelRect {
        x0: rect.x0,
        y0: top,
        x1: rect.x0.saturating_add(tab_w - 1),
        y1: top.saturating_add(tab_h - 1),
    };
    if clip(img, &tab).is_none() {
        return;
    }
    fill_rect(img, &tab, color);

    for (i, c) in text.chars().enumerate() {
        let Some(rows) = glyph(c) else {
            continue;
        };
        let origin_x = tab.x0.saturating_add(CAPTION_PAD + i as i64 * advance);
        let origin_y = tab.y0 + CAPTION_PAD;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_W {
                if bits & (1 << (GLYPH_W - 1 - col)) == 0 {
                    continue;
                }
                let x = origin_x.saturating_add(col * CAPTION_SCALE);
                let y = origin_y + row as i64 * CAPTION_SCALE;
                let dot = PixelRect {
                    x0: x,
                    y0: y,
                    x1: x.saturating_add(CAPTION_SCALE - 1),
                    y1: y + CAPTION_SCALE - 1,
                };
                fill_rect(img, &dot, CAPTION_TEXT);
            }
        }
    }
}
