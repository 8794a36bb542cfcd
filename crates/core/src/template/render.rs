//! Printable template rendering.

use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};

use super::regions::Template;

const GROUND: Rgb<u8> = Rgb([255, 255, 255]);
const BOUNDARY: Rgb<u8> = Rgb([60, 60, 60]);
const DIGIT: Rgb<u8> = Rgb([90, 90, 90]);

/// Render the printable outline image: white ground, region boundaries and
/// the region number placed near each region's interior.
pub fn render_template(template: &Template) -> RgbImage {
    let w = template.width;
    let h = template.height;
    let mut img = RgbImage::from_pixel(w, h, GROUND);

    for y in 0..h {
        for x in 0..w {
            let label = label_at(template, x, y);
            let boundary = (x > 0 && label_at(template, x - 1, y) != label)
                || (y > 0 && label_at(template, x, y - 1) != label);
            if boundary {
                img.put_pixel(x, y, BOUNDARY);
            }
        }
    }

    for region in &template.regions {
        if let Some((x, y)) = anchor_pixel(template, region.label) {
            draw_number(&mut img, region.label, x, y);
        }
    }

    img
}

/// Encode an image as PNG bytes.
pub fn encode_png(img: &RgbImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

fn label_at(template: &Template, x: u32, y: u32) -> u32 {
    template.labels[(y * template.width + x) as usize]
}

/// Region pixel closest to the region's center of mass. Regions are not
/// necessarily convex, so the raw centroid may fall outside the region.
fn anchor_pixel(template: &Template, label: u32) -> Option<(u32, u32)> {
    let mut sum_x = 0u64;
    let mut sum_y = 0u64;
    let mut count = 0u64;
    for y in 0..template.height {
        for x in 0..template.width {
            if label_at(template, x, y) == label {
                sum_x += x as u64;
                sum_y += y as u64;
                count += 1;
            }
        }
    }
    if count == 0 {
        return None;
    }
    let cx = (sum_x / count) as i64;
    let cy = (sum_y / count) as i64;

    let mut best: Option<(u32, u32)> = None;
    let mut best_dist = i64::MAX;
    for y in 0..template.height {
        for x in 0..template.width {
            if label_at(template, x, y) != label {
                continue;
            }
            let dx = x as i64 - cx;
            let dy = y as i64 - cy;
            let dist = dx * dx + dy * dy;
            if dist < best_dist {
                best_dist = dist;
                best = Some((x, y));
            }
        }
    }
    best
}

/// 3x5 digit glyphs, one bit per pixel, rows top to bottom.
const GLYPHS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111], // 0
    [0b010, 0b110, 0b010, 0b010, 0b111], // 1
    [0b111, 0b001, 0b111, 0b100, 0b111], // 2
    [0b111, 0b001, 0b111, 0b001, 0b111], // 3
    [0b101, 0b101, 0b111, 0b001, 0b001], // 4
    [0b111, 0b100, 0b111, 0b001, 0b111], // 5
    [0b111, 0b100, 0b111, 0b101, 0b111], // 6
    [0b111, 0b001, 0b001, 0b001, 0b001], // 7
    [0b111, 0b101, 0b111, 0b101, 0b111], // 8
    [0b111, 0b101, 0b111, 0b001, 0b111], // 9
];

const GLYPH_W: i64 = 3;
const GLYPH_H: i64 = 5;

/// Draw a number centered on (cx, cy), clamped to the image bounds.
fn draw_number(img: &mut RgbImage, number: u32, cx: u32, cy: u32) {
    let digits: Vec<usize> = number
        .to_string()
        .bytes()
        .map(|b| (b - b'0') as usize)
        .collect();
    let total_w = digits.len() as i64 * (GLYPH_W + 1) - 1;

    let left = (cx as i64 - total_w / 2)
        .clamp(0, (img.width() as i64 - total_w).max(0));
    let top = (cy as i64 - GLYPH_H / 2)
        .clamp(0, (img.height() as i64 - GLYPH_H).max(0));

    for (i, &digit) in digits.iter().enumerate() {
        let origin_x = left + i as i64 * (GLYPH_W + 1);
        for (row, bits) in GLYPHS[digit].iter().enumerate() {
            for col in 0..GLYPH_W {
                if bits & (1 << (GLYPH_W - 1 - col)) == 0 {
                    continue;
                }
                let x = origin_x + col;
                let y = top + row as i64;
                if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
                    img.put_pixel(x as u32, y as u32, DIGIT);
                }
            }
        }
    }
}
