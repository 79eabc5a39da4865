use super::{Canvas, ViewRect};
use crate::detection::Point;
use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use anyhow::Result;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

/// Canvas drawing straight into an RGB frame.
///
/// Primitives falling partly or fully outside the frame are clipped. Text
/// uses the supplied font, or a small built-in bitmap font when there is
/// none.
pub struct RasterCanvas<'a> {
    image: &'a mut RgbImage,
    font: Option<&'a FontArc>,
}

/// Largest radius or distance from the frame handed to the rasterizer.
///
/// Keeps integer pixel arithmetic inside `i32` for any finite coordinate.
const MAX_EXTENT: f32 = 1.0e6;
const MAX_STROKE: f32 = 1000.0;
const MAX_GLYPH_SCALE: i32 = 256;

impl<'a> RasterCanvas<'a> {
    pub fn new(image: &'a mut RgbImage) -> Self {
        Self { image, font: None }
    }

    pub fn with_font(image: &'a mut RgbImage, font: &'a FontArc) -> Self {
        Self {
            image,
            font: Some(font),
        }
    }

    /// Whether text anchored at `origin` can reach the frame at all
    fn text_visible(&self, origin: Point, size: f32) -> bool {
        let (width, height) = self.size();
        origin.x <= width as f32 && origin.y + size >= 0.0 && origin.y - 2.0 * size <= height as f32
    }

    fn draw_bitmap_text(&mut self, text: &str, origin: Point, size: f32, color: Rgb<u8>) {
        let scale = ((size / 7.0).round() as i32).clamp(1, MAX_GLYPH_SCALE);
        let width = self.size().0 as i32;
        let top = pixel(origin.y) - 5 * scale;
        let mut left = pixel(origin.x);

        for c in text.chars() {
            if left >= width {
                break;
            }
            if let Some(rows) = glyph(c) {
                for (row, bits) in rows.iter().enumerate() {
                    for col in 0..3 {
                        if (bits >> (2 - col)) & 1 == 1 {
                            self.fill_block(
                                left + col * scale,
                                top + row as i32 * scale,
                                scale,
                                color,
                            );
                        }
                    }
                }
            }
            // 3 columns plus 1 of spacing
            left += 4 * scale;
        }
    }

    fn fill_block(&mut self, x: i32, y: i32, scale: i32, color: Rgb<u8>) {
        let (width, height) = self.image.dimensions();
        let xs = x.max(0)..(x + scale).min(width as i32);
        for py in y.max(0)..(y + scale).min(height as i32) {
            for px in xs.clone() {
                self.image.put_pixel(px as u32, py as u32, color);
            }
        }
    }
}

/// View coordinate to pixel, bounded to `MAX_EXTENT`
fn pixel(v: f32) -> i32 {
    v.clamp(-MAX_EXTENT, MAX_EXTENT).round() as i32
}

impl Canvas for RasterCanvas<'_> {
    fn draw_circle(&mut self, center: Point, radius: f32, color: Rgb<u8>) -> Result<()> {
        if !center.x.is_finite() || !center.y.is_finite() || radius.is_nan() {
            return Ok(());
        }
        let radius = radius.clamp(0.0, MAX_EXTENT);
        let (width, height) = self.size();
        if center.x + radius < 0.0
            || center.y + radius < 0.0
            || center.x - radius > width as f32
            || center.y - radius > height as f32
        {
            return Ok(());
        }

        draw_filled_circle_mut(
            &mut *self.image,
            (pixel(center.x), pixel(center.y)),
            radius.round() as i32,
            color,
        );
        Ok(())
    }

    fn draw_rect(&mut self, rect: ViewRect, stroke_width: f32, color: Rgb<u8>) -> Result<()> {
        let edges = [rect.left, rect.top, rect.right, rect.bottom];
        if edges.iter().any(|v| !v.is_finite())
            || rect.width().round() <= 0.0
            || rect.height().round() <= 0.0
        {
            return Ok(());
        }

        let stroke = (stroke_width.clamp(1.0, MAX_STROKE).round() as i32).max(1);
        let (width, height) = self.size();
        let (width, height) = (width as f32, height as f32);
        let pad = stroke as f32 + 1.0;
        if rect.right + pad < 0.0
            || rect.bottom + pad < 0.0
            || rect.left - pad > width
            || rect.top - pad > height
        {
            return Ok(());
        }

        // Edges far outside the frame are pulled in to just past it, where
        // they still draw nothing
        let left = rect.left.clamp(-pad, width + pad).round() as i32;
        let top = rect.top.clamp(-pad, height + pad).round() as i32;
        let right = rect.right.clamp(-pad, width + pad).round() as i32;
        let bottom = rect.bottom.clamp(-pad, height + pad).round() as i32;

        // Stroke straddles the edge: half inside, half outside
        let outer = stroke / 2;
        for inset in -outer..(stroke - outer) {
            let w = right - left - 2 * inset;
            let h = bottom - top - 2 * inset;
            if w <= 0 || h <= 0 {
                break;
            }
            let ring = Rect::at(left + inset, top + inset).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(&mut *self.image, ring, color);
        }
        Ok(())
    }

    fn draw_text(&mut self, text: &str, origin: Point, size: f32, color: Rgb<u8>) -> Result<()> {
        if !origin.x.is_finite() || !origin.y.is_finite() || !(size > 0.0) {
            return Ok(());
        }
        let size = size.min(MAX_EXTENT);
        if !self.text_visible(origin, size) {
            return Ok(());
        }
        match self.font {
            Some(font) => {
                let scale = PxScale::from(size);
                let ascent = font.as_scaled(scale).ascent();
                draw_text_mut(
                    &mut *self.image,
                    color,
                    pixel(origin.x),
                    pixel(origin.y - ascent),
                    scale,
                    font,
                    text,
                );
            }
            None => self.draw_bitmap_text(text, origin, size, color),
        }
        Ok(())
    }

    fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// 3x5 glyph rows, highest bit is the leftmost column
fn glyph(c: char) -> Option<[u8; 5]> {
    let rows = match c.to_ascii_uppercase() {
        '0' => [0x7, 0x5, 0x5, 0x5, 0x7],
        '1' => [0x2, 0x6, 0x2, 0x2, 0x7],
        '2' => [0x7, 0x1, 0x7, 0x4, 0x7],
        '3' => [0x7, 0x1, 0x7, 0x1, 0x7],
        '4' => [0x5, 0x5, 0x7, 0x1, 0x1],
        '5' => [0x7, 0x4, 0x7, 0x1, 0x7],
        '6' => [0x7, 0x4, 0x7, 0x5, 0x7],
        '7' => [0x7, 0x1, 0x2, 0x4, 0x4],
        '8' => [0x7, 0x5, 0x7, 0x5, 0x7],
        '9' => [0x7, 0x5, 0x7, 0x1, 0x7],
        ' ' => [0x0, 0x0, 0x0, 0x0, 0x0],
        ':' => [0x0, 0x2, 0x0, 0x2, 0x0],
        '.' => [0x0, 0x0, 0x0, 0x0, 0x2],
        '-' => [0x0, 0x0, 0x7, 0x0, 0x0],
        'A' => [0x2, 0x5, 0x7, 0x5, 0x5],
        'C' => [0x7, 0x4, 0x4, 0x4, 0x7],
        'D' => [0x6, 0x5, 0x5, 0x5, 0x6],
        'E' => [0x7, 0x4, 0x6, 0x4, 0x7],
        'F' => [0x7, 0x4, 0x6, 0x4, 0x4],
        'G' => [0x7, 0x4, 0x5, 0x5, 0x7],
        'H' => [0x5, 0x5, 0x7, 0x5, 0x5],
        'I' => [0x7, 0x2, 0x2, 0x2, 0x7],
        'L' => [0x4, 0x4, 0x4, 0x4, 0x7],
        'M' => [0x5, 0x7, 0x5, 0x5, 0x5],
        'N' => [0x6, 0x5, 0x5, 0x5, 0x5],
        'O' => [0x7, 0x5, 0x5, 0x5, 0x7],
        'P' => [0x7, 0x5, 0x7, 0x4, 0x4],
        'R' => [0x6, 0x5, 0x6, 0x5, 0x5],
        'S' => [0x3, 0x4, 0x2, 0x1, 0x6],
        'T' => [0x7, 0x2, 0x2, 0x2, 0x2],
        'Y' => [0x5, 0x5, 0x2, 0x2, 0x2],
        _ => return None,
    };
    Some(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
    const RED: Rgb<u8> = Rgb([255, 0, 0]);

    #[test]
    fn circle_fills_center() {
        let mut image = RgbImage::from_pixel(40, 40, BLACK);
        RasterCanvas::new(&mut image)
            .draw_circle(Point::new(20.0, 20.0), 7.0, RED)
            .unwrap();

        assert_eq!(*image.get_pixel(20, 20), RED);
        assert_eq!(*image.get_pixel(26, 20), RED);
        assert_eq!(*image.get_pixel(0, 0), BLACK);
    }

    #[test]
    fn offscreen_primitives_are_clipped() {
        let mut image = RgbImage::from_pixel(20, 20, BLACK);
        let mut canvas = RasterCanvas::new(&mut image);
        canvas.draw_circle(Point::new(-50.0, 500.0), 7.0, RED).unwrap();
        canvas.draw_circle(Point::new(f32::NAN, 5.0), 7.0, RED).unwrap();
        canvas
            .draw_rect(ViewRect::new(-100.0, -100.0, 300.0, 300.0), 5.0, RED)
            .unwrap();
        canvas
            .draw_text("id: 3", Point::new(-30.0, 200.0), 50.0, RED)
            .unwrap();

        assert!(image.pixels().all(|p| *p == BLACK));
    }

    #[test]
    fn rect_stroke_straddles_edge() {
        let mut image = RgbImage::from_pixel(60, 60, BLACK);
        RasterCanvas::new(&mut image)
            .draw_rect(ViewRect::new(10.0, 10.0, 50.0, 50.0), 5.0, RED)
            .unwrap();

        assert_eq!(*image.get_pixel(8, 30), RED);
        assert_eq!(*image.get_pixel(10, 30), RED);
        assert_eq!(*image.get_pixel(12, 30), RED);
        assert_eq!(*image.get_pixel(13, 30), BLACK);
        assert_eq!(*image.get_pixel(7, 30), BLACK);
        assert_eq!(*image.get_pixel(30, 30), BLACK);
    }

    #[test]
    fn degenerate_rect_is_ignored() {
        let mut image = RgbImage::from_pixel(20, 20, BLACK);
        RasterCanvas::new(&mut image)
            .draw_rect(ViewRect::new(10.0, 10.0, 10.0, 15.0), 5.0, RED)
            .unwrap();
        assert!(image.pixels().all(|p| *p == BLACK));
    }

    #[test]
    fn bitmap_text_sits_on_baseline() {
        let mut image = RgbImage::from_pixel(40, 20, BLACK);
        RasterCanvas::new(&mut image)
            .draw_text("1", Point::new(0.0, 10.0), 7.0, RED)
            .unwrap();

        // Scale 1: glyph occupies rows 5..10, "1" has its stem in column 1
        assert_eq!(*image.get_pixel(1, 5), RED);
        assert_eq!(*image.get_pixel(1, 9), RED);
        assert_eq!(*image.get_pixel(1, 10), BLACK);
        assert_eq!(*image.get_pixel(1, 4), BLACK);
    }
    #[test]
    fn far_off_coordinates_do_not_overflow() {
        let mut image = RgbImage::from_pixel(40, 40, BLACK);
        let mut canvas = RasterCanvas::new(&mut image);
        canvas
            .draw_rect(ViewRect::new(-1e10, 0.0, 1e10, 100.0), 5.0, RED)
            .unwrap();
        canvas.draw_circle(Point::new(20.0, -1e10), 7.0, RED).unwrap();
        canvas.draw_circle(Point::new(1e10, 1e10), 1e10, RED).unwrap();
        canvas
            .draw_text("smiling: 0.50", Point::new(-1e10, 20.0), 50.0, RED)
            .unwrap();
        canvas
            .draw_text("id: 7", Point::new(5.0, 1e10), 1e12, RED)
            .unwrap();

        // Only the top edge of the box is on the frame
        assert_eq!(*image.get_pixel(20, 0), RED);
        assert_eq!(*image.get_pixel(20, 2), RED);
        assert_eq!(*image.get_pixel(20, 3), BLACK);
        assert_eq!(*image.get_pixel(0, 20), BLACK);
        assert_eq!(*image.get_pixel(39, 20), BLACK);
    }

    #[test]
    fn truetype_text_sits_on_baseline() {
        let font = FontArc::try_from_slice(include_bytes!("../../assets/DejaVuSans.ttf")).unwrap();
        let ascent = font.as_scaled(PxScale::from(20.0)).ascent();
        let mut image = RgbImage::from_pixel(60, 60, BLACK);
        RasterCanvas::with_font(&mut image, &font)
            .draw_text("1", Point::new(10.0, 40.0), 20.0, RED)
            .unwrap();

        let inked: Vec<(u32, u32)> = image
            .enumerate_pixels()
            .filter(|(_, _, p)| **p != BLACK)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!inked.is_empty());

        let top = inked.iter().map(|(_, y)| *y).min().unwrap();
        let bottom = inked.iter().map(|(_, y)| *y).max().unwrap();
        let left = inked.iter().map(|(x, _)| *x).min().unwrap();
        // Digits rest on the baseline and stay below the ascent line
        assert!(bottom <= 41, "bottom {}", bottom);
        assert!(top as f32 >= (40.0 - ascent).floor() - 1.0, "top {}", top);
        assert!(top <= 30, "top {}", top);
        assert!(left >= 10, "left {}", left);
    }
}
