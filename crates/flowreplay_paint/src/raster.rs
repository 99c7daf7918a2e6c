//! CPU rasterizer drawing straight into an RGBA8 buffer.

use crate::canvas::Canvas;
use crate::color::Color;
use crate::primitives::{Point, Rect};
#[cfg(feature = "text")]
use crate::text::GlyphCache;

/// A canvas over a borrowed, row-major RGBA8 pixel buffer.
pub struct RasterCanvas<'a> {
    data: &'a mut [u8],
    width: u32,
    height: u32,
    #[cfg(feature = "text")]
    glyphs: Option<&'a mut GlyphCache>,
}

impl<'a> RasterCanvas<'a> {
    /// Wrap a buffer of exactly `width * height * 4` bytes.
    ///
    /// Returns `None` when the buffer length does not match.
    pub fn new(data: &'a mut [u8], width: u32, height: u32) -> Option<Self> {
        if data.len() != width as usize * height as usize * 4 {
            return None;
        }
        Some(Self {
            data,
            width,
            height,
            #[cfg(feature = "text")]
            glyphs: None,
        })
    }

    /// Enable text rendering with the given glyph cache.
    #[cfg(feature = "text")]
    pub fn with_glyphs(mut self, glyphs: Option<&'a mut GlyphCache>) -> Self {
        self.glyphs = glyphs;
        self
    }

    fn blend(&mut self, x: i64, y: i64, color: Color, coverage: f32) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        color.blend_over(&mut self.data[idx..idx + 4], coverage);
    }

    /// Visit every pixel center in the (clipped) bounding box.
    fn for_each_in_bounds(
        &mut self,
        min: Point,
        max: Point,
        mut coverage: impl FnMut(Point) -> f32,
        color: Color,
    ) {
        let x0 = (min.x.floor() as i64).max(0);
        let y0 = (min.y.floor() as i64).max(0);
        let x1 = (max.x.ceil() as i64).min(self.width as i64 - 1);
        let y1 = (max.y.ceil() as i64).min(self.height as i64 - 1);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let c = coverage(Point::new(x as f32, y as f32));
                if c > 0.0 {
                    self.blend(x, y, color, c);
                }
            }
        }
    }
}

/// One-pixel linear falloff at a shape edge.
fn edge_coverage(signed_distance: f32) -> f32 {
    (0.5 - signed_distance).clamp(0.0, 1.0)
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f32 {
    let abx = b.x - a.x;
    let aby = b.y - a.y;
    let len_sq = abx * abx + aby * aby;
    if len_sq == 0.0 {
        return p.distance_to(a);
    }
    let t = (((p.x - a.x) * abx + (p.y - a.y) * aby) / len_sq).clamp(0.0, 1.0);
    p.distance_to(Point::new(a.x + t * abx, a.y + t * aby))
}

impl Canvas for RasterCanvas<'_> {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn fill_circle(&mut self, center: Point, radius: f32, color: Color) {
        let r = radius.max(0.5);
        let min = Point::new(center.x - r - 1.0, center.y - r - 1.0);
        let max = Point::new(center.x + r + 1.0, center.y + r + 1.0);
        self.for_each_in_bounds(
            min,
            max,
            |p| edge_coverage(p.distance_to(center) - r),
            color,
        );
    }

    fn stroke_circle(&mut self, center: Point, radius: f32, color: Color, width: f32) {
        let half = width.max(1.0) / 2.0;
        let outer = radius + half;
        let min = Point::new(center.x - outer - 1.0, center.y - outer - 1.0);
        let max = Point::new(center.x + outer + 1.0, center.y + outer + 1.0);
        self.for_each_in_bounds(
            min,
            max,
            |p| edge_coverage((p.distance_to(center) - radius).abs() - half),
            color,
        );
    }

    fn line(&mut self, from: Point, to: Point, color: Color, width: f32) {
        let half = width.max(1.0) / 2.0;
        let min = Point::new(from.x.min(to.x) - half - 1.0, from.y.min(to.y) - half - 1.0);
        let max = Point::new(from.x.max(to.x) + half + 1.0, from.y.max(to.y) + half + 1.0);
        self.for_each_in_bounds(
            min,
            max,
            |p| edge_coverage(distance_to_segment(p, from, to) - half),
            color,
        );
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let x0 = (rect.x.round() as i64).max(0);
        let y0 = (rect.y.round() as i64).max(0);
        let x1 = ((rect.x + rect.width).round() as i64).min(self.width as i64 - 1);
        let y1 = ((rect.y + rect.height).round() as i64).min(self.height as i64 - 1);
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.blend(x, y, color, 1.0);
            }
        }
    }

    #[cfg(feature = "text")]
    fn text(&mut self, text: &str, origin: Point, size: f32, color: Color) {
        let Some(glyphs) = self.glyphs.take() else {
            tracing::trace!(text, "No font available, skipping text");
            return;
        };

        let mut pen_x = origin.x;
        let baseline = origin.y.round() as i64;
        for ch in text.chars() {
            let Some(glyph) = glyphs.glyph(ch, size) else {
                continue;
            };
            let left = pen_x.round() as i64 + glyph.bearing_x as i64;
            let top = baseline - glyph.bearing_y as i64;
            for row in 0..glyph.height as usize {
                for col in 0..glyph.width as usize {
                    let alpha = glyph.bitmap[row * glyph.width as usize + col];
                    if alpha > 0 {
                        self.blend(
                            left + col as i64,
                            top + row as i64,
                            color,
                            alpha as f32 / 255.0,
                        );
                    }
                }
            }
            pen_x += glyph.advance;
        }

        self.glyphs = Some(glyphs);
    }

    #[cfg(not(feature = "text"))]
    fn text(&mut self, text: &str, _origin: Point, _size: f32, _color: Color) {
        tracing::trace!(text, "Text feature disabled, skipping text");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white(width: u32, height: u32) -> Vec<u8> {
        vec![255; (width * height * 4) as usize]
    }

    fn pixel(data: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y * width + x) * 4) as usize;
        [data[idx], data[idx + 1], data[idx + 2], data[idx + 3]]
    }

    #[test]
    fn rejects_mismatched_buffer() {
        let mut data = vec![0u8; 10];
        assert!(RasterCanvas::new(&mut data, 4, 4).is_none());
    }

    #[test]
    fn fill_circle_paints_center_only() {
        let mut data = white(40, 40);
        {
            let mut canvas = RasterCanvas::new(&mut data, 40, 40).unwrap();
            canvas.fill_circle(Point::new(20.0, 20.0), 5.0, Color::RED);
        }
        assert_eq!(pixel(&data, 40, 20, 20), [255, 0, 0, 255]);
        assert_eq!(pixel(&data, 40, 0, 0), [255, 255, 255, 255]);
    }

    #[test]
    fn stroke_circle_leaves_center_untouched() {
        let mut data = white(40, 40);
        {
            let mut canvas = RasterCanvas::new(&mut data, 40, 40).unwrap();
            canvas.stroke_circle(Point::new(20.0, 20.0), 10.0, Color::BLACK, 2.0);
        }
        assert_eq!(pixel(&data, 40, 20, 20), [255, 255, 255, 255]);
        assert_eq!(pixel(&data, 40, 30, 20), [0, 0, 0, 255]);
    }

    #[test]
    fn line_covers_its_endpoints() {
        let mut data = white(20, 20);
        {
            let mut canvas = RasterCanvas::new(&mut data, 20, 20).unwrap();
            canvas.line(Point::new(2.0, 2.0), Point::new(12.0, 12.0), Color::BLUE, 2.0);
        }
        assert_eq!(pixel(&data, 20, 2, 2), [0, 0, 255, 255]);
        assert_eq!(pixel(&data, 20, 7, 7), [0, 0, 255, 255]);
        assert_eq!(pixel(&data, 20, 18, 2), [255, 255, 255, 255]);
    }

    #[test]
    fn shapes_at_the_edge_do_not_panic() {
        let mut data = white(8, 8);
        let mut canvas = RasterCanvas::new(&mut data, 8, 8).unwrap();
        canvas.fill_circle(Point::new(7.0, 7.0), 15.0, Color::RED);
        canvas.line(Point::new(0.0, 0.0), Point::new(7.0, 7.0), Color::RED, 4.0);
        canvas.fill_rect(Rect::new(0.0, 0.0, 7.0, 7.0), Color::BLACK.with_alpha(0.3));
        canvas.text("CLICK", Point::new(7.0, 7.0), 14.0, Color::RED);
    }

    #[test]
    fn translucent_rect_blends() {
        let mut data = white(10, 10);
        {
            let mut canvas = RasterCanvas::new(&mut data, 10, 10).unwrap();
            canvas.fill_rect(Rect::new(0.0, 0.0, 4.0, 4.0), Color::BLACK.with_alpha(0.3));
        }
        let blended = pixel(&data, 10, 2, 2);
        assert!((177..=180).contains(&blended[0]), "got {blended:?}");
        assert_eq!(blended[3], 255);
        assert_eq!(pixel(&data, 10, 8, 8), [255, 255, 255, 255]);
    }
}
