//! The drawing surface consumed by overlay compositing.

use crate::color::Color;
use crate::primitives::{Point, Rect};

/// A drawing surface with a fixed pixel size.
///
/// Implementations are free to ignore parts of a shape that fall outside
/// the surface, but callers are expected to pass coordinates already
/// clamped into `[0, width-1] x [0, height-1]`.
pub trait Canvas {
    /// Surface size in pixels (width, height).
    fn size(&self) -> (u32, u32);

    fn fill_circle(&mut self, center: Point, radius: f32, color: Color);

    fn stroke_circle(&mut self, center: Point, radius: f32, color: Color, width: f32);

    fn line(&mut self, from: Point, to: Point, color: Color, width: f32);

    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Draw a single line of text with its baseline starting at `origin`.
    fn text(&mut self, text: &str, origin: Point, size: f32, color: Color);
}
