//! Overlay compositing for replay frames.
//!
//! Each captured viewport gets a fading cursor trail, a marker for the
//! active event and an information panel in the top-left corner. Drawing
//! goes through the [`Canvas`] trait so the same overlay can be rasterized
//! into a frame or recorded for inspection.

use flowreplay_paint::{Canvas, Color, GlyphCache, Point, RasterCanvas, Rect};
use flowreplay_recorder::{CapturedFrame, EventKind, RecordedEvent, TrailBuffer};

const PANEL: Rect = Rect::new(10.0, 10.0, 440.0, 90.0);
const PANEL_OPACITY: f32 = 0.3;
const TEXT_X: f32 = 15.0;

const ARROW_LENGTH: f32 = 21.2;
const ARROW_TIP_RATIO: f32 = 0.3;
const ARROW_WIDTH: f32 = 2.0;

/// The event active on a frame.
#[derive(Clone, Copy, Debug)]
pub struct ActiveEvent<'a> {
    /// Position in the session's sorted events.
    pub index: usize,
    pub event: &'a RecordedEvent,
    /// Event position after clamping into the page.
    pub position: (i64, i64),
}

/// Per-frame information shown by the overlay.
#[derive(Clone, Copy, Debug)]
pub struct OverlayInfo<'a> {
    /// Simulated replay time in seconds.
    pub time: f64,
    pub total_duration: f64,
    pub event_count: usize,
    pub active: Option<ActiveEvent<'a>>,
}

/// Rasterizes overlays onto captured frames.
pub struct FrameCompositor {
    glyphs: Option<GlyphCache>,
}

impl FrameCompositor {
    /// Create a compositor. With `text` set, a system font is loaded for
    /// the panel and captions; hosts without fonts get shapes only.
    pub fn new(text: bool) -> Self {
        let glyphs = if text { GlyphCache::system() } else { None };
        if text && glyphs.is_none() {
            tracing::warn!("No system font found, overlay text disabled");
        }
        Self { glyphs }
    }

    /// Composite the overlay onto `raw`.
    ///
    /// A missing or unusable capture is replaced by a white canvas; the
    /// result always has exactly `size`.
    pub fn compose(
        &mut self,
        raw: Option<CapturedFrame>,
        size: (u32, u32),
        trail: &TrailBuffer,
        info: &OverlayInfo<'_>,
    ) -> CapturedFrame {
        let (width, height) = size;
        let mut frame = match raw {
            Some(frame) if frame.is_usable() => frame.conform_to(width, height),
            _ => CapturedFrame::blank(width, height),
        };

        match RasterCanvas::new(&mut frame.data, width, height) {
            Some(canvas) => {
                let mut canvas = canvas.with_glyphs(self.glyphs.as_mut());
                paint_overlay(&mut canvas, trail, info);
            }
            None => tracing::warn!(width, height, "Frame buffer size mismatch, overlay skipped"),
        }
        frame
    }
}

/// Draw the full overlay onto `canvas`. Every coordinate handed to the
/// canvas lies within its bounds.
pub fn paint_overlay(canvas: &mut dyn Canvas, trail: &TrailBuffer, info: &OverlayInfo<'_>) {
    let mut canvas = Clamped::new(canvas);

    paint_trail(&mut canvas, trail);
    if let Some(active) = &info.active {
        paint_marker(&mut canvas, trail, active);
    }
    paint_panel(&mut canvas, info);
}

/// Opacity of the trail sample at `position` (0 = oldest) in a trail of
/// `len` samples.
pub fn trail_alpha(position: usize, len: usize) -> f32 {
    let fade = 1.0 - position as f32 / len.max(1) as f32;
    (fade * 0.8).max(0.1)
}

fn trail_style(kind: EventKind, alpha: f32) -> (Color, f32) {
    let dim = 100.0 / 255.0 * alpha;
    match kind {
        EventKind::Click => (Color::rgb(alpha, dim, dim), (3.0 + 2.0 * alpha).floor()),
        EventKind::Scroll => (Color::rgb(dim, dim, alpha), (2.0 + 2.0 * alpha).floor()),
        EventKind::Move | EventKind::Other => {
            (Color::rgb(dim, alpha, dim), (2.0 + alpha).floor())
        }
    }
}

fn paint_trail(canvas: &mut Clamped<'_>, trail: &TrailBuffer) {
    let len = trail.len();
    // The newest sample is covered by the active marker.
    for (position, sample) in trail.iter().take(len.saturating_sub(1)).enumerate() {
        let (color, radius) = trail_style(sample.kind, trail_alpha(position, len));
        canvas.fill_circle(point(sample.x, sample.y), radius, color);
    }
}

fn paint_marker(canvas: &mut Clamped<'_>, trail: &TrailBuffer, active: &ActiveEvent<'_>) {
    let at = point(active.position.0, active.position.1);
    let caption_at = Point::new(at.x + 20.0, at.y - 10.0);

    match active.event.kind {
        EventKind::Click => {
            canvas.stroke_circle(at, 15.0, Color::WHITE, 4.0);
            canvas.fill_circle(at, 12.0, Color::RED);
            canvas.stroke_circle(at, 8.0, Color::WHITE, 2.0);
            canvas.text("CLICK", caption_at, 18.0, Color::RED);
        }
        EventKind::Move => {
            canvas.stroke_circle(at, 12.0, Color::WHITE, 3.0);
            canvas.fill_circle(at, 10.0, Color::GREEN);
            canvas.stroke_circle(at, 6.0, Color::WHITE, 2.0);
        }
        EventKind::Scroll => {
            canvas.stroke_circle(at, 12.0, Color::WHITE, 3.0);
            canvas.fill_circle(at, 10.0, Color::BLUE);
            canvas.stroke_circle(at, 6.0, Color::WHITE, 2.0);
            canvas.text("SCROLL", caption_at, 18.0, Color::BLUE);
        }
        EventKind::Other => {
            canvas.stroke_circle(at, 12.0, Color::WHITE, 3.0);
            canvas.stroke_circle(at, 6.0, Color::WHITE, 2.0);
        }
    }

    let previous = trail
        .previous()
        .map(|s| point(s.x, s.y))
        .filter(|p| *p != at);
    paint_arrow(canvas, previous, at);
}

/// Short arrow pointing at `tip`, coming from `from` when known and from
/// the upper left otherwise.
fn paint_arrow(canvas: &mut Clamped<'_>, from: Option<Point>, tip: Point) {
    let (dx, dy) = match from {
        Some(from) => {
            let dist = from.distance_to(tip);
            ((tip.x - from.x) / dist, (tip.y - from.y) / dist)
        }
        None => (std::f32::consts::FRAC_1_SQRT_2, std::f32::consts::FRAC_1_SQRT_2),
    };
    let tail = Point::new(tip.x - dx * ARROW_LENGTH, tip.y - dy * ARROW_LENGTH);
    canvas.line(tail, tip, Color::WHITE, ARROW_WIDTH);

    let head = ARROW_LENGTH * ARROW_TIP_RATIO;
    let (sin, cos) = std::f32::consts::FRAC_PI_6.sin_cos();
    for side in [-1.0f32, 1.0] {
        // Rotate the reversed direction by +-30 degrees.
        let rx = -dx * cos - side * -dy * sin;
        let ry = side * -dx * sin + -dy * cos;
        canvas.line(
            tip,
            Point::new(tip.x + rx * head, tip.y + ry * head),
            Color::WHITE,
            ARROW_WIDTH,
        );
    }
}

fn paint_panel(canvas: &mut Clamped<'_>, info: &OverlayInfo<'_>) {
    canvas.fill_rect(PANEL, Color::BLACK.with_alpha(PANEL_OPACITY));

    canvas.text(
        &format!(
            "Session Time: {:.1}s / {:.1}s",
            info.time, info.total_duration
        ),
        Point::new(TEXT_X, 35.0),
        20.0,
        Color::WHITE,
    );

    let Some(active) = &info.active else {
        canvas.text(
            "Waiting for next event...",
            Point::new(TEXT_X, 60.0),
            20.0,
            Color::WHITE,
        );
        return;
    };

    let event = active.event;
    canvas.text(
        &format!(
            "Event {}/{}: {}",
            active.index + 1,
            info.event_count,
            event.kind
        ),
        Point::new(TEXT_X, 60.0),
        20.0,
        Color::WHITE,
    );
    canvas.text(
        &format!("Event Time: {}", event_time(event)),
        Point::new(TEXT_X, 85.0),
        16.0,
        Color::WHITE,
    );
    let (x, y) = event.position();
    canvas.text(
        &format!("Position: ({x}, {y})"),
        Point::new(TEXT_X, 105.0),
        14.0,
        Color::WHITE,
    );
}

/// Wall-clock time of an event as `HH:MM:SS.mmm` UTC.
pub fn event_time(event: &RecordedEvent) -> String {
    event
        .wall_clock()
        .map(|t| t.format("%H:%M:%S%.3f").to_string())
        .unwrap_or_else(|| "--:--:--.---".to_string())
}

fn point(x: i64, y: i64) -> Point {
    Point::new(x as f32, y as f32)
}

/// Clamps every coordinate into the wrapped canvas.
struct Clamped<'c> {
    inner: &'c mut dyn Canvas,
    width: u32,
    height: u32,
}

impl<'c> Clamped<'c> {
    fn new(inner: &'c mut dyn Canvas) -> Self {
        let (width, height) = inner.size();
        Self {
            inner,
            width,
            height,
        }
    }

    fn clamp(&self, p: Point) -> Point {
        p.clamp_to(self.width, self.height)
    }
}

impl Canvas for Clamped<'_> {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn fill_circle(&mut self, center: Point, radius: f32, color: Color) {
        let center = self.clamp(center);
        self.inner.fill_circle(center, radius, color);
    }

    fn stroke_circle(&mut self, center: Point, radius: f32, color: Color, width: f32) {
        let center = self.clamp(center);
        self.inner.stroke_circle(center, radius, color, width);
    }

    fn line(&mut self, from: Point, to: Point, color: Color, width: f32) {
        let (from, to) = (self.clamp(from), self.clamp(to));
        self.inner.line(from, to, color, width);
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let rect = rect.clamp_to(self.width, self.height);
        self.inner.fill_rect(rect, color);
    }

    fn text(&mut self, text: &str, origin: Point, size: f32, color: Color) {
        let origin = self.clamp(origin);
        self.inner.text(text, origin, size, color);
    }
}
