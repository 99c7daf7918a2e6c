//! Paint context - a canvas that records draw calls instead of rasterizing

use crate::canvas::Canvas;
use crate::color::Color;
use crate::primitives::{Circle, Point, Rect};

/// A recorded draw call
#[derive(Clone, Debug, PartialEq)]
pub enum PaintCommand {
    FillCircle {
        circle: Circle,
        color: Color,
    },
    StrokeCircle {
        circle: Circle,
        color: Color,
        width: f32,
    },
    Line {
        from: Point,
        to: Point,
        color: Color,
        width: f32,
    },
    FillRect {
        rect: Rect,
        color: Color,
    },
    DrawText {
        text: String,
        position: Point,
        size: f32,
        color: Color,
    },
}

impl PaintCommand {
    /// Every point this command was issued with.
    pub fn points(&self) -> Vec<Point> {
        match self {
            PaintCommand::FillCircle { circle, .. } | PaintCommand::StrokeCircle { circle, .. } => {
                vec![circle.center]
            }
            PaintCommand::Line { from, to, .. } => vec![*from, *to],
            PaintCommand::FillRect { rect, .. } => vec![rect.origin(), rect.end()],
            PaintCommand::DrawText { position, .. } => vec![*position],
        }
    }
}

/// The paint context records every draw call for later inspection.
pub struct PaintContext {
    width: u32,
    height: u32,
    commands: Vec<PaintCommand>,
}

impl PaintContext {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    /// Get all recorded commands
    pub fn commands(&self) -> &[PaintCommand] {
        &self.commands
    }

    /// Take ownership of recorded commands
    pub fn take_commands(&mut self) -> Vec<PaintCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Text of every recorded `DrawText`, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                PaintCommand::DrawText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Canvas for PaintContext {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn fill_circle(&mut self, center: Point, radius: f32, color: Color) {
        self.commands.push(PaintCommand::FillCircle {
            circle: Circle::new(center, radius),
            color,
        });
    }

    fn stroke_circle(&mut self, center: Point, radius: f32, color: Color, width: f32) {
        self.commands.push(PaintCommand::StrokeCircle {
            circle: Circle::new(center, radius),
            color,
            width,
        });
    }

    fn line(&mut self, from: Point, to: Point, color: Color, width: f32) {
        self.commands.push(PaintCommand::Line {
            from,
            to,
            color,
            width,
        });
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(PaintCommand::FillRect { rect, color });
    }

    fn text(&mut self, text: &str, origin: Point, size: f32, color: Color) {
        self.commands.push(PaintCommand::DrawText {
            text: text.to_string(),
            position: origin,
            size,
            color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order() {
        let mut ctx = PaintContext::new(100, 50);
        ctx.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), Color::BLACK);
        ctx.text("hi", Point::new(1.0, 2.0), 12.0, Color::WHITE);

        assert_eq!(ctx.size(), (100, 50));
        assert_eq!(ctx.commands().len(), 2);
        assert_eq!(ctx.texts(), vec!["hi"]);
        assert_eq!(ctx.take_commands().len(), 2);
        assert!(ctx.commands().is_empty());
    }

    #[test]
    fn line_reports_both_endpoints() {
        let cmd = PaintCommand::Line {
            from: Point::new(1.0, 2.0),
            to: Point::new(3.0, 4.0),
            color: Color::WHITE,
            width: 2.0,
        };
        assert_eq!(cmd.points(), vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0)]);
    }
}
