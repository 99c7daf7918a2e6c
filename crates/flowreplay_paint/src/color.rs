//! Color types and utilities

/// RGBA color with f32 components (0.0 to 1.0)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const RED: Color = Color {
        r: 1.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const GREEN: Color = Color {
        r: 0.0,
        g: 1.0,
        b: 0.0,
        a: 1.0,
    };
    pub const BLUE: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 1.0,
        a: 1.0,
    };

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Set alpha and return new color
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: alpha.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Convert to u8 array [r, g, b, a]
    pub fn to_rgba8(&self) -> [u8; 4] {
        [
            (self.r.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.g.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.b.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.a.clamp(0.0, 1.0) * 255.0).round() as u8,
        ]
    }

    /// Composite this color over an opaque destination pixel.
    ///
    /// `coverage` scales the color's own alpha (anti-aliasing, glyph masks).
    /// The destination alpha channel is left untouched.
    pub fn blend_over(&self, dst: &mut [u8], coverage: f32) {
        let alpha = (self.a * coverage).clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }
        let src = [self.r, self.g, self.b];
        for (channel, value) in dst.iter_mut().take(3).zip(src) {
            let d = *channel as f32 / 255.0;
            let out = value.clamp(0.0, 1.0) * alpha + d * (1.0 - alpha);
            *channel = (out * 255.0).round() as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_blend_replaces_destination() {
        let mut px = [10u8, 20, 30, 255];
        Color::RED.blend_over(&mut px, 1.0);
        assert_eq!(px, [255, 0, 0, 255]);
    }

    #[test]
    fn thirty_percent_black_darkens_to_seventy_percent() {
        let mut px = [200u8, 100, 50, 255];
        Color::BLACK.with_alpha(0.3).blend_over(&mut px, 1.0);
        assert_eq!(px, [140, 70, 35, 255]);
    }

    #[test]
    fn zero_coverage_is_a_no_op() {
        let mut px = [1u8, 2, 3, 4];
        Color::WHITE.blend_over(&mut px, 0.0);
        assert_eq!(px, [1, 2, 3, 4]);
    }
}
