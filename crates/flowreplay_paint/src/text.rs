//! Glyph rasterization using fontdb + swash
//!
//! Discovers a sans-serif system font once and caches rasterized alpha
//! masks per (character, pixel size).

use std::collections::HashMap;

use fontdb::{Database, Family, Query};
use swash::scale::{Render, ScaleContext, Source};
use swash::zeno::Format;
use swash::FontRef;

/// Rasterized glyph bitmap with metrics
#[derive(Debug, Clone)]
pub struct RasterizedGlyph {
    /// 8-bit alpha coverage, row-major
    pub bitmap: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Horizontal offset from the pen position to the left edge
    pub bearing_x: i32,
    /// Vertical offset from the baseline to the top edge
    pub bearing_y: i32,
    /// Horizontal advance to the next pen position
    pub advance: f32,
}

/// A system font plus a cache of rasterized glyphs.
pub struct GlyphCache {
    data: Vec<u8>,
    face_index: usize,
    scale_context: ScaleContext,
    glyphs: HashMap<(char, u32), RasterizedGlyph>,
}

impl GlyphCache {
    /// Load the default sans-serif system font.
    ///
    /// Returns `None` on hosts without any usable font; callers then skip
    /// text rendering.
    pub fn system() -> Option<Self> {
        let mut db = Database::new();
        db.load_system_fonts();

        let query = Query {
            families: &[Family::SansSerif],
            ..Query::default()
        };
        let id = db.query(&query).or_else(|| db.faces().next().map(|f| f.id))?;
        let (data, face_index) = db.with_face_data(id, |data, index| (data.to_vec(), index))?;

        FontRef::from_index(&data, face_index as usize)?;
        tracing::debug!(faces = db.len(), "Loaded overlay font");

        Some(Self {
            data,
            face_index: face_index as usize,
            scale_context: ScaleContext::new(),
            glyphs: HashMap::new(),
        })
    }

    /// Rasterize (or fetch from cache) a glyph at the given pixel size.
    pub fn glyph(&mut self, ch: char, size: f32) -> Option<&RasterizedGlyph> {
        let key = (ch, size.to_bits());
        if !self.glyphs.contains_key(&key) {
            let glyph = self.rasterize(ch, size)?;
            self.glyphs.insert(key, glyph);
        }
        self.glyphs.get(&key)
    }

    fn rasterize(&mut self, ch: char, size: f32) -> Option<RasterizedGlyph> {
        let font = FontRef::from_index(&self.data, self.face_index)?;
        let glyph_id = font.charmap().map(ch);

        let metrics = font.metrics(&[]);
        let scale = size / metrics.units_per_em.max(1) as f32;
        let advance = font.glyph_metrics(&[]).advance_width(glyph_id) * scale;

        let mut scaler = self.scale_context.builder(font).size(size).hint(true).build();
        let mut render = Render::new(&[Source::Outline]);
        render.format(Format::Alpha);

        Some(match render.render(&mut scaler, glyph_id) {
            Some(img) => RasterizedGlyph {
                bitmap: img.data,
                width: img.placement.width,
                height: img.placement.height,
                bearing_x: img.placement.left,
                bearing_y: img.placement.top,
                advance,
            },
            // Whitespace has no outline but still advances the pen
            None => RasterizedGlyph {
                bitmap: Vec::new(),
                width: 0,
                height: 0,
                bearing_x: 0,
                bearing_y: 0,
                advance,
            },
        })
    }
}
