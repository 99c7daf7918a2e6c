//! Flowreplay Paint/Canvas API
//!
//! A small 2D drawing API used to composite replay overlays onto captured
//! browser frames.
//!
//! # Features
//!
//! - Shape primitives (filled/stroked circles, lines, filled rects)
//! - Straight alpha blending onto RGBA8 buffers
//! - Text rendering through system fonts (`text` feature)
//! - A recording canvas for inspecting draw calls in tests

pub mod canvas;
pub mod color;
pub mod context;
pub mod primitives;
pub mod raster;
#[cfg(feature = "text")]
pub mod text;

pub use canvas::Canvas;
pub use color::Color;
pub use context::{PaintCommand, PaintContext};
pub use primitives::{Circle, Point, Rect};
pub use raster::RasterCanvas;
#[cfg(feature = "text")]
pub use text::{GlyphCache, RasterizedGlyph};
