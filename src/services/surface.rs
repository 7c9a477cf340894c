use ab_glyph::{Font, FontRef, PxScale, ScaleFont};
use image::imageops::FilterType;
use image::{DynamicImage, Pixel, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use serde::Serialize;
use std::ops::Range;
use tracing::warn;

static LABEL_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

/// Axis-aligned rectangle in display units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    fn inset(&self, by: f64) -> Rect {
        Rect::new(
            self.x + by,
            self.y + by,
            self.width - 2.0 * by,
            self.height - 2.0 * by,
        )
    }

    fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }
}

/// Drawing capability handed to the renderer.
pub trait DisplaySurface {
    fn set_size(&mut self, width: u32, height: u32);
    fn draw_image(&mut self, image: &DynamicImage, width: u32, height: u32);
    /// Outline centered on the rectangle's edges, `line_width` units thick.
    fn stroke_rect(&mut self, rect: Rect, color: Rgba<u8>, line_width: f64);
    fn fill_rect(&mut self, rect: Rect, color: Rgba<u8>);
    /// `(x, y)` is the left end of the text baseline.
    fn fill_text(&mut self, text: &str, x: f64, y: f64, color: Rgba<u8>);
    fn measure_text(&self, text: &str) -> f64;
}

/// Text drawn on the surface, kept so hosts can export it alongside the image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextAnnotation {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub color: String,
}

/// In-memory RGBA canvas with bold sans-serif labels.
pub struct RasterSurface {
    canvas: RgbaImage,
    annotations: Vec<TextAnnotation>,
    font: Option<FontRef<'static>>,
    scale: PxScale,
}

impl Default for RasterSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterSurface {
    pub const FONT_SIZE: f32 = 18.0;
    /// Advance used when the embedded font cannot be parsed.
    pub const CHAR_WIDTH: f64 = 10.0;

    pub fn new() -> Self {
        let font = match FontRef::try_from_slice(LABEL_FONT) {
            Ok(font) => Some(font),
            Err(e) => {
                warn!(error = %e, "Label font unavailable, text will only be recorded");
                None
            }
        };
        Self {
            canvas: RgbaImage::new(0, 0),
            annotations: Vec::new(),
            font,
            scale: PxScale::from(Self::FONT_SIZE),
        }
    }

    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    pub fn annotations(&self) -> &[TextAnnotation] {
        &self.annotations
    }

    pub fn into_parts(self) -> (RgbaImage, Vec<TextAnnotation>) {
        (self.canvas, self.annotations)
    }

    fn fill_where(&mut self, bounds: Rect, mut inside: impl FnMut(f64, f64) -> bool, color: Rgba<u8>) {
        let xs = span(bounds.x, bounds.x + bounds.width, self.canvas.width());
        let ys = span(bounds.y, bounds.y + bounds.height, self.canvas.height());
        for py in ys {
            for px in xs.clone() {
                let (cx, cy) = (px as f64 + 0.5, py as f64 + 0.5);
                if inside(cx, cy) {
                    self.canvas.get_pixel_mut(px, py).blend(&color);
                }
            }
        }
    }
}

/// Pixel indices whose centers fall in `[start, end)`, clipped to `0..limit`.
fn span(start: f64, end: f64, limit: u32) -> Range<u32> {
    let lo = (start - 0.5).ceil().max(0.0);
    let hi = (end - 0.5).ceil().max(0.0);
    let lo = (lo as u64).min(limit as u64) as u32;
    let hi = (hi as u64).min(limit as u64) as u32;
    lo..hi.max(lo)
}

impl DisplaySurface for RasterSurface {
    fn set_size(&mut self, width: u32, height: u32) {
        self.canvas = RgbaImage::new(width, height);
        self.annotations.clear();
    }

    fn draw_image(&mut self, image: &DynamicImage, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        let resized = image.resize_exact(width, height, FilterType::Triangle).into_rgba8();
        image::imageops::overlay(&mut self.canvas, &resized, 0, 0);
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgba<u8>, line_width: f64) {
        let half = line_width / 2.0;
        let outer = rect.inset(-half);
        let inner = rect.inset(half);
        self.fill_where(outer, |x, y| outer.contains(x, y) && !inner.contains(x, y), color);
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba<u8>) {
        self.fill_where(rect, |x, y| rect.contains(x, y), color);
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, color: Rgba<u8>) {
        if let Some(font) = &self.font {
            // imageproc positions text by the top of the line box
            let ascent = font.as_scaled(self.scale).ascent() as f64;
            let top = (y - ascent).round() as i32;
            draw_text_mut(&mut self.canvas, color, x.round() as i32, top, self.scale, font, text);
        }
        let [r, g, b, _] = color.0;
        self.annotations.push(TextAnnotation {
            text: text.to_string(),
            x,
            y,
            color: format!("#{:02x}{:02x}{:02x}", r, g, b),
        });
    }

    fn measure_text(&self, text: &str) -> f64 {
        match &self.font {
            Some(font) => text_size(self.scale, font, text).0 as f64,
            None => text.chars().count() as f64 * Self::CHAR_WIDTH,
        }
    }
}
