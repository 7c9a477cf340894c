use crate::models::detection_types::{AnalysisResult, BoundingBox};
use crate::models::ui_types::{ResultDetails, ResultView};
use crate::services::color::{color_or_fallback, WHITE};
use crate::services::surface::{DisplaySurface, Rect};
use image::DynamicImage;
use serde::Serialize;
use tracing::debug;

pub const BOX_LINE_WIDTH: f64 = 4.0;
pub const LABEL_TEXT_HEIGHT: f64 = 24.0;
pub const LABEL_PADDING: f64 = 8.0;
/// Baseline offset of the label text above the box's top edge.
pub const LABEL_BASELINE_OFFSET: f64 = 10.0;
const PLACEHOLDER: &str = "N/A";

/// Overlay geometry, in display units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlay {
    pub box_rect: Rect,
    pub label_rect: Rect,
    pub label: String,
    pub text_x: f64,
    pub text_y: f64,
}

/// What was drawn for one result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderReport {
    pub width: f64,
    pub height: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub overlay: Option<Overlay>,
}

/// Fits `width`×`height` inside `max_width`×`max_height`, keeping the aspect
/// ratio. Width is shrunk first, then height if still oversized.
pub fn fit_within(width: f64, height: f64, max_width: f64, max_height: f64) -> (f64, f64) {
    let (mut w, mut h) = (width, height);
    if w > max_width {
        h = h * max_width / w;
        w = max_width;
    }
    if h > max_height {
        w = w * max_height / h;
        h = max_height;
    }
    (w, h)
}

/// Draws the image resized to fit the display area, plus the detection
/// overlay when the result carries one.
pub fn render_result<S: DisplaySurface>(
    surface: &mut S,
    image: &DynamicImage,
    result: &AnalysisResult,
    max_width: u32,
    max_height: u32,
) -> RenderReport {
    let (src_w, src_h) = (image.width() as f64, image.height() as f64);
    let (width, height) = fit_within(src_w, src_h, max_width as f64, max_height as f64);

    let (canvas_w, canvas_h) = (width as u32, height as u32);
    surface.set_size(canvas_w, canvas_h);
    surface.draw_image(image, canvas_w, canvas_h);

    let scale_x = if src_w > 0.0 { width / src_w } else { 1.0 };
    let scale_y = if src_h > 0.0 { height / src_h } else { 1.0 };

    let overlay = result
        .detection_box()
        .map(|bbox| draw_overlay(surface, result, bbox.scaled(scale_x, scale_y)));

    debug!(
        width,
        height,
        scale_x,
        scale_y,
        overlay = overlay.is_some(),
        "Rendered result"
    );

    RenderReport {
        width,
        height,
        scale_x,
        scale_y,
        overlay,
    }
}

fn draw_overlay<S: DisplaySurface>(
    surface: &mut S,
    result: &AnalysisResult,
    scaled: BoundingBox,
) -> Overlay {
    let color = color_or_fallback(&result.color);
    let box_rect = Rect::new(scaled.x1, scaled.y1, scaled.width(), scaled.height());
    surface.stroke_rect(box_rect, color, BOX_LINE_WIDTH);

    let label = result.label();
    let text_width = surface.measure_text(&label);
    let label_rect = Rect::new(
        scaled.x1,
        scaled.y1 - LABEL_TEXT_HEIGHT - LABEL_PADDING,
        text_width + 2.0 * LABEL_PADDING,
        LABEL_TEXT_HEIGHT + LABEL_PADDING,
    );
    surface.fill_rect(label_rect, color);

    let text_x = scaled.x1 + LABEL_PADDING;
    let text_y = scaled.y1 - LABEL_BASELINE_OFFSET;
    surface.fill_text(&label, text_x, text_y, WHITE);

    Overlay {
        box_rect,
        label_rect,
        label,
        text_x,
        text_y,
    }
}

/// Text and styling for the result card.
pub fn result_view(result: &AnalysisResult) -> ResultView {
    let processing_time = match result.processing_time {
        Some(t) => format!("{}s", t),
        None => PLACEHOLDER.to_string(),
    };

    ResultView {
        emoji: result.emoji.clone(),
        status: result.status.clone(),
        color: result.color.clone(),
        header_tint: format!("{}20", result.color),
        confidence_bar_width: result.confidence_percent.clamp(0.0, 100.0),
        confidence_text: format!("{}%", result.confidence_percent),
        message: result.message.clone(),
        details: ResultDetails {
            class_name: non_empty_or_placeholder(result.class_name.as_deref()),
            priority: non_empty_or_placeholder(result.priority.as_deref()),
            num_detections: result.num_detections.to_string(),
            processing_time,
        },
    }
}

fn non_empty_or_placeholder(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => PLACEHOLDER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Size(u32, u32),
        Image(u32, u32),
        Stroke(Rect, Rgba<u8>, f64),
        Fill(Rect, Rgba<u8>),
        Text(String, f64, f64, Rgba<u8>),
    }

    #[derive(Default)]
    struct Recorder {
        ops: Vec<Op>,
    }

    impl DisplaySurface for Recorder {
        fn set_size(&mut self, width: u32, height: u32) {
            self.ops.push(Op::Size(width, height));
        }
        fn draw_image(&mut self, _image: &DynamicImage, width: u32, height: u32) {
            self.ops.push(Op::Image(width, height));
        }
        fn stroke_rect(&mut self, rect: Rect, color: Rgba<u8>, line_width: f64) {
            self.ops.push(Op::Stroke(rect, color, line_width));
        }
        fn fill_rect(&mut self, rect: Rect, color: Rgba<u8>) {
            self.ops.push(Op::Fill(rect, color));
        }
        fn fill_text(&mut self, text: &str, x: f64, y: f64, color: Rgba<u8>) {
            self.ops.push(Op::Text(text.to_string(), x, y, color));
        }
        fn measure_text(&self, text: &str) -> f64 {
            text.len() as f64 * 10.0
        }
    }

    fn result(num_detections: u32, bbox: Option<BoundingBox>) -> AnalysisResult {
        AnalysisResult {
            emoji: "🗑️".into(),
            status: "Full".into(),
            color: "#ef4444".into(),
            confidence: Some(0.9),
            confidence_percent: 90.0,
            message: "Empty me".into(),
            class_name: Some("full".into()),
            priority: None,
            num_detections,
            processing_time: Some(0.25),
            bbox,
        }
    }

    #[test]
    fn fit_shrinks_width_then_height() {
        assert_eq!(fit_within(1600.0, 1200.0, 800.0, 600.0), (800.0, 600.0));
        assert_eq!(fit_within(1000.0, 3000.0, 800.0, 600.0), (200.0, 600.0));
        assert_eq!(fit_within(640.0, 480.0, 800.0, 600.0), (640.0, 480.0));
        assert_eq!(fit_within(1000.0, 1000.0, 800.0, 600.0), (600.0, 600.0));
    }

    #[test]
    fn no_overlay_without_detections() {
        let bbox = BoundingBox { x1: 1.0, y1: 1.0, x2: 5.0, y2: 5.0 };
        let img = DynamicImage::new_rgba8(100, 50);
        let mut rec = Recorder::default();
        let report = render_result(&mut rec, &img, &result(0, Some(bbox)), 800, 600);
        assert!(report.overlay.is_none());
        assert_eq!(rec.ops, vec![Op::Size(100, 50), Op::Image(100, 50)]);
    }

    #[test]
    fn no_overlay_without_bbox() {
        let img = DynamicImage::new_rgba8(10, 10);
        let mut rec = Recorder::default();
        render_result(&mut rec, &img, &result(1, None), 800, 600);
        assert_eq!(rec.ops.len(), 2);
    }

    #[test]
    fn bbox_scaled_to_display_size() {
        let bbox = BoundingBox { x1: 10.0, y1: 10.0, x2: 110.0, y2: 60.0 };
        let img = DynamicImage::new_rgba8(1000, 1000);
        let mut rec = Recorder::default();
        let report = render_result(&mut rec, &img, &result(1, Some(bbox)), 400, 400);

        assert_eq!((report.width, report.height), (400.0, 400.0));
        let overlay = report.overlay.unwrap();
        let r = overlay.box_rect;
        assert!((r.x - 4.0).abs() < 1e-9);
        assert!((r.y - 4.0).abs() < 1e-9);
        assert!((r.width - 40.0).abs() < 1e-9);
        assert!((r.height - 20.0).abs() < 1e-9);

        let red = Rgba([0xef, 0x44, 0x44, 255]);
        assert_eq!(rec.ops[2], Op::Stroke(r, red, 4.0));
    }

    #[test]
    fn label_sits_above_box() {
        let bbox = BoundingBox { x1: 100.0, y1: 200.0, x2: 300.0, y2: 400.0 };
        let img = DynamicImage::new_rgba8(800, 600);
        let mut rec = Recorder::default();
        let overlay = render_result(&mut rec, &img, &result(1, Some(bbox)), 800, 600)
            .overlay
            .unwrap();

        assert_eq!(overlay.label, "Full 90%");
        // 8 chars at 10 units, plus padding on both sides
        assert_eq!(overlay.label_rect, Rect::new(100.0, 168.0, 96.0, 32.0));
        assert_eq!(
            rec.ops[4],
            Op::Text("Full 90%".into(), 108.0, 190.0, WHITE)
        );
    }

    #[test]
    fn view_uses_placeholders() {
        let mut r = result(0, None);
        r.class_name = Some(String::new());
        r.processing_time = None;
        let view = result_view(&r);
        assert_eq!(view.details.class_name, "N/A");
        assert_eq!(view.details.priority, "N/A");
        assert_eq!(view.details.num_detections, "0");
        assert_eq!(view.details.processing_time, "N/A");
        assert_eq!(view.header_tint, "#ef444420");
        assert_eq!(view.confidence_text, "90%");
    }
}
