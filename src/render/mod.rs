//! Stateless frame rendering for the crop surface.
//!
//! Every frame is drawn from scratch: clear, image, dimming overlay outside
//! the crop, then the crop border.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{image_boundary, CropRect, PixelRect, Point, SurfaceSize};
use crate::surface::SourceImage;

/// Straight-alpha color. Serialized as `#rrggbb`, `#rrggbbaa` or the short
/// `#rgb` / `#rgba` forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RgbaColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl RgbaColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_cairo_rgba(self) -> (f64, f64, f64, f64) {
        (
            f64::from(self.r) / 255.0,
            f64::from(self.g) / 255.0,
            f64::from(self.b) / 255.0,
            f64::from(self.a) / 255.0,
        )
    }

    pub fn from_hex(value: &str) -> Result<Self, ColorParseError> {
        let digits = value
            .strip_prefix('#')
            .ok_or_else(|| ColorParseError(value.to_string()))?;
        let nibble = |index: usize| -> Result<u8, ColorParseError> {
            digits
                .get(index..=index)
                .and_then(|digit| u8::from_str_radix(digit, 16).ok())
                .ok_or_else(|| ColorParseError(value.to_string()))
        };
        let byte = |index: usize| -> Result<u8, ColorParseError> {
            Ok(nibble(index)? << 4 | nibble(index + 1)?)
        };
        let short = |index: usize| -> Result<u8, ColorParseError> { Ok(nibble(index)? * 0x11) };
        match digits.len() {
            3 => Ok(Self::new(short(0)?, short(1)?, short(2)?, 0xff)),
            4 => Ok(Self::new(short(0)?, short(1)?, short(2)?, short(3)?)),
            6 => Ok(Self::new(byte(0)?, byte(2)?, byte(4)?, 0xff)),
            8 => Ok(Self::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => Err(ColorParseError(value.to_string())),
        }
    }
}

impl fmt::Display for RgbaColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:02x}{:02x}{:02x}{:02x}",
            self.r, self.g, self.b, self.a
        )
    }
}

impl TryFrom<String> for RgbaColor {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<RgbaColor> for String {
    fn from(color: RgbaColor) -> Self {
        color.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid color {0:?}; expected #rgb, #rgba, #rrggbb or #rrggbbaa")]
pub struct ColorParseError(String);

pub const DEFAULT_OVERLAY_COLOR: RgbaColor = RgbaColor::new(0x00, 0x00, 0x00, 0xaa);
pub const DEFAULT_BORDER_COLOR: RgbaColor = RgbaColor::new(0xaa, 0xaa, 0xff, 0xff);
pub const DEFAULT_BORDER_WIDTH: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStyle {
    pub overlay_color: RgbaColor,
    pub border_color: RgbaColor,
    pub border_width: f64,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            overlay_color: DEFAULT_OVERLAY_COLOR,
            border_color: DEFAULT_BORDER_COLOR,
            border_width: DEFAULT_BORDER_WIDTH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub from: Point,
    pub to: Point,
}

impl LineSegment {
    pub const fn new(from: Point, to: Point) -> Self {
        Self { from, to }
    }
}

/// Drawing primitives a host provides.
pub trait Canvas {
    fn clear(&mut self, size: SurfaceSize);
    fn draw_image(&mut self, image: &SourceImage, dest: PixelRect);
    fn fill_rect(&mut self, rect: PixelRect, color: RgbaColor);
    fn stroke_line(&mut self, segment: LineSegment, width: f64, color: RgbaColor);
}

/// The four strips outside `crop`, in normalized coordinates: full-height
/// left and right columns, plus top and bottom strips spanning the crop's
/// width. They never overlap and together cover everything but the crop.
pub fn overlay_regions(crop: CropRect) -> [CropRect; 4] {
    let CropRect { x, y, w, h } = crop;
    [
        CropRect::new(0.0, 0.0, x, 1.0),
        CropRect::new(x, 0.0, w, y),
        CropRect::new(x + w, 0.0, 1.0 - x - w, 1.0),
        CropRect::new(x, y + h, w, 1.0 - y - h),
    ]
}

/// Border lines along the crop edges, inset by half the stroke width so the
/// stroke sits inside the crop. Order: top, left, bottom, right.
pub fn border_segments(crop: CropRect, boundary: PixelRect, width: f64) -> [LineSegment; 4] {
    let half = width / 2.0;
    let edges = boundary.project(crop);
    let left = edges.x + half;
    let top = edges.y + half;
    let right = edges.x + edges.width - half;
    let bottom = edges.y + edges.height - half;
    [
        LineSegment::new(Point::new(left, top), Point::new(right, top)),
        LineSegment::new(Point::new(left, top), Point::new(left, bottom)),
        LineSegment::new(Point::new(right, bottom), Point::new(left, bottom)),
        LineSegment::new(Point::new(right, bottom), Point::new(right, top)),
    ]
}

pub fn render_frame(
    canvas: &mut dyn Canvas,
    size: SurfaceSize,
    image: Option<&SourceImage>,
    crop: CropRect,
    style: &RenderStyle,
) {
    canvas.clear(size);
    let Some(image) = image else {
        return;
    };
    let boundary = image_boundary(size, image.width(), image.height());
    if boundary.is_empty() {
        return;
    }

    canvas.draw_image(image, boundary);
    for region in overlay_regions(crop) {
        if region.w > 0.0 && region.h > 0.0 {
            canvas.fill_rect(boundary.project(region), style.overlay_color);
        }
    }
    for segment in border_segments(crop, boundary, style.border_width) {
        canvas.stroke_line(segment, style.border_width, style.border_color);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum CanvasOp {
        Clear(SurfaceSize),
        Image { id: u64, dest: PixelRect },
        Fill(PixelRect),
        Stroke(LineSegment),
    }

    #[derive(Debug, Default)]
    pub(crate) struct RecordingCanvas {
        pub(crate) ops: Vec<CanvasOp>,
    }

    impl Canvas for RecordingCanvas {
        fn clear(&mut self, size: SurfaceSize) {
            self.ops.push(CanvasOp::Clear(size));
        }

        fn draw_image(&mut self, image: &SourceImage, dest: PixelRect) {
            self.ops.push(CanvasOp::Image { id: image.id, dest });
        }

        fn fill_rect(&mut self, rect: PixelRect, _color: RgbaColor) {
            self.ops.push(CanvasOp::Fill(rect));
        }

        fn stroke_line(&mut self, segment: LineSegment, _width: f64, _color: RgbaColor) {
            self.ops.push(CanvasOp::Stroke(segment));
        }
    }
}
