//! Shared geometric primitives for the crop surface.
//!
//! Two coordinate spaces meet here: pixel space (the drawing surface) and
//! normalized image space, where `(0, 0)` is the image's top-left corner and
//! `(1, 1)` its bottom-right corner.

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Crop selection in normalized image coordinates.
///
/// Values are replaced wholesale; derive a modified copy with struct update
/// syntax, e.g. `CropRect { h: 0.5, ..crop }`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl CropRect {
    pub const FULL: CropRect = CropRect::new(0.0, 0.0, 1.0, 1.0);

    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// Returns true when the rectangle lies inside the unit square, allowing
    /// `epsilon` of floating point slack.
    pub fn is_within_unit_square(&self, epsilon: f64) -> bool {
        self.x >= -epsilon
            && self.y >= -epsilon
            && self.w >= -epsilon
            && self.h >= -epsilon
            && self.right() <= 1.0 + epsilon
            && self.bottom() <= 1.0 + epsilon
    }
}

impl Default for CropRect {
    fn default() -> Self {
        Self::FULL
    }
}

/// Rectangle in drawing-surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub const ZERO: PixelRect = PixelRect::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Maps a normalized rectangle into this boundary's pixel space.
    pub fn project(&self, rect: CropRect) -> PixelRect {
        PixelRect::new(
            self.x + rect.x * self.width,
            self.y + rect.y * self.height,
            rect.w * self.width,
            rect.h * self.height,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SurfaceSize {
    pub width: f64,
    pub height: f64,
}

impl SurfaceSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Padding {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Padding {
    pub const fn uniform(value: f64) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }
}

/// Measured client box of a host container.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContentBox {
    pub client_width: f64,
    pub client_height: f64,
    pub padding: Padding,
}

impl ContentBox {
    pub const fn new(client_width: f64, client_height: f64, padding: Padding) -> Self {
        Self {
            client_width,
            client_height,
            padding,
        }
    }

    /// Client size with padding removed, floored at zero.
    pub fn inner_size(&self) -> SurfaceSize {
        SurfaceSize::new(
            (self.client_width - self.padding.left - self.padding.right).max(0.0),
            (self.client_height - self.padding.top - self.padding.bottom).max(0.0),
        )
    }
}

/// Where an image of `image_width`x`image_height` lands when aspect-fit and
/// centered inside `surface`.
pub fn image_boundary(surface: SurfaceSize, image_width: u32, image_height: u32) -> PixelRect {
    if image_width == 0 || image_height == 0 {
        return PixelRect::ZERO;
    }
    let surface_width = surface.width.max(0.0);
    let surface_height = surface.height.max(0.0);
    let image_width = f64::from(image_width);
    let image_height = f64::from(image_height);

    let scale = (surface_width / image_width).min(surface_height / image_height);
    let width = image_width * scale;
    let height = image_height * scale;
    PixelRect::new(
        (surface_width - width) / 2.0,
        (surface_height - height) / 2.0,
        width,
        height,
    )
}

/// Pointer position relative to the image boundary's origin, in pixels.
pub fn to_boundary_local(pointer: Point, surface_offset: Point, boundary: PixelRect) -> Point {
    Point::new(
        pointer.x - surface_offset.x - boundary.x,
        pointer.y - surface_offset.y - boundary.y,
    )
}

/// Projects a pointer position into normalized image coordinates.
///
/// Returns `None` for an empty boundary. The result is not clamped: points
/// outside the image map outside the unit square.
pub fn to_normalized(pointer: Point, surface_offset: Point, boundary: PixelRect) -> Option<Point> {
    if boundary.is_empty() {
        return None;
    }
    let local = to_boundary_local(pointer, surface_offset, boundary);
    Some(Point::new(
        local.x / boundary.width,
        local.y / boundary.height,
    ))
}
