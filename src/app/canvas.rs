use std::cell::RefCell;

use gtk4::cairo;
use image::RgbaImage;

use crate::geometry::{PixelRect, SurfaceSize};
use crate::render::{Canvas, LineSegment, RgbaColor};
use crate::surface::SourceImage;

/// Cairo surface for the most recently drawn image, keyed by image id.
#[derive(Default)]
pub(super) struct ImageSurfaceCache {
    image_id: Option<u64>,
    surface: Option<cairo::ImageSurface>,
}

impl ImageSurfaceCache {
    fn surface_for(&mut self, image: &SourceImage) -> Option<cairo::ImageSurface> {
        if self.image_id != Some(image.id) {
            self.surface = rgba_image_to_cairo_surface(&image.pixels);
            self.image_id = Some(image.id);
            if self.surface.is_none() {
                tracing::warn!(id = image.id, "failed to upload image to cairo surface");
            }
        }
        self.surface.clone()
    }
}

pub(super) struct CairoCanvas<'a> {
    context: &'a cairo::Context,
    cache: &'a RefCell<ImageSurfaceCache>,
}

impl<'a> CairoCanvas<'a> {
    pub(super) fn new(context: &'a cairo::Context, cache: &'a RefCell<ImageSurfaceCache>) -> Self {
        Self { context, cache }
    }

    fn set_color(&self, color: RgbaColor) {
        let (r, g, b, a) = color.to_cairo_rgba();
        self.context.set_source_rgba(r, g, b, a);
    }
}

impl Canvas for CairoCanvas<'_> {
    fn clear(&mut self, size: SurfaceSize) {
        self.context.save().ok();
        self.context.set_operator(cairo::Operator::Clear);
        self.context.rectangle(0.0, 0.0, size.width, size.height);
        self.context.fill().ok();
        self.context.restore().ok();
    }

    fn draw_image(&mut self, image: &SourceImage, dest: PixelRect) {
        let Some(surface) = self.cache.borrow_mut().surface_for(image) else {
            return;
        };
        let context = self.context;
        context.save().ok();
        context.translate(dest.x, dest.y);
        context.scale(
            dest.width / f64::from(image.width()),
            dest.height / f64::from(image.height()),
        );
        if let Err(err) = context.set_source_surface(&surface, 0.0, 0.0) {
            tracing::warn!(?err, "failed to set image source");
        } else {
            context.source().set_filter(cairo::Filter::Good);
            context.paint().ok();
        }
        context.restore().ok();
    }

    fn fill_rect(&mut self, rect: PixelRect, color: RgbaColor) {
        self.set_color(color);
        self.context.rectangle(rect.x, rect.y, rect.width, rect.height);
        self.context.fill().ok();
    }

    fn stroke_line(&mut self, segment: LineSegment, width: f64, color: RgbaColor) {
        self.set_color(color);
        self.context.set_line_width(width);
        self.context.set_line_cap(cairo::LineCap::Round);
        self.context.move_to(segment.from.x, segment.from.y);
        self.context.line_to(segment.to.x, segment.to.y);
        self.context.stroke().ok();
    }
}

/// Converts straight-alpha RGBA into cairo's premultiplied native-endian
/// ARGB32.
pub(super) fn rgba_image_to_cairo_surface(image: &RgbaImage) -> Option<cairo::ImageSurface> {
    let width = i32::try_from(image.width()).ok()?;
    let height = i32::try_from(image.height()).ok()?;
    let mut surface = cairo::ImageSurface::create(cairo::Format::ARgb32, width, height).ok()?;
    let stride = usize::try_from(surface.stride()).ok()?;
    let row_len = usize::try_from(image.width()).ok()?.checked_mul(4)?;

    {
        let mut data = surface.data().ok()?;
        for (src_row, dst_row) in image
            .as_raw()
            .chunks_exact(row_len)
            .zip(data.chunks_exact_mut(stride))
        {
            for (src, dst) in src_row.chunks_exact(4).zip(dst_row.chunks_exact_mut(4)) {
                let [r, g, b, a] = [src[0], src[1], src[2], src[3]];
                let premultiply = |channel: u8| -> u8 {
                    ((u16::from(channel) * u16::from(a) + 127) / 255) as u8
                };
                let argb = u32::from_be_bytes([a, premultiply(r), premultiply(g), premultiply(b)]);
                dst.copy_from_slice(&argb.to_ne_bytes());
            }
        }
    }

    surface.flush();
    Some(surface)
}
