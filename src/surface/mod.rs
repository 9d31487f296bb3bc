//! Crop surface session: owns the loaded image, the crop selection and the
//! attachment to a host container, and routes host events through the
//! hit-tester and drag controller.

mod debounce;
pub mod export;
pub mod loader;
mod subscription;

#[cfg(test)]
pub(crate) mod testing;

use std::time::Duration;

use thiserror::Error;

use crate::config::CropperConfig;
use crate::editor::{resolve_interaction, CursorHint, DragController, DragState, InteractionMode};
use crate::geometry::{
    image_boundary, to_boundary_local, to_normalized, ContentBox, CropRect, PixelRect, Point,
    SurfaceSize,
};
use crate::input::PointerInput;
use crate::render::{render_frame, Canvas, RenderStyle};

pub use debounce::ResizeDebouncer;
pub use loader::{
    ImageSource, LoadCompletion, LoadError, LoadOutcome, LoadRequest, LoadResult, SourceImage,
};
pub use subscription::{Subscription, SubscriptionSet};

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("no image loaded")]
    NoImage,
    #[error("crop selection is empty ({width}x{height} px)")]
    EmptyCrop { width: u32, height: u32 },
    #[error("failed to encode cropped image: {0}")]
    Encode(#[from] image::ImageError),
}

pub type SurfaceResult<T> = std::result::Result<T, SurfaceError>;

/// Kinds of host events the surface listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PointerMove,
    PointerDown,
    TouchStart,
    WindowResize,
    DragMove,
    TouchMove,
    PointerUp,
    TouchEnd,
}

impl EventKind {
    /// Held for as long as the surface is attached.
    pub const ATTACHMENT: [EventKind; 4] = [
        EventKind::PointerMove,
        EventKind::PointerDown,
        EventKind::TouchStart,
        EventKind::WindowResize,
    ];

    /// Held only while a drag is in progress.
    pub const DRAG: [EventKind; 4] = [
        EventKind::DragMove,
        EventKind::TouchMove,
        EventKind::PointerUp,
        EventKind::TouchEnd,
    ];
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// Hover; updates the cursor hint.
    PointerMoved(PointerInput),
    /// Mouse button down or touch start.
    PointerPressed(PointerInput),
    /// Pointer motion while dragging.
    DragMoved(PointerInput),
    /// Mouse button up or touch end.
    PointerReleased,
    WindowResized,
    /// The resize debounce timer fired.
    ResizeSettled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceNotice {
    LoadFailed { reason: String },
}

/// Host side of the surface: measurement, mounting, event delivery, timers
/// and cosmetic feedback.
pub trait Container {
    fn content_box(&self) -> ContentBox;

    /// Offset of the drawing surface in the coordinate space pointer events
    /// are reported in.
    fn surface_offset(&self) -> Point {
        Point::default()
    }

    fn mount(&mut self);

    fn unmount(&mut self);

    /// Starts delivering `kind` events until the returned handle is released.
    fn listen(&mut self, kind: EventKind) -> Subscription;

    /// Delivers [`SurfaceEvent::ResizeSettled`] once after `delay`. Releasing
    /// the handle cancels the timer and must be harmless once it has fired.
    fn schedule(&mut self, delay: Duration) -> Subscription;

    fn set_cursor(&mut self, cursor: CursorHint);

    fn request_redraw(&mut self);

    fn notify(&mut self, notice: SurfaceNotice) {
        tracing::debug!(?notice, "surface notice dropped by host");
    }
}

struct Attachment {
    container: Box<dyn Container>,
    listeners: SubscriptionSet,
}

pub struct CropSurface {
    handle_margin_px: f64,
    style: RenderStyle,
    image: Option<SourceImage>,
    crop: CropRect,
    surface_size: SurfaceSize,
    cursor: CursorHint,
    drag: DragController,
    debouncer: ResizeDebouncer,
    load_generation: u64,
    attachment: Option<Attachment>,
}

impl CropSurface {
    pub fn new(config: &CropperConfig) -> Self {
        Self {
            handle_margin_px: config.handle_margin_px,
            style: config.render_style(),
            image: None,
            crop: CropRect::FULL,
            surface_size: SurfaceSize::default(),
            cursor: CursorHint::Default,
            drag: DragController::new(),
            debouncer: ResizeDebouncer::new(config.resize_debounce()),
            load_generation: 0,
            attachment: None,
        }
    }

    pub fn crop(&self) -> CropRect {
        self.crop
    }

    pub fn image(&self) -> Option<&SourceImage> {
        self.image.as_ref()
    }

    pub fn surface_size(&self) -> SurfaceSize {
        self.surface_size
    }

    pub fn cursor(&self) -> CursorHint {
        self.cursor
    }

    pub fn drag_state(&self) -> DragState {
        self.drag.state()
    }

    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }

    /// Pixel rectangle the image occupies on the surface; empty without an
    /// image.
    pub fn image_boundary(&self) -> PixelRect {
        match &self.image {
            Some(image) => image_boundary(self.surface_size, image.width(), image.height()),
            None => PixelRect::ZERO,
        }
    }

    /// Binds the surface into `container`, detaching from any previous one.
    pub fn attach(&mut self, mut container: Box<dyn Container>) {
        if self.attachment.is_some() {
            self.detach();
        }
        container.mount();
        let listeners = EventKind::ATTACHMENT
            .into_iter()
            .map(|kind| container.listen(kind))
            .collect();
        self.surface_size = container.content_box().inner_size();
        tracing::info!(
            width = self.surface_size.width,
            height = self.surface_size.height,
            "crop surface attached"
        );
        container.request_redraw();
        self.attachment = Some(Attachment {
            container,
            listeners,
        });
    }

    /// Releases every listener and pending timer and unmounts the surface.
    /// Returns the container, or `None` when nothing was attached.
    pub fn detach(&mut self) -> Option<Box<dyn Container>> {
        let Attachment {
            mut container,
            mut listeners,
        } = self.attachment.take()?;
        self.drag.release();
        self.debouncer.cancel();
        listeners.clear();
        container.unmount();
        tracing::info!("crop surface detached");
        Some(container)
    }

    pub fn handle_event(&mut self, event: SurfaceEvent) {
        if self.attachment.is_none() {
            tracing::trace!(?event, "event for detached surface ignored");
            return;
        }
        match event {
            SurfaceEvent::PointerMoved(input) => {
                if let Some(position) = input.position() {
                    self.hover(position);
                }
            }
            SurfaceEvent::PointerPressed(input) => self.press(&input),
            SurfaceEvent::DragMoved(input) => self.drag_to(&input),
            SurfaceEvent::PointerReleased => {
                self.drag.release();
            }
            SurfaceEvent::WindowResized => {
                if let Some(attachment) = self.attachment.as_mut() {
                    self.debouncer.trigger(attachment.container.as_mut());
                }
            }
            SurfaceEvent::ResizeSettled => self.settle_resize(),
        }
    }

    /// Interaction a press at `pointer` (client coordinates) would start.
    pub fn interaction_at(&self, pointer: Point) -> InteractionMode {
        if self.image.is_none() {
            return InteractionMode::None;
        }
        let boundary = self.image_boundary();
        let local = to_boundary_local(pointer, self.surface_offset(), boundary);
        resolve_interaction(local, self.crop, boundary, self.handle_margin_px)
    }

    /// Starts an asynchronous load. Only the most recently issued request is
    /// applied by [`CropSurface::finish_load`].
    pub fn load_image(&mut self, source: &str) -> LoadRequest {
        self.load_generation += 1;
        tracing::info!(generation = self.load_generation, "image load requested");
        LoadRequest {
            generation: self.load_generation,
            source: source.to_string(),
        }
    }

    pub fn finish_load(&mut self, completion: LoadCompletion) -> LoadOutcome {
        if completion.generation != self.load_generation {
            tracing::debug!(
                generation = completion.generation,
                latest = self.load_generation,
                "discarding superseded image load"
            );
            return LoadOutcome::Superseded;
        }
        match completion.result {
            Ok(pixels) => {
                let (width, height) = pixels.dimensions();
                self.replace_image(SourceImage {
                    id: completion.generation,
                    pixels,
                });
                tracing::info!(width, height, "image loaded");
                LoadOutcome::Applied { width, height }
            }
            Err(err) => {
                tracing::warn!(%err, "image load failed; keeping current image");
                if let Some(attachment) = self.attachment.as_mut() {
                    attachment.container.notify(SurfaceNotice::LoadFailed {
                        reason: err.to_string(),
                    });
                }
                LoadOutcome::Failed(err)
            }
        }
    }

    /// Loads and decodes on the calling thread.
    pub fn load_image_blocking(&mut self, source: &str) -> LoadOutcome {
        let request = self.load_image(source);
        self.finish_load(request.decode())
    }

    /// PNG bytes of the current crop at the source image's full resolution.
    pub fn export_cropped_image(&self) -> SurfaceResult<Vec<u8>> {
        let image = self.image.as_ref().ok_or(SurfaceError::NoImage)?;
        let cropped = export::crop_image(&image.pixels, self.crop)?;
        export::encode_png(&cropped)
    }

    pub fn export_data_url(&self) -> SurfaceResult<String> {
        let bytes = self.export_cropped_image()?;
        Ok(export::png_data_url(&bytes))
    }

    /// Makes the current crop the new base image and resets the selection.
    /// Counts as a load: any in-flight request is superseded.
    pub fn commit_crop(&mut self) -> SurfaceResult<String> {
        let image = self.image.as_ref().ok_or(SurfaceError::NoImage)?;
        let cropped = export::crop_image(&image.pixels, self.crop)?;
        let bytes = export::encode_png(&cropped)?;
        self.load_generation += 1;
        tracing::info!(
            width = cropped.width(),
            height = cropped.height(),
            "crop committed"
        );
        self.replace_image(SourceImage {
            id: self.load_generation,
            pixels: cropped,
        });
        Ok(export::png_data_url(&bytes))
    }

    pub fn render(&self, canvas: &mut dyn Canvas) {
        render_frame(
            canvas,
            self.surface_size,
            self.image.as_ref(),
            self.crop,
            &self.style,
        );
    }

    fn surface_offset(&self) -> Point {
        self.attachment
            .as_ref()
            .map(|attachment| attachment.container.surface_offset())
            .unwrap_or_default()
    }

    fn replace_image(&mut self, image: SourceImage) {
        self.drag.release();
        self.image = Some(image);
        self.crop = CropRect::FULL;
        self.request_redraw();
    }

    fn request_redraw(&mut self) {
        if let Some(attachment) = self.attachment.as_mut() {
            attachment.container.request_redraw();
        }
    }

    fn hover(&mut self, position: Point) -> InteractionMode {
        let mode = self.interaction_at(position);
        let cursor = mode.cursor();
        if cursor != self.cursor {
            self.cursor = cursor;
            if let Some(attachment) = self.attachment.as_mut() {
                attachment.container.set_cursor(cursor);
            }
        }
        mode
    }

    fn press(&mut self, input: &PointerInput) {
        if !input.is_primary() {
            return;
        }
        let Some(position) = input.position() else {
            return;
        };
        let mode = self.hover(position);
        if !mode.is_active() {
            return;
        }
        let Some(anchor) = to_normalized(position, self.surface_offset(), self.image_boundary())
        else {
            return;
        };
        let Some(attachment) = self.attachment.as_mut() else {
            return;
        };
        let listeners = EventKind::DRAG
            .into_iter()
            .map(|kind| attachment.container.listen(kind))
            .collect();
        self.drag.begin(mode, anchor, self.crop, listeners);
    }

    fn drag_to(&mut self, input: &PointerInput) {
        if !self.drag.is_dragging() {
            return;
        }
        let Some(position) = input.position() else {
            return;
        };
        let Some(pointer) = to_normalized(position, self.surface_offset(), self.image_boundary())
        else {
            return;
        };
        if let Some(next) = self.drag.update(pointer, self.crop) {
            self.crop = next;
            self.request_redraw();
        }
    }

    fn settle_resize(&mut self) {
        if !self.debouncer.settle() {
            return;
        }
        let Some(attachment) = self.attachment.as_mut() else {
            return;
        };
        self.surface_size = attachment.container.content_box().inner_size();
        tracing::debug!(
            width = self.surface_size.width,
            height = self.surface_size.height,
            "surface resized"
        );
        attachment.container.request_redraw();
    }
}

impl Drop for CropSurface {
    fn drop(&mut self) {
        self.detach();
    }
}
