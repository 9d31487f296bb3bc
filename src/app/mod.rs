use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use anyhow::Context as _;
use gtk4::prelude::*;
use gtk4::{
    Application, ApplicationWindow, Box as GtkBox, Button, DrawingArea, FileDialog, Label,
    Orientation,
};

use crate::config::CropperConfig;
use crate::error::AppResult;
use crate::notification;
use crate::surface::{CropSurface, ImageSource, LoadOutcome};

mod canvas;
mod host;
mod worker;

use self::canvas::{CairoCanvas, ImageSurfaceCache};
use self::host::{surface_dispatcher, GtkContainer};
use self::worker::spawn_decode;

const APP_ID: &str = "io.github.cropper.Cropper";
const CONTROL_SPACING: i32 = 6;

pub struct App {
    config: CropperConfig,
    initial_source: Option<String>,
}

impl App {
    pub fn new(config: CropperConfig, initial_source: Option<String>) -> Self {
        Self {
            config,
            initial_source,
        }
    }

    pub fn start(&mut self) -> AppResult<()> {
        if let Some(source) = self.initial_source.as_deref() {
            ImageSource::parse(source)?;
        }

        let application = Application::new(Some(APP_ID), gtk4::gio::ApplicationFlags::NON_UNIQUE);
        let config = self.config.clone();
        let initial_source = self.initial_source.clone();
        application.connect_activate(move |app| {
            build_window(app, &config, initial_source.as_deref());
        });

        // GTK only sees argv[0]; the image argument is ours.
        let gtk_args: Vec<String> = std::env::args().take(1).collect();
        let status = application.run_with_args(&gtk_args);
        tracing::info!(?status, "gtk main loop exited");
        Ok(())
    }
}

#[derive(Clone)]
struct WindowRuntime {
    window: ApplicationWindow,
    surface: Rc<RefCell<CropSurface>>,
    status: Label,
}

impl WindowRuntime {
    fn set_status(&self, text: &str) {
        self.status.set_text(text);
    }
}

fn build_window(app: &Application, config: &CropperConfig, initial_source: Option<&str>) {
    let window = ApplicationWindow::new(app);
    window.set_title(Some("Cropper"));
    window.set_default_size(config.window_width, config.window_height);

    let root = GtkBox::new(Orientation::Vertical, CONTROL_SPACING);
    let controls = GtkBox::new(Orientation::Horizontal, CONTROL_SPACING);
    controls.set_margin_top(CONTROL_SPACING);
    controls.set_margin_start(CONTROL_SPACING);
    controls.set_margin_end(CONTROL_SPACING);
    let open_button = Button::with_label("Open…");
    let crop_button = Button::with_label("Crop");
    let save_button = Button::with_label("Save…");
    let status = Label::new(Some("Open an image to start cropping."));
    status.set_hexpand(true);
    status.set_xalign(1.0);
    controls.append(&open_button);
    controls.append(&crop_button);
    controls.append(&save_button);
    controls.append(&status);

    let surface_host = GtkBox::new(Orientation::Vertical, 0);
    surface_host.set_hexpand(true);
    surface_host.set_vexpand(true);
    root.append(&controls);
    root.append(&surface_host);
    window.set_child(Some(&root));

    let drawing_area = DrawingArea::new();
    drawing_area.set_hexpand(true);
    drawing_area.set_vexpand(true);

    let surface = Rc::new(RefCell::new(CropSurface::new(config)));
    let dispatch = surface_dispatcher(&surface);
    connect_draw(&drawing_area, &surface);
    let container = GtkContainer::new(surface_host, drawing_area, dispatch);
    surface.borrow_mut().attach(Box::new(container));

    let runtime = WindowRuntime {
        window: window.clone(),
        surface,
        status,
    };
    {
        let runtime = runtime.clone();
        open_button.connect_clicked(move |_| open_image_dialog(&runtime));
    }
    {
        let runtime = runtime.clone();
        crop_button.connect_clicked(move |_| commit_crop(&runtime));
    }
    {
        let runtime = runtime.clone();
        save_button.connect_clicked(move |_| save_image_dialog(&runtime));
    }
    {
        let surface = runtime.surface.clone();
        window.connect_close_request(move |_| {
            surface.borrow_mut().detach();
            gtk4::glib::Propagation::Proceed
        });
    }

    if let Some(source) = initial_source {
        start_load(&runtime, source);
    }
    tracing::info!("presenting crop window");
    window.present();
}

fn connect_draw(drawing_area: &DrawingArea, surface: &Rc<RefCell<CropSurface>>) {
    let surface = Rc::downgrade(surface);
    let cache = RefCell::new(ImageSurfaceCache::default());
    drawing_area.set_draw_func(move |_, context, width, height| {
        if width <= 0 || height <= 0 {
            return;
        }
        let Some(surface) = surface.upgrade() else {
            return;
        };
        let Ok(surface) = surface.try_borrow() else {
            tracing::debug!("skipping draw while surface is busy");
            return;
        };
        let mut canvas = CairoCanvas::new(context, &cache);
        surface.render(&mut canvas);
    });
}

fn start_load(runtime: &WindowRuntime, source: &str) {
    let request = runtime.surface.borrow_mut().load_image(source);
    runtime.set_status("Loading…");
    let runtime = runtime.clone();
    spawn_decode(request, move |completion| {
        let outcome = runtime.surface.borrow_mut().finish_load(completion);
        match outcome {
            LoadOutcome::Applied { width, height } => {
                runtime.set_status(&format!("{width} × {height}"));
            }
            LoadOutcome::Superseded => {}
            LoadOutcome::Failed(err) => {
                runtime.set_status(&format!("Could not open image: {err}"));
            }
        }
    });
}

fn open_image_dialog(runtime: &WindowRuntime) {
    let dialog = FileDialog::builder()
        .title("Open Image")
        .modal(true)
        .build();
    let runtime_for_result = runtime.clone();
    dialog.open(
        Some(&runtime.window),
        None::<&gtk4::gio::Cancellable>,
        move |result| match result {
            Ok(file) => match file.path() {
                Some(path) => start_load(&runtime_for_result, &path.to_string_lossy()),
                None => tracing::warn!(uri = %file.uri(), "selected file has no local path"),
            },
            Err(err) => tracing::debug!(?err, "open dialog dismissed"),
        },
    );
}

fn commit_crop(runtime: &WindowRuntime) {
    let result = runtime.surface.borrow_mut().commit_crop();
    match result {
        Ok(_) => {
            let surface = runtime.surface.borrow();
            if let Some(image) = surface.image() {
                runtime.set_status(&format!("{} × {}", image.width(), image.height()));
            }
        }
        Err(err) => {
            tracing::warn!(%err, "crop commit failed");
            runtime.set_status(&format!("Could not crop: {err}"));
        }
    }
}

fn save_image_dialog(runtime: &WindowRuntime) {
    let dialog = FileDialog::builder()
        .title("Save Cropped Image")
        .initial_name("cropped.png")
        .modal(true)
        .build();
    let runtime_for_result = runtime.clone();
    dialog.save(
        Some(&runtime.window),
        None::<&gtk4::gio::Cancellable>,
        move |result| {
            let Ok(file) = result else {
                tracing::debug!("save dialog dismissed");
                return;
            };
            let Some(path) = file.path() else {
                tracing::warn!(uri = %file.uri(), "save target has no local path");
                return;
            };
            let saved = save_cropped_image(&runtime_for_result.surface.borrow(), &path);
            match saved {
                Ok(()) => {
                    tracing::info!(path = %path.display(), "saved cropped image");
                    runtime_for_result.set_status(&format!("Saved {}", path.display()));
                }
                Err(err) => {
                    tracing::warn!("{err:#}");
                    notification::send("Could not save image", format!("{err:#}"));
                    runtime_for_result.set_status("Save failed");
                }
            }
        },
    );
}

fn save_cropped_image(surface: &CropSurface, path: &Path) -> anyhow::Result<()> {
    let bytes = surface
        .export_cropped_image()
        .context("failed to export crop")?;
    std::fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::loader::png_data_url;

    #[test]
    fn save_cropped_image_writes_png() {
        let mut surface = CropSurface::new(&CropperConfig::default());
        assert!(surface.load_image_blocking(&png_data_url(12, 6)).is_applied());
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("out.png");

        save_cropped_image(&surface, &path).expect("save should succeed");
        let saved = image::open(&path).expect("saved file should decode");
        assert_eq!((saved.width(), saved.height()), (12, 6));
    }

    #[test]
    fn save_cropped_image_reports_missing_image() {
        let surface = CropSurface::new(&CropperConfig::default());
        let dir = tempfile::tempdir().expect("temp dir");
        let err = save_cropped_image(&surface, &dir.path().join("out.png"))
            .expect_err("no image to save");
        assert!(format!("{err:#}").contains("no image loaded"));
    }
}
