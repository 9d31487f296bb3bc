pub mod app;
pub mod config;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod input;
pub mod logging;
pub mod notification;
pub mod render;
pub mod surface;
pub use error::{AppError, AppResult};

/// Entrypoint used by the binary. `initial_source` is opened once the window
/// is up.
pub fn run(initial_source: Option<String>) -> AppResult<()> {
    logging::init();
    tracing::info!("starting cropper");

    let config = config::load_cropper_config();
    let mut app = app::App::new(config, initial_source);
    app.start()?;

    tracing::info!("shutdown complete");
    Ok(())
}
