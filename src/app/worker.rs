use std::sync::mpsc;
use std::time::Duration;

use crate::surface::{LoadCompletion, LoadRequest};

const DECODE_POLL_INTERVAL: Duration = Duration::from_millis(24);

/// Decodes `request` on a worker thread and hands the completion back on the
/// gtk main loop.
pub(super) fn spawn_decode<H>(request: LoadRequest, on_complete: H)
where
    H: FnOnce(LoadCompletion) + 'static,
{
    let generation = request.generation;
    let (tx, rx) = mpsc::channel::<LoadCompletion>();
    let spawned = std::thread::Builder::new()
        .name(format!("cropper-decode-{generation}"))
        .spawn(move || {
            let _ = tx.send(request.decode());
        });
    if let Err(err) = spawned {
        tracing::error!(?err, generation, "failed to spawn decode worker");
        return;
    }

    let mut on_complete = Some(on_complete);
    gtk4::glib::timeout_add_local(DECODE_POLL_INTERVAL, move || match rx.try_recv() {
        Ok(completion) => {
            if let Some(on_complete) = on_complete.take() {
                on_complete(completion);
            }
            gtk4::glib::ControlFlow::Break
        }
        Err(mpsc::TryRecvError::Empty) => gtk4::glib::ControlFlow::Continue,
        Err(mpsc::TryRecvError::Disconnected) => {
            tracing::warn!(generation, "decode worker exited without a result");
            gtk4::glib::ControlFlow::Break
        }
    });
}
