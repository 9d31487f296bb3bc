use crate::surface::SurfaceNotice;

pub fn send(summary: &str, body: impl Into<String>) {
    let body = body.into();
    if let Err(err) = notify_rust::Notification::new()
        .appname("Cropper")
        .summary(summary)
        .body(&body)
        .show()
    {
        tracing::warn!("system notification failed: {err}");
    }
}

pub fn send_notice(notice: &SurfaceNotice) {
    match notice {
        SurfaceNotice::LoadFailed { reason } => send("Could not open image", reason.as_str()),
    }
}
