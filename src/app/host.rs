use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::time::Duration;

use gtk4::prelude::*;
use gtk4::{Box as GtkBox, DrawingArea};

use crate::editor::CursorHint;
use crate::geometry::{ContentBox, Padding};
use crate::input::{PointerButton, PointerInput};
use crate::notification;
use crate::surface::{
    Container, CropSurface, EventKind, Subscription, SurfaceEvent, SurfaceNotice,
};

pub(super) type Dispatch = Rc<dyn Fn(SurfaceEvent)>;

/// Routes gtk signals into the surface. Holds the surface weakly so widget
/// closures never keep it alive.
pub(super) fn surface_dispatcher(surface: &Rc<RefCell<CropSurface>>) -> Dispatch {
    let surface: Weak<RefCell<CropSurface>> = Rc::downgrade(surface);
    Rc::new(move |event| {
        let Some(surface) = surface.upgrade() else {
            return;
        };
        match surface.try_borrow_mut() {
            Ok(mut surface) => surface.handle_event(event),
            Err(_) => tracing::warn!(?event, "crop surface busy; dropping event"),
        }
    })
}

/// Event kinds the surface currently listens for, with reference counts.
#[derive(Debug, Default, Clone)]
pub(super) struct LiveKinds {
    counts: Rc<RefCell<HashMap<EventKind, usize>>>,
}

impl LiveKinds {
    pub(super) fn is_live(&self, kind: EventKind) -> bool {
        self.counts.borrow().get(&kind).is_some_and(|count| *count > 0)
    }

    fn acquire(&self, kind: EventKind) -> Subscription {
        *self.counts.borrow_mut().entry(kind).or_default() += 1;
        let counts = Rc::clone(&self.counts);
        Subscription::new(move || {
            if let Some(count) = counts.borrow_mut().get_mut(&kind) {
                *count = count.saturating_sub(1);
            }
        })
    }
}

/// The gtk side of a crop surface: a `DrawingArea` mounted into a box.
pub(super) struct GtkContainer {
    parent: GtkBox,
    canvas: DrawingArea,
    live: LiveKinds,
    dispatch: Dispatch,
}

impl GtkContainer {
    pub(super) fn new(parent: GtkBox, canvas: DrawingArea, dispatch: Dispatch) -> Self {
        let live = LiveKinds::default();
        connect_canvas_controllers(&canvas, &live, &dispatch);
        Self {
            parent,
            canvas,
            live,
            dispatch,
        }
    }
}

impl Container for GtkContainer {
    fn content_box(&self) -> ContentBox {
        ContentBox::new(
            f64::from(self.canvas.width()),
            f64::from(self.canvas.height()),
            Padding::default(),
        )
    }

    fn mount(&mut self) {
        if self.canvas.parent().is_none() {
            self.parent.append(&self.canvas);
        }
    }

    fn unmount(&mut self) {
        if self.canvas.parent().is_some() {
            self.parent.remove(&self.canvas);
        }
    }

    fn listen(&mut self, kind: EventKind) -> Subscription {
        self.live.acquire(kind)
    }

    fn schedule(&mut self, delay: Duration) -> Subscription {
        // Taken before the timer fires: removing a fired source panics.
        let source: Rc<RefCell<Option<gtk4::glib::SourceId>>> = Rc::new(RefCell::new(None));
        let source_for_timer = Rc::clone(&source);
        let dispatch = Rc::clone(&self.dispatch);
        let id = gtk4::glib::timeout_add_local_once(delay, move || {
            source_for_timer.borrow_mut().take();
            dispatch(SurfaceEvent::ResizeSettled);
        });
        *source.borrow_mut() = Some(id);
        Subscription::new(move || {
            if let Some(id) = source.borrow_mut().take() {
                id.remove();
            }
        })
    }

    fn set_cursor(&mut self, cursor: CursorHint) {
        self.canvas.set_cursor_from_name(cursor.css_name());
    }

    fn request_redraw(&mut self) {
        self.canvas.queue_draw();
    }

    fn notify(&mut self, notice: SurfaceNotice) {
        notification::send_notice(&notice);
    }
}

fn is_touch_event<G: IsA<gtk4::EventController>>(controller: &G) -> bool {
    controller
        .current_event_device()
        .is_some_and(|device| device.source() == gtk4::gdk::InputSource::Touchscreen)
}

fn pointer_input(touch: bool, x: f64, y: f64, button: Option<PointerButton>) -> PointerInput {
    if touch {
        PointerInput::touch(x, y)
    } else {
        match button {
            Some(button) => PointerInput::mouse_button(x, y, button),
            None => PointerInput::mouse(x, y),
        }
    }
}

fn connect_canvas_controllers(canvas: &DrawingArea, live: &LiveKinds, dispatch: &Dispatch) {
    let motion = gtk4::EventControllerMotion::new();
    {
        let live = live.clone();
        let dispatch = Rc::clone(dispatch);
        motion.connect_motion(move |_, x, y| {
            if live.is_live(EventKind::PointerMove) && !live.is_live(EventKind::DragMove) {
                dispatch(SurfaceEvent::PointerMoved(PointerInput::mouse(x, y)));
            }
        });
    }
    canvas.add_controller(motion);

    let drag = gtk4::GestureDrag::new();
    drag.set_button(0);
    drag.set_touch_only(false);
    {
        let live = live.clone();
        let dispatch = Rc::clone(dispatch);
        drag.connect_drag_begin(move |gesture, x, y| {
            let touch = is_touch_event(gesture);
            let kind = if touch {
                EventKind::TouchStart
            } else {
                EventKind::PointerDown
            };
            if !live.is_live(kind) {
                return;
            }
            let button = PointerButton::from_index(gesture.current_button());
            dispatch(SurfaceEvent::PointerPressed(pointer_input(
                touch,
                x,
                y,
                Some(button),
            )));
        });
    }
    {
        let live = live.clone();
        let dispatch = Rc::clone(dispatch);
        drag.connect_drag_update(move |gesture, offset_x, offset_y| {
            let touch = is_touch_event(gesture);
            let kind = if touch {
                EventKind::TouchMove
            } else {
                EventKind::DragMove
            };
            if !live.is_live(kind) {
                return;
            }
            let Some((start_x, start_y)) = gesture.start_point() else {
                return;
            };
            dispatch(SurfaceEvent::DragMoved(pointer_input(
                touch,
                start_x + offset_x,
                start_y + offset_y,
                None,
            )));
        });
    }
    {
        let live = live.clone();
        let dispatch = Rc::clone(dispatch);
        drag.connect_drag_end(move |_, _, _| {
            if live.is_live(EventKind::PointerUp) || live.is_live(EventKind::TouchEnd) {
                dispatch(SurfaceEvent::PointerReleased);
            }
        });
    }
    canvas.add_controller(drag);

    let live = live.clone();
    let dispatch = Rc::clone(dispatch);
    canvas.connect_resize(move |_, width, height| {
        if live.is_live(EventKind::WindowResize) {
            tracing::trace!(width, height, "canvas resized");
            dispatch(SurfaceEvent::WindowResized);
        }
    });
}
