use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use crate::editor::CursorHint;
use crate::geometry::ContentBox;

use super::{Container, EventKind, Subscription, SurfaceNotice};

/// Everything the surface asked of its host, observable from tests.
#[derive(Debug, Default)]
pub(crate) struct HostLog {
    pub(crate) content: ContentBox,
    pub(crate) mounted: bool,
    pub(crate) live: HashMap<EventKind, usize>,
    pub(crate) listened: usize,
    pub(crate) disposed: usize,
    pub(crate) timers_scheduled: usize,
    pub(crate) live_timers: usize,
    pub(crate) cursor: CursorHint,
    pub(crate) redraws: usize,
    pub(crate) notices: Vec<SurfaceNotice>,
}

impl HostLog {
    pub(crate) fn is_live(&self, kind: EventKind) -> bool {
        self.live.get(&kind).copied().unwrap_or(0) > 0
    }

    pub(crate) fn live_listeners(&self) -> usize {
        self.live.values().sum()
    }
}

pub(crate) struct FakeContainer {
    log: Rc<RefCell<HostLog>>,
}

impl FakeContainer {
    pub(crate) fn new(content: ContentBox) -> (Self, Rc<RefCell<HostLog>>) {
        let log = Rc::new(RefCell::new(HostLog {
            content,
            ..HostLog::default()
        }));
        (
            Self {
                log: Rc::clone(&log),
            },
            log,
        )
    }
}

impl Container for FakeContainer {
    fn content_box(&self) -> ContentBox {
        self.log.borrow().content
    }

    fn mount(&mut self) {
        self.log.borrow_mut().mounted = true;
    }

    fn unmount(&mut self) {
        self.log.borrow_mut().mounted = false;
    }

    fn listen(&mut self, kind: EventKind) -> Subscription {
        {
            let mut log = self.log.borrow_mut();
            *log.live.entry(kind).or_default() += 1;
            log.listened += 1;
        }
        let log = Rc::clone(&self.log);
        Subscription::new(move || {
            let mut log = log.borrow_mut();
            if let Some(count) = log.live.get_mut(&kind) {
                *count -= 1;
            }
            log.disposed += 1;
        })
    }

    fn schedule(&mut self, _delay: Duration) -> Subscription {
        {
            let mut log = self.log.borrow_mut();
            log.timers_scheduled += 1;
            log.live_timers += 1;
        }
        let log = Rc::clone(&self.log);
        Subscription::new(move || log.borrow_mut().live_timers -= 1)
    }

    fn set_cursor(&mut self, cursor: CursorHint) {
        self.log.borrow_mut().cursor = cursor;
    }

    fn request_redraw(&mut self) {
        self.log.borrow_mut().redraws += 1;
    }

    fn notify(&mut self, notice: SurfaceNotice) {
        self.log.borrow_mut().notices.push(notice);
    }
}
