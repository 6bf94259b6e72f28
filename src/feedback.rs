//! # Transient Notices
//!
//! A single shared notice slot (toast) consumed by every page. Showing a new
//! notice replaces the previous one.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::scheduler::{DelayedAction, Scheduler};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub message: String,
    pub kind: NoticeKind,
    /// `None` keeps the notice until hidden explicitly.
    pub duration: Option<Duration>,
    pub visible: bool,
}

pub struct Feedback {
    default_duration: Duration,
    scheduler: Scheduler,
    current: Rc<RefCell<Option<Notice>>>,
    expiry: RefCell<Option<DelayedAction>>,
}

impl Feedback {
    pub fn new(default_duration: Duration, scheduler: Scheduler) -> Self {
        Self {
            default_duration,
            scheduler,
            current: Rc::new(RefCell::new(None)),
            expiry: RefCell::new(None),
        }
    }

    /// Shows a notice. A zero duration makes it sticky; otherwise it hides
    /// itself once the duration elapses.
    pub fn show(&self, message: impl Into<String>, kind: NoticeKind, duration: Option<Duration>) {
        let duration = duration.unwrap_or(self.default_duration);
        let duration = (!duration.is_zero()).then_some(duration);
        *self.current.borrow_mut() = Some(Notice {
            message: message.into(),
            kind,
            duration,
            visible: true,
        });

        // Dropping the previous handle cancels the replaced notice's timer.
        let expiry = duration.map(|delay| {
            let slot = Rc::clone(&self.current);
            self.scheduler.defer(delay, move || hide_slot(&slot))
        });
        self.expiry.replace(expiry);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.show(message, NoticeKind::Success, None);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.show(message, NoticeKind::Error, None);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.show(message, NoticeKind::Info, None);
    }

    pub fn hide(&self) {
        self.expiry.replace(None);
        hide_slot(&self.current);
    }

    /// The visible notice, if any.
    pub fn current(&self) -> Option<Notice> {
        self.current
            .borrow()
            .as_ref()
            .filter(|notice| notice.visible)
            .cloned()
    }
}

fn hide_slot(slot: &RefCell<Option<Notice>>) {
    if let Some(notice) = slot.borrow_mut().as_mut() {
        notice.visible = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::testing::scheduler;

    fn feedback() -> (Feedback, Rc<crate::scheduler::testing::ManualSpawner>) {
        let (scheduler, spawner) = scheduler();
        (Feedback::new(Duration::from_millis(3000), scheduler), spawner)
    }

    #[test]
    fn newest_notice_replaces_previous() {
        let (feedback, _spawner) = feedback();
        feedback.info("first");
        feedback.error("second");
        let notice = feedback.current().unwrap();
        assert_eq!(notice.message, "second");
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.duration, Some(Duration::from_millis(3000)));
    }

    #[test]
    fn notice_expires_after_its_duration() {
        let (feedback, spawner) = feedback();
        feedback.error("Failed to create capsule");
        assert!(feedback.current().is_some());

        assert_eq!(spawner.run_all(), 1);
        assert!(feedback.current().is_none());
    }

    #[test]
    fn zero_duration_is_sticky_and_hide_clears() {
        let (feedback, spawner) = feedback();
        feedback.show("stay", NoticeKind::Info, Some(Duration::ZERO));
        assert_eq!(feedback.current().unwrap().duration, None);
        assert_eq!(spawner.pending(), 0);

        feedback.hide();
        assert!(feedback.current().is_none());
    }

    #[test]
    fn replaced_notice_timer_does_not_hide_successor() {
        let (feedback, spawner) = feedback();
        feedback.info("first");
        feedback.show("second", NoticeKind::Success, Some(Duration::ZERO));

        assert_eq!(spawner.run_all(), 0);
        assert_eq!(feedback.current().map(|n| n.message), Some("second".to_string()));
    }
}
