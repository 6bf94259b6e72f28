//! Notification list with read-state filters, and the unread badge.

use serde_json::Value;
use std::cell::{Cell, RefCell};

use crate::constants::MSG_NOTIFICATIONS_LOAD_FAILED;
use crate::context::AppContext;
use crate::errors::AppResult;
use crate::handlers::PageState;
use crate::log_data;
use crate::models::{id_segment, Notification, UnreadCount};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NotificationFilter {
    #[default]
    All,
    Unread,
    Read,
}

impl NotificationFilter {
    /// Value of the `is_read` query parameter.
    pub fn is_read(self) -> Option<bool> {
        match self {
            NotificationFilter::All => None,
            NotificationFilter::Unread => Some(false),
            NotificationFilter::Read => Some(true),
        }
    }

    pub fn empty_message(self) -> String {
        match self {
            NotificationFilter::All => "You have no notifications.".to_string(),
            NotificationFilter::Unread => "You have no unread notifications.".to_string(),
            NotificationFilter::Read => "You have no read notifications.".to_string(),
        }
    }
}

pub fn notification_icon(notification_type: Option<&str>) -> &'static str {
    match notification_type {
        Some("delivery_success") => "🎉",
        Some("delivery_fail") => "⚠️",
        Some("new_shared_capsule") => "📬",
        Some("reminder") => "🔔",
        Some("system_alert") => "📢",
        Some("transfer_notification") => "🔄",
        _ => "ℹ️",
    }
}

pub struct NotificationsPage {
    ctx: AppContext,
    page: PageState,
    filter: Cell<NotificationFilter>,
    items: RefCell<Vec<Notification>>,
}

impl NotificationsPage {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            page: PageState::new("notifications"),
            filter: Cell::new(NotificationFilter::All),
            items: RefCell::new(Vec::new()),
        }
    }

    pub fn state(&self) -> &PageState {
        &self.page
    }

    pub fn filter(&self) -> NotificationFilter {
        self.filter.get()
    }

    pub fn items(&self) -> Vec<Notification> {
        self.items.borrow().clone()
    }

    /// Switches filter and reloads.
    pub async fn set_filter(&self, filter: NotificationFilter) -> AppResult<()> {
        self.filter.set(filter);
        self.load().await
    }

    /// Load failures show a fixed message inline only.
    pub async fn load(&self) -> AppResult<()> {
        let filter = self.filter.get();
        self.page.begin();
        let result = self.ctx.api.notifications(filter.is_read()).await;
        if !self.page.is_alive() {
            return result.map(|_| ());
        }
        // A filter change during the request makes this answer stale; the
        // newer request still owns the loading flag.
        if self.filter.get() != filter {
            return result.map(|_| ());
        }
        self.page.finish();

        match result {
            Ok(items) => {
                self.items.replace(items);
                Ok(())
            }
            Err(e) => {
                self.page.logger().warn(
                    "Loading notifications failed",
                    log_data!("error" => e.to_string()),
                );
                self.items.replace(Vec::new());
                self.page.show_inline(MSG_NOTIFICATIONS_LOAD_FAILED);
                Err(e)
            }
        }
    }

    /// Marks one notification read; a failure is logged and leaves the list as is.
    pub async fn mark_read(&self, id: &Value) -> AppResult<()> {
        let result = self.ctx.api.mark_notification_read(&id_segment(id)).await;
        if !self.page.is_alive() {
            return result;
        }
        match result {
            Ok(()) => {
                for item in self.items.borrow_mut().iter_mut().filter(|n| &n.id == id) {
                    item.is_read = true;
                }
                Ok(())
            }
            Err(e) => {
                self.page.logger().error(
                    "Marking notification read failed",
                    log_data!("id" => id_segment(id), "error" => e.to_string()),
                );
                Err(e)
            }
        }
    }

    pub async fn mark_all_read(&self) -> AppResult<()> {
        let result = self.ctx.api.mark_all_notifications_read().await;
        if !self.page.is_alive() {
            return result;
        }
        match result {
            Ok(()) => {
                for item in self.items.borrow_mut().iter_mut() {
                    item.is_read = true;
                }
                Ok(())
            }
            Err(e) => {
                self.page.fail(
                    &self.ctx,
                    "Marking all notifications read failed",
                    &e,
                    "Failed to mark notifications as read.",
                );
                Err(e)
            }
        }
    }

    pub fn unmount(&self) {
        self.page.unmount();
    }
}

/// Unread counter shown in the navigation bar.
pub struct NotificationBadge {
    ctx: AppContext,
    count: Cell<UnreadCount>,
}

impl NotificationBadge {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            count: Cell::new(UnreadCount::default()),
        }
    }

    /// Refreshes the count. Anonymous sessions and failures show no badge.
    pub async fn refresh(&self) -> Option<String> {
        if self.ctx.api.store().get().is_anonymous() {
            self.count.set(UnreadCount::default());
            return None;
        }
        let count = self.ctx.api.unread_count().await.unwrap_or_default();
        self.count.set(count);
        count.badge()
    }

    pub fn text(&self) -> Option<String> {
        self.count.get().badge()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{
        ENDPOINT_NOTIFICATIONS, ENDPOINT_NOTIFICATIONS_MARK_ALL, ENDPOINT_NOTIFICATIONS_UNREAD,
    };
    use crate::context::testing::harness;
    use crate::session::Session;
    use futures::executor::block_on;
    use http::Method;
    use serde_json::json;

    fn items() -> Value {
        json!([
            { "id": 1, "message": "Your capsule was delivered", "is_read": false,
              "notification_type": "delivery_success" },
            { "id": 2, "message": "Reminder", "is_read": false, "notification_type": "reminder" }
        ])
    }

    #[test]
    fn filter_is_sent_and_list_replaced() {
        let h = harness(Session::with_token("tok"));
        h.transport
            .respond(Method::GET, ENDPOINT_NOTIFICATIONS, 200, items());
        let page = NotificationsPage::new(h.ctx.clone());

        block_on(page.set_filter(NotificationFilter::Unread)).unwrap();

        assert_eq!(page.items().len(), 2);
        assert!(h.transport.requests()[0].url.ends_with("?is_read=false"));
        assert_eq!(
            NotificationFilter::Read.empty_message(),
            "You have no read notifications."
        );
    }

    #[test]
    fn stale_answer_keeps_newer_request_loading() {
        let h = harness(Session::with_token("tok"));
        h.transport
            .respond(Method::GET, ENDPOINT_NOTIFICATIONS, 200, items());
        let page = std::rc::Rc::new(NotificationsPage::new(h.ctx.clone()));
        let switcher = page.clone();
        h.transport.on_send(move |_| {
            // The user picks another filter while the first request is out.
            switcher.filter.set(NotificationFilter::Read);
            switcher.page.begin();
        });

        block_on(page.load()).unwrap();

        assert!(page.state().is_loading());
        assert!(page.items().is_empty());
    }

    #[test]
    fn mark_read_updates_local_state() {
        let h = harness(Session::with_token("tok"));
        h.transport
            .respond(Method::GET, ENDPOINT_NOTIFICATIONS, 200, items());
        h.transport.respond(
            Method::POST,
            "capsules/notifications/2/mark-read/",
            200,
            json!({}),
        );
        let page = NotificationsPage::new(h.ctx.clone());
        block_on(page.load()).unwrap();

        block_on(page.mark_read(&json!(2))).unwrap();

        let items = page.items();
        assert!(!items[0].is_read);
        assert!(items[1].is_read);
    }

    #[test]
    fn failed_mark_read_leaves_list() {
        let h = harness(Session::with_token("tok"));
        h.transport
            .respond(Method::GET, ENDPOINT_NOTIFICATIONS, 200, items());
        let page = NotificationsPage::new(h.ctx.clone());
        block_on(page.load()).unwrap();

        assert!(block_on(page.mark_read(&json!(1))).is_err());
        assert!(page.items().iter().all(|n| !n.is_read));
        assert!(h.ctx.feedback.current().is_none());
    }

    #[test]
    fn mark_all_read() {
        let h = harness(Session::with_token("tok"));
        h.transport
            .respond(Method::GET, ENDPOINT_NOTIFICATIONS, 200, items());
        h.transport
            .respond(Method::POST, ENDPOINT_NOTIFICATIONS_MARK_ALL, 200, json!({}));
        let page = NotificationsPage::new(h.ctx.clone());
        block_on(page.load()).unwrap();

        block_on(page.mark_all_read()).unwrap();
        assert!(page.items().iter().all(|n| n.is_read));
    }

    #[test]
    fn load_failure_uses_fixed_message() {
        let h = harness(Session::with_token("tok"));
        h.transport.respond(
            Method::GET,
            ENDPOINT_NOTIFICATIONS,
            500,
            json!({ "detail": "boom" }),
        );
        let page = NotificationsPage::new(h.ctx.clone());

        assert!(block_on(page.load()).is_err());
        assert_eq!(
            page.state().error().as_deref(),
            Some(MSG_NOTIFICATIONS_LOAD_FAILED)
        );
    }

    #[test]
    fn badge_reflects_unread_count() {
        let h = harness(Session::with_token("tok"));
        h.transport.respond(
            Method::GET,
            ENDPOINT_NOTIFICATIONS_UNREAD,
            200,
            json!({ "unread_count": 14 }),
        );
        let badge = NotificationBadge::new(h.ctx.clone());

        assert_eq!(block_on(badge.refresh()).as_deref(), Some("9+"));
        assert_eq!(badge.text().as_deref(), Some("9+"));
    }

    #[test]
    fn badge_is_hidden_for_guests() {
        let h = harness(Session::default());
        let badge = NotificationBadge::new(h.ctx.clone());

        assert_eq!(block_on(badge.refresh()), None);
        assert!(h.transport.requests().is_empty());
    }

    #[test]
    fn icons_by_type() {
        assert_eq!(notification_icon(Some("reminder")), "🔔");
        assert_eq!(notification_icon(None), "ℹ️");
    }
}
