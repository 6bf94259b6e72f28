//! # Page Controllers
//!
//! One controller per page. Controllers hold the page's view state, call the
//! API through the shared [`AppContext`], report outcomes through the notice
//! center and navigate through the [`Navigator`](crate::router::Navigator).
//!
//! ## Pages
//!
//! - **auth**: login, registration, email verification, password reset, logout
//! - **dashboard**: capsule listing by status, capsule details, deletion
//! - **notifications**: filtered list, mark read, unread badge
//! - **profile**: profile edit and password change
//! - **public**: recipient view by access token
//!
//! ## Error Flow
//!
//! ```text
//! validation failure → inline error + error notice, no request
//! API failure        → server message (or page fallback) inline + notice
//! 401 on lookup      → session cleared, redirect to /login
//! ```

use std::cell::{Cell, RefCell};

use crate::context::AppContext;
use crate::errors::AppError;
use crate::log_data;
use crate::logging::Logger;
use crate::scheduler::{DelayedAction, Liveness};

pub mod auth;
pub mod dashboard;
pub mod notifications;
pub mod profile;
pub mod public;

/// View state every page carries: liveness, loading flag, inline error and
/// a pending deferred navigation.
pub struct PageState {
    liveness: Liveness,
    loading: Cell<bool>,
    error: RefCell<Option<String>>,
    redirect: RefCell<Option<DelayedAction>>,
    logger: Logger,
}

impl PageState {
    pub fn new(component: &str) -> Self {
        Self {
            liveness: Liveness::new(),
            loading: Cell::new(false),
            error: RefCell::new(None),
            redirect: RefCell::new(None),
            logger: Logger::for_component(component),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.liveness.is_alive()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    pub fn error(&self) -> Option<String> {
        self.error.borrow().clone()
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Marks the start of an action: loading on, previous error cleared.
    pub fn begin(&self) {
        self.loading.set(true);
        self.error.replace(None);
    }

    pub fn finish(&self) {
        self.loading.set(false);
    }

    pub fn clear_error(&self) {
        self.error.replace(None);
    }

    /// Inline error without a notice.
    pub fn show_inline(&self, message: impl Into<String>) {
        self.error.replace(Some(message.into()));
    }

    /// Shows `message` inline and as an error notice.
    pub fn show_error(&self, ctx: &AppContext, message: impl Into<String>) -> String {
        let message = message.into();
        ctx.feedback.error(message.as_str());
        self.error.replace(Some(message.clone()));
        message
    }

    /// Logs the failure and shows the server's message, or `fallback`.
    pub fn fail(&self, ctx: &AppContext, action: &str, err: &AppError, fallback: &str) -> String {
        self.logger.warn(
            action,
            log_data!("error" => err.to_string()),
        );
        self.show_error(ctx, err.user_message(fallback))
    }

    /// Keeps the deferred navigation alive until the page unmounts.
    pub fn hold_redirect(&self, redirect: DelayedAction) {
        self.redirect.replace(Some(redirect));
    }

    pub fn has_pending_redirect(&self) -> bool {
        self.redirect
            .borrow()
            .as_ref()
            .is_some_and(|redirect| !redirect.is_cancelled())
    }

    pub fn unmount(&self) {
        self.liveness.unmount();
        if let Some(redirect) = self.redirect.take() {
            redirect.cancel();
        }
    }
}
