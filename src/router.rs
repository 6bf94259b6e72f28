//! # Client-Side Routing
//!
//! This module maps application paths onto a closed [`Route`] set and
//! classifies each route by the session it requires. Navigation itself is a
//! side effect performed through the [`Navigator`] trait so that pages can be
//! exercised without a browser history.
//!
//! ## Routes
//!
//! - `/login`, `/register` - guest-only entry pages
//! - `/dashboard`, `/create-capsule`, `/capsule/{id}`, `/notifications`,
//!   `/profile` - protected, wrapped by the session gate
//! - `/`, `/verify-email`, `/forgot-password`, `/view-capsule/{token}` - public
//! - anything else - not found

use std::cell::RefCell;

use crate::constants::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Register,
    VerifyEmail,
    ForgotPassword,
    Dashboard,
    CreateCapsule,
    CapsuleDetails(String),
    Notifications,
    Profile,
    PublicCapsule(String),
    NotFound(String),
}

/// Session requirement of a route.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    /// Rendered only for an authenticated session; otherwise redirect to `/login`.
    Protected,
    /// Login/registration; an authenticated session is sent to the dashboard.
    GuestOnly,
    Public,
}

impl Route {
    /// Parses a location path; query strings and trailing slashes are ignored.
    pub fn parse(location: &str) -> Self {
        let path = location.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Route::Home,
            ["login"] => Route::Login,
            ["register"] => Route::Register,
            ["verify-email"] => Route::VerifyEmail,
            ["forgot-password"] => Route::ForgotPassword,
            ["dashboard"] => Route::Dashboard,
            ["create-capsule"] => Route::CreateCapsule,
            ["capsule", id] => Route::CapsuleDetails(id.to_string()),
            ["notifications"] => Route::Notifications,
            ["profile"] => Route::Profile,
            ["view-capsule", token] => Route::PublicCapsule(token.to_string()),
            _ => Route::NotFound(path.to_string()),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => ROUTE_HOME.to_string(),
            Route::Login => ROUTE_LOGIN.to_string(),
            Route::Register => ROUTE_REGISTER.to_string(),
            Route::VerifyEmail => ROUTE_VERIFY_EMAIL.to_string(),
            Route::ForgotPassword => ROUTE_FORGOT_PASSWORD.to_string(),
            Route::Dashboard => ROUTE_DASHBOARD.to_string(),
            Route::CreateCapsule => ROUTE_CREATE_CAPSULE.to_string(),
            Route::CapsuleDetails(id) => format!("/capsule/{}", id),
            Route::Notifications => ROUTE_NOTIFICATIONS.to_string(),
            Route::Profile => ROUTE_PROFILE.to_string(),
            Route::PublicCapsule(token) => format!("/view-capsule/{}", token),
            Route::NotFound(path) => path.clone(),
        }
    }

    pub fn access(&self) -> Access {
        match self {
            Route::Dashboard
            | Route::CreateCapsule
            | Route::CapsuleDetails(_)
            | Route::Notifications
            | Route::Profile => Access::Protected,
            Route::Login | Route::Register => Access::GuestOnly,
            Route::Home
            | Route::VerifyEmail
            | Route::ForgotPassword
            | Route::PublicCapsule(_)
            | Route::NotFound(_) => Access::Public,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NavigateOptions {
    /// Replace the current history entry instead of pushing.
    pub replace: bool,
    /// Location the user originally asked for, for a post-login return.
    pub from: Option<String>,
    /// Email handed to the verification page.
    pub email: Option<String>,
}

impl NavigateOptions {
    pub fn replace_from(from: impl Into<String>) -> Self {
        Self {
            replace: true,
            from: Some(from.into()),
            email: None,
        }
    }

    pub fn with_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Self::default()
        }
    }
}

/// Performs navigation in the host application.
pub trait Navigator {
    fn navigate(&self, path: &str, options: NavigateOptions);
}

/// Navigator that only records requested navigations.
///
/// Used by host-side tooling and by tests.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visits: RefCell<Vec<(String, NavigateOptions)>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visits(&self) -> Vec<(String, NavigateOptions)> {
        self.visits.borrow().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.visits.borrow().iter().map(|(p, _)| p.clone()).collect()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str, options: NavigateOptions) {
        self.visits.borrow_mut().push((path.to_string(), options));
    }
}

#[cfg(target_arch = "wasm32")]
pub use history::HistoryNavigator;

#[cfg(target_arch = "wasm32")]
mod history {
    use super::*;
    use crate::log_data;
    use crate::logging::Logger;
    use serde_json::json;
    use worker::wasm_bindgen::JsValue;

    /// Navigator over `window.history`.
    ///
    /// The `from` and `email` hand-offs travel as the entry's state object.
    /// The host listens for `popstate` and re-renders from `location.pathname`.
    pub struct HistoryNavigator {
        logger: Logger,
    }

    impl HistoryNavigator {
        pub fn new() -> Self {
            Self {
                logger: Logger::for_component("navigator"),
            }
        }
    }

    impl Default for HistoryNavigator {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Navigator for HistoryNavigator {
        fn navigate(&self, path: &str, options: NavigateOptions) {
            let Some(history) = web_sys::window().and_then(|w| w.history().ok()) else {
                self.logger
                    .error("History API unavailable", log_data!("path" => path));
                return;
            };
            let state = json!({ "from": options.from, "email": options.email }).to_string();
            let state = JsValue::from_str(&state);
            let result = if options.replace {
                history.replace_state_with_url(&state, "", Some(path))
            } else {
                history.push_state_with_url(&state, "", Some(path))
            };
            if let Err(e) = result {
                self.logger.error(
                    "Navigation failed",
                    log_data!("path" => path, "error" => format!("{:?}", e)),
                );
            }
        }
    }
}
