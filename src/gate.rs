//! # Session Gate
//!
//! Resolves who the caller is and decides what a route may render.
//!
//! ```text
//! [Unresolved] --token + user (cached or looked up)--> [Authenticated]
//! [Unresolved] --no token, or lookup failed---------> [Anonymous] --navigate /login (once)
//! ```
//!
//! Lookup failures are never shown to the user. They clear the stored session
//! and resolve to `Anonymous`. Every await is followed by a liveness check so a
//! view torn down mid-resolution is never updated or navigated from.

use std::cell::{Cell, RefCell};
use std::time::Duration;

use crate::api::ApiClient;
use crate::constants::{MSG_ALREADY_LOGGED_IN, MSG_ALREADY_REGISTERED, ROUTE_DASHBOARD, ROUTE_LOGIN};
use crate::context::AppContext;
use crate::feedback::NoticeKind;
use crate::log_data;
use crate::logging::Logger;
use crate::models::User;
use crate::router::NavigateOptions;
use crate::scheduler::{DelayedAction, Liveness};
use crate::session::Session;

/// Resolution of the stored session into a user.
pub struct AuthService {
    api: ApiClient,
    logger: Logger,
}

impl AuthService {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            logger: Logger::for_component("auth"),
        }
    }

    /// The current user, or `None` for an anonymous session.
    ///
    /// A cached user is trusted while a token is stored. Otherwise the user is
    /// looked up and cached. A failed lookup clears token and cache together.
    pub async fn current_user(&self) -> Option<User> {
        let session = self.api.store().get();
        let token = session.token()?.to_string();
        if let Some(user) = session.trusted_user() {
            return Some(user.clone());
        }

        match self.api.me().await {
            Ok(user) => {
                // A logout that landed during the lookup must not be undone,
                // and the answer belongs to a session that no longer exists.
                if self.api.store().get().token() != Some(token.as_str()) {
                    self.logger.info(
                        "Session changed during lookup, discarding identity",
                        None,
                    );
                    return None;
                }
                self.api.store().set(Session {
                    auth_token: Some(token),
                    cached_user: Some(user.clone()),
                });
                Some(user)
            }
            Err(e) => {
                self.logger.warn(
                    "Session lookup failed, clearing stored session",
                    log_data!("error" => e.to_string()),
                );
                self.api.store().clear();
                None
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !self.api.store().get().is_anonymous()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum GateState {
    /// Resolution pending; render a loading indicator.
    Unresolved,
    Anonymous,
    Authenticated(User),
}

/// Guard mounted around a protected route.
pub struct SessionGate {
    ctx: AppContext,
    auth: AuthService,
    location: String,
    liveness: Liveness,
    state: RefCell<GateState>,
    resolving: Cell<bool>,
}

impl SessionGate {
    /// `location` is the path the user attempted; it rides along on the redirect.
    pub fn new(ctx: AppContext, location: impl Into<String>) -> Self {
        Self {
            auth: AuthService::new(ctx.api.clone()),
            ctx,
            location: location.into(),
            liveness: Liveness::new(),
            state: RefCell::new(GateState::Unresolved),
            resolving: Cell::new(false),
        }
    }

    pub fn state(&self) -> GateState {
        self.state.borrow().clone()
    }

    /// Protected children render only once the session is authenticated.
    pub fn can_render(&self) -> bool {
        matches!(*self.state.borrow(), GateState::Authenticated(_))
    }

    pub fn user(&self) -> Option<User> {
        match &*self.state.borrow() {
            GateState::Authenticated(user) => Some(user.clone()),
            _ => None,
        }
    }

    /// Runs resolution once per mount. Repeated calls return the settled state.
    pub async fn resolve(&self) -> GateState {
        if *self.state.borrow() != GateState::Unresolved || self.resolving.replace(true) {
            return self.state();
        }

        let user = self.auth.current_user().await;
        self.resolving.set(false);
        if !self.liveness.is_alive() {
            return GateState::Unresolved;
        }

        let state = match user {
            Some(user) => GateState::Authenticated(user),
            None => {
                self.ctx
                    .navigator
                    .navigate(ROUTE_LOGIN, NavigateOptions::replace_from(self.location.as_str()));
                GateState::Anonymous
            }
        };
        self.state.replace(state.clone());
        state
    }

    pub fn unmount(&self) {
        self.liveness.unmount();
    }
}

/// Guest-only page the guard protects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryPage {
    Login,
    Register,
}

impl EntryPage {
    pub fn notice(self) -> &'static str {
        match self {
            EntryPage::Login => MSG_ALREADY_LOGGED_IN,
            EntryPage::Register => MSG_ALREADY_REGISTERED,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum EntryState {
    Checking,
    ShowForm,
    /// Notice shown; the dashboard opens after the redirect delay.
    AlreadyAuthenticated(User),
}

/// Inverse of [`SessionGate`] for the login and registration pages.
pub struct EntryGuard {
    ctx: AppContext,
    auth: AuthService,
    page: EntryPage,
    liveness: Liveness,
    state: RefCell<EntryState>,
    redirect: RefCell<Option<DelayedAction>>,
}

impl EntryGuard {
    pub fn new(ctx: AppContext, page: EntryPage) -> Self {
        Self {
            auth: AuthService::new(ctx.api.clone()),
            ctx,
            page,
            liveness: Liveness::new(),
            state: RefCell::new(EntryState::Checking),
            redirect: RefCell::new(None),
        }
    }

    pub fn state(&self) -> EntryState {
        self.state.borrow().clone()
    }

    pub async fn resolve(&self) -> EntryState {
        if *self.state.borrow() != EntryState::Checking {
            return self.state();
        }

        let user = self.auth.current_user().await;
        if !self.liveness.is_alive() {
            return EntryState::Checking;
        }

        let state = match user {
            Some(user) => {
                let delay = self.ctx.config.redirect_delay();
                self.ctx
                    .feedback
                    .show(self.page.notice(), NoticeKind::Info, Some(delay));
                self.schedule_redirect(delay);
                EntryState::AlreadyAuthenticated(user)
            }
            None => EntryState::ShowForm,
        };
        self.state.replace(state.clone());
        state
    }

    fn schedule_redirect(&self, delay: Duration) {
        let navigator = self.ctx.navigator.clone();
        let redirect = self.ctx.scheduler.defer(delay, move || {
            navigator.navigate(ROUTE_DASHBOARD, NavigateOptions::default())
        });
        self.redirect.replace(Some(redirect));
    }

    /// Tears the page down; the pending dashboard redirect is cancelled.
    pub fn unmount(&self) {
        self.liveness.unmount();
        if let Some(redirect) = self.redirect.take() {
            redirect.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::user_json;
    use crate::constants::ENDPOINT_ME;
    use crate::context::testing::harness;
    use crate::session::SessionStore;
    use futures::executor::block_on;
    use http::Method;
    use serde_json::json;

    fn user() -> User {
        serde_json::from_value(user_json()).unwrap()
    }

    #[test]
    fn no_token_redirects_exactly_once() {
        let h = harness(Session::default());
        let gate = SessionGate::new(h.ctx.clone(), "/create-capsule");

        assert_eq!(block_on(gate.resolve()), GateState::Anonymous);
        assert_eq!(block_on(gate.resolve()), GateState::Anonymous);
        assert!(!gate.can_render());
        assert!(h.transport.requests().is_empty());

        let visits = h.navigator.visits();
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].0, ROUTE_LOGIN);
        assert_eq!(visits[0].1, NavigateOptions::replace_from("/create-capsule"));
    }

    #[test]
    fn cached_user_skips_lookup() {
        let h = harness(Session {
            auth_token: Some("tok".into()),
            cached_user: Some(user()),
        });
        let gate = SessionGate::new(h.ctx.clone(), "/dashboard");

        assert_eq!(block_on(gate.resolve()), GateState::Authenticated(user()));
        assert!(gate.can_render());
        assert!(h.transport.requests().is_empty());
        assert!(h.navigator.paths().is_empty());
    }

    #[test]
    fn lookup_result_is_cached() {
        let h = harness(Session::with_token("tok"));
        h.transport.respond(Method::GET, ENDPOINT_ME, 200, user_json());
        let gate = SessionGate::new(h.ctx.clone(), "/dashboard");

        assert_eq!(gate.user(), None);
        block_on(gate.resolve());
        assert_eq!(gate.user(), Some(user()));
        assert_eq!(h.store.get().cached_user, Some(user()));
        assert_eq!(h.store.get().token(), Some("tok"));
    }

    #[test]
    fn failed_lookup_clears_session() {
        let h = harness(Session::with_token("expired"));
        h.transport.respond(
            Method::GET,
            ENDPOINT_ME,
            401,
            json!({ "detail": "Invalid token." }),
        );
        let gate = SessionGate::new(h.ctx.clone(), "/notifications");

        assert_eq!(block_on(gate.resolve()), GateState::Anonymous);
        assert_eq!(h.store.get(), Session::default());
        assert_eq!(h.navigator.paths(), vec![ROUTE_LOGIN.to_string()]);
        assert!(h.ctx.feedback.current().is_none());
    }

    #[test]
    fn network_failure_is_treated_as_anonymous() {
        let h = harness(Session::with_token("tok"));
        h.transport.fail(Method::GET, ENDPOINT_ME, "offline");
        let auth = AuthService::new(h.ctx.api.clone());

        assert_eq!(block_on(auth.current_user()), None);
        assert!(!auth.is_authenticated());
    }

    #[test]
    fn logout_during_lookup_is_not_undone() {
        let h = harness(Session::with_token("tok"));
        h.transport.respond(Method::GET, ENDPOINT_ME, 200, user_json());
        let store = h.store.clone();
        h.transport.on_send(move |_| store.clear());
        let auth = AuthService::new(h.ctx.api.clone());

        assert_eq!(block_on(auth.current_user()), None);
        assert!(h.store.get().is_anonymous());
    }

    #[test]
    fn logout_during_gate_lookup_redirects_once() {
        let h = harness(Session::with_token("tok"));
        h.transport.respond(Method::GET, ENDPOINT_ME, 200, user_json());
        let store = h.store.clone();
        h.transport.on_send(move |_| store.clear());
        let gate = SessionGate::new(h.ctx.clone(), "/dashboard");

        assert_eq!(block_on(gate.resolve()), GateState::Anonymous);
        assert!(!gate.can_render());
        assert_eq!(block_on(gate.resolve()), GateState::Anonymous);
        assert_eq!(h.navigator.paths(), vec![ROUTE_LOGIN.to_string()]);
    }

    #[test]
    fn unmount_mid_resolution_leaves_view_untouched() {
        let h = harness(Session::with_token("expired"));
        h.transport
            .respond(Method::GET, ENDPOINT_ME, 401, json!({ "detail": "Invalid token." }));
        let gate = std::rc::Rc::new(SessionGate::new(h.ctx.clone(), "/profile"));
        let mounted = gate.clone();
        h.transport.on_send(move |_| mounted.unmount());

        assert_eq!(block_on(gate.resolve()), GateState::Unresolved);
        assert_eq!(gate.state(), GateState::Unresolved);
        assert!(h.navigator.paths().is_empty());
        assert!(h.store.get().is_anonymous());
    }

    #[test]
    fn entry_guard_shows_form_to_guests() {
        let h = harness(Session::default());
        let guard = EntryGuard::new(h.ctx.clone(), EntryPage::Login);

        assert_eq!(block_on(guard.resolve()), EntryState::ShowForm);
        assert_eq!(h.spawner.pending(), 0);
        assert!(h.ctx.feedback.current().is_none());
    }

    #[test]
    fn entry_guard_redirects_signed_in_user() {
        let h = harness(Session {
            auth_token: Some("tok".into()),
            cached_user: Some(user()),
        });
        let guard = EntryGuard::new(h.ctx.clone(), EntryPage::Register);

        assert_eq!(
            block_on(guard.resolve()),
            EntryState::AlreadyAuthenticated(user())
        );
        let notice = h.ctx.feedback.current().unwrap();
        assert_eq!(notice.message, MSG_ALREADY_REGISTERED);
        assert_eq!(notice.kind, NoticeKind::Info);
        assert_eq!(notice.duration, Some(Duration::from_millis(2000)));

        assert!(h.navigator.paths().is_empty());
        assert_eq!(h.spawner.run_all(), 1);
        assert_eq!(h.navigator.paths(), vec![ROUTE_DASHBOARD.to_string()]);
    }

    #[test]
    fn entry_guard_unmount_cancels_redirect() {
        let h = harness(Session {
            auth_token: Some("tok".into()),
            cached_user: Some(user()),
        });
        let guard = EntryGuard::new(h.ctx.clone(), EntryPage::Login);

        block_on(guard.resolve());
        guard.unmount();

        assert_eq!(h.spawner.run_all(), 0);
        assert!(h.navigator.paths().is_empty());
    }
}
