//! # Session Store
//!
//! The process-wide session: an opaque auth token plus a cached copy of the
//! current user. The cached user is trusted only while a token is present, and
//! both are always cleared together.
//!
//! Access goes through the [`SessionStore`] trait so pages receive the store
//! explicitly instead of reaching for browser storage themselves.
//!
//! - **MemorySessionStore**: process memory, used natively and in tests
//! - **LocalStorageSessionStore**: browser `localStorage` (`wasm32` only)

use std::cell::RefCell;

use crate::log_data;
use crate::logging::Logger;
use crate::models::User;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
    pub auth_token: Option<String>,
    pub cached_user: Option<User>,
}

impl Session {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            auth_token: Some(token.into()),
            cached_user: None,
        }
    }

    /// The token, if present and non-empty.
    pub fn token(&self) -> Option<&str> {
        self.auth_token.as_deref().filter(|t| !t.is_empty())
    }

    /// The cached user, honoured only while a token exists.
    pub fn trusted_user(&self) -> Option<&User> {
        self.token().and(self.cached_user.as_ref())
    }

    pub fn is_anonymous(&self) -> bool {
        self.token().is_none()
    }
}

/// Durable session storage. Reads are idempotent; the last writer wins.
pub trait SessionStore {
    fn get(&self) -> Session;
    fn set(&self, session: Session);
    fn clear(&self);
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: RefCell<Session>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: RefCell::new(session),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Session {
        self.session.borrow().clone()
    }

    fn set(&self, session: Session) {
        *self.session.borrow_mut() = session;
    }

    fn clear(&self) {
        *self.session.borrow_mut() = Session::default();
    }
}

/// Logs a failed storage write (quota exceeded, private mode); returns whether it succeeded.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
fn persisted<E: std::fmt::Debug>(logger: &Logger, key: &str, result: Result<(), E>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            logger.warn(
                "Session storage write failed",
                log_data!("key" => key, "error" => format!("{:?}", e)),
            );
            false
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use local_storage::LocalStorageSessionStore;

#[cfg(target_arch = "wasm32")]
mod local_storage {
    use super::*;
    use crate::constants::{STORAGE_TOKEN_KEY, STORAGE_USER_KEY};
    use web_sys::Storage;

    /// Session persisted under the `authToken` and `user` keys of `localStorage`.
    pub struct LocalStorageSessionStore {
        logger: Logger,
    }

    impl LocalStorageSessionStore {
        pub fn new() -> Self {
            Self {
                logger: Logger::for_component("session-store"),
            }
        }

        fn storage(&self) -> Option<Storage> {
            web_sys::window().and_then(|window| window.local_storage().ok().flatten())
        }
    }

    impl Default for LocalStorageSessionStore {
        fn default() -> Self {
            Self::new()
        }
    }

    impl SessionStore for LocalStorageSessionStore {
        fn get(&self) -> Session {
            let Some(storage) = self.storage() else {
                return Session::default();
            };

            let auth_token = storage.get_item(STORAGE_TOKEN_KEY).ok().flatten();
            let cached_user = match storage.get_item(STORAGE_USER_KEY).ok().flatten() {
                Some(raw) => match serde_json::from_str::<User>(&raw) {
                    Ok(user) => Some(user),
                    Err(e) => {
                        self.logger.warn(
                            "Dropping corrupted cached user",
                            log_data!("error" => e.to_string()),
                        );
                        persisted(
                            &self.logger,
                            STORAGE_USER_KEY,
                            storage.remove_item(STORAGE_USER_KEY),
                        );
                        None
                    }
                },
                None => None,
            };

            Session {
                auth_token,
                cached_user,
            }
        }

        fn set(&self, session: Session) {
            let Some(storage) = self.storage() else {
                self.logger.error("localStorage unavailable, session not saved", None);
                return;
            };

            let written = match &session.auth_token {
                Some(token) => storage.set_item(STORAGE_TOKEN_KEY, token),
                None => storage.remove_item(STORAGE_TOKEN_KEY),
            };
            persisted(&self.logger, STORAGE_TOKEN_KEY, written);

            let user_json = session
                .cached_user
                .as_ref()
                .and_then(|user| serde_json::to_string(user).ok());
            let written = match user_json {
                Some(json) => storage.set_item(STORAGE_USER_KEY, &json),
                None => storage.remove_item(STORAGE_USER_KEY),
            };
            persisted(&self.logger, STORAGE_USER_KEY, written);
        }

        fn clear(&self) {
            let Some(storage) = self.storage() else {
                self.logger.error("localStorage unavailable, session not cleared", None);
                return;
            };
            persisted(&self.logger, STORAGE_TOKEN_KEY, storage.remove_item(STORAGE_TOKEN_KEY));
            persisted(&self.logger, STORAGE_USER_KEY, storage.remove_item(STORAGE_USER_KEY));
        }
    }
}
