//! # Remote API Client
//!
//! Typed wrappers over every backend endpoint the application consumes. The
//! client owns URL assembly, token attachment and status-to-error mapping;
//! pages only see typed results or [`AppError`].
//!
//! ## Authentication
//!
//! Calls attach `Authorization: <scheme> <token>` whenever the session store
//! holds a token. Public capsule views never carry the header.
//!
//! ## Endpoints
//!
//! ```text
//! POST   accounts/login/                          login
//! POST   accounts/register/                       register (inactive, OTP sent)
//! POST   accounts/verify-account/                 verify_account
//! GET    accounts/me/                             me
//! POST   accounts/logout/                         logout
//! POST   accounts/password-reset/{request-otp,verify-otp,set-new-password}/
//! POST   accounts/google-login/                   google_login
//! GET    accounts/profile/ | PUT                  profile / update_profile
//! POST   accounts/profile/change-password/        change_password
//! POST   capsules/create/        (multipart)      create_capsule
//! GET    capsules/                                list_capsules
//! GET    capsules/{id}/                           get_capsule
//! DELETE capsules/{id}/delete/                    delete_capsule
//! GET    capsules/public/capsules/{token}/        public_capsule
//! GET    capsules/notifications/[?is_read=]       notifications
//! GET    capsules/notifications/unread-count/     unread_count
//! POST   capsules/notifications/{id}/mark-read/   mark_notification_read
//! POST   capsules/notifications/mark-all-read/    mark_all_notifications_read
//! ```

use http::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::rc::Rc;
use std::sync::Arc;

use crate::config::Config;
use crate::constants::*;
use crate::errors::{AppError, AppResult};
use crate::log_data;
use crate::logging::Logger;
use crate::models::{
    Acknowledgement, AuthResponse, Capsule, Notification, PasswordChange, Profile,
    PublicCapsule, RegisterRequest, UnreadCount, User,
};
use crate::multipart::MultipartForm;
use crate::session::{Session, SessionStore};
use crate::transport::{ApiRequest, ApiResponse, HttpTransport, RequestBody};
use crate::utils::{join_url, path_segment, with_query};

/// Capsule listings arrive either as a bare array or paginated.
#[derive(Deserialize)]
#[serde(untagged)]
enum CapsuleListing {
    Plain(Vec<Capsule>),
    Paginated { results: Vec<Capsule> },
    Empty(Option<()>),
}

#[derive(Clone)]
pub struct ApiClient {
    config: Arc<Config>,
    store: Rc<dyn SessionStore>,
    transport: Rc<dyn HttpTransport>,
    logger: Logger,
}

impl ApiClient {
    pub fn new(
        config: Arc<Config>,
        store: Rc<dyn SessionStore>,
        transport: Rc<dyn HttpTransport>,
    ) -> Self {
        Self {
            config,
            store,
            transport,
            logger: Logger::for_component("api"),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &dyn SessionStore {
        self.store.as_ref()
    }

    fn request(&self, method: Method, path: &str) -> ApiRequest {
        ApiRequest::new(method, join_url(&self.config.api_base_url, path))
    }

    fn authorized(&self, request: ApiRequest) -> ApiRequest {
        match self.store.get().token() {
            Some(token) => request.with_header(
                HEADER_AUTHORIZATION,
                &format!("{} {}", self.config.auth_scheme, token),
            ),
            None => request,
        }
    }

    async fn execute(&self, request: ApiRequest) -> AppResult<ApiResponse> {
        let method = request.method.to_string();
        let url = request.url.clone();
        self.logger
            .info("API request", log_data!("method" => method, "url" => url));

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                self.logger.error(
                    "API transport failure",
                    log_data!("method" => method, "url" => url, "error" => e.to_string()),
                );
                return Err(e);
            }
        };

        if !response.is_success() {
            self.logger.warn(
                "API request failed",
                log_data!("method" => method, "url" => url, "status" => response.status),
            );
        }
        response.error_for_status()
    }

    async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> AppResult<T> {
        self.execute(self.authorized(request)).await?.json()
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str, body: Value) -> AppResult<T> {
        self.fetch(self.request(Method::POST, path).with_body(RequestBody::Json(body)))
            .await
    }

    /// Posts and decodes an acknowledgement; an empty body is a plain success.
    async fn post_ack(&self, path: &str, body: Value) -> AppResult<Acknowledgement> {
        let ack: Option<Acknowledgement> = self.post_json(path, body).await?;
        Ok(ack.unwrap_or_default())
    }

    /// Exchanges credentials for a token and stores it.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<AuthResponse> {
        let response: AuthResponse = self
            .post_json(ENDPOINT_LOGIN, json!({ "email": email, "password": password }))
            .await?;
        self.remember(&response)?;
        Ok(response)
    }

    /// Creates an inactive account; the backend sends an OTP by email.
    pub async fn register(&self, request: &RegisterRequest) -> AppResult<Acknowledgement> {
        self.post_ack(ENDPOINT_REGISTER, serde_json::to_value(request)?)
            .await
    }

    pub async fn verify_account(&self, email: &str, otp: &str) -> AppResult<Acknowledgement> {
        self.post_ack(ENDPOINT_VERIFY_ACCOUNT, json!({ "email": email, "otp": otp }))
            .await
    }

    /// Current identity for the stored token.
    pub async fn me(&self) -> AppResult<User> {
        self.fetch(self.request(Method::GET, ENDPOINT_ME)).await
    }

    /// Invalidates the server-side session. The local session is cleared
    /// whatever the server answers.
    pub async fn logout(&self) -> AppResult<()> {
        let result = self
            .execute(self.authorized(self.request(Method::POST, ENDPOINT_LOGOUT)))
            .await;
        self.store.clear();
        result.map(|_| ())
    }

    pub async fn request_password_reset_otp(&self, email: &str) -> AppResult<Acknowledgement> {
        self.post_ack(ENDPOINT_RESET_REQUEST_OTP, json!({ "email": email }))
            .await
    }

    pub async fn verify_password_reset_otp(
        &self,
        email: &str,
        otp: &str,
    ) -> AppResult<Acknowledgement> {
        self.post_ack(ENDPOINT_RESET_VERIFY_OTP, json!({ "email": email, "otp": otp }))
            .await
    }

    pub async fn set_new_password(
        &self,
        email: &str,
        password: &str,
        password2: &str,
    ) -> AppResult<Acknowledgement> {
        self.post_ack(
            ENDPOINT_RESET_SET_PASSWORD,
            json!({ "email": email, "password": password, "password2": password2 }),
        )
        .await
    }

    /// Exchanges a Google ID token for a session token and cached user.
    pub async fn google_login(&self, id_token: &str) -> AppResult<AuthResponse> {
        let response: AuthResponse = self
            .post_json(ENDPOINT_GOOGLE_LOGIN, json!({ "id_token": id_token }))
            .await?;
        self.remember(&response)?;
        Ok(response)
    }

    fn remember(&self, response: &AuthResponse) -> AppResult<()> {
        match response.token.as_deref().filter(|t| !t.is_empty()) {
            Some(token) => {
                self.store.set(Session {
                    auth_token: Some(token.to_string()),
                    cached_user: response.user.clone(),
                });
                Ok(())
            }
            None => Err(AppError::Unauthorized(
                "Login response did not include a token".to_string(),
            )),
        }
    }

    pub async fn profile(&self) -> AppResult<Profile> {
        self.fetch(self.request(Method::GET, ENDPOINT_PROFILE)).await
    }

    pub async fn update_profile(&self, profile: &Profile) -> AppResult<Profile> {
        self.fetch(
            self.request(Method::PUT, ENDPOINT_PROFILE)
                .with_body(RequestBody::Json(serde_json::to_value(profile)?)),
        )
        .await
    }

    pub async fn change_password(&self, change: &PasswordChange) -> AppResult<Acknowledgement> {
        self.post_ack(ENDPOINT_CHANGE_PASSWORD, serde_json::to_value(change)?)
            .await
    }

    /// Submits an assembled capsule. Refuses to send anything without a token.
    pub async fn create_capsule(&self, form: MultipartForm) -> AppResult<Value> {
        if self.store.get().token().is_none() {
            return Err(AppError::Unauthorized(
                "User not authenticated or token not found".to_string(),
            ));
        }
        self.fetch(
            self.request(Method::POST, ENDPOINT_CAPSULE_CREATE)
                .with_body(RequestBody::Multipart(form)),
        )
        .await
    }

    pub async fn list_capsules(&self) -> AppResult<Vec<Capsule>> {
        let listing: CapsuleListing = self
            .fetch(self.request(Method::GET, ENDPOINT_CAPSULES))
            .await?;
        Ok(match listing {
            CapsuleListing::Plain(capsules) => capsules,
            CapsuleListing::Paginated { results } => results,
            CapsuleListing::Empty(_) => Vec::new(),
        })
    }

    pub async fn get_capsule(&self, id: &str) -> AppResult<Capsule> {
        self.fetch(self.request(Method::GET, &format!("capsules/{}/", path_segment(id))))
            .await
    }

    pub async fn delete_capsule(&self, id: &str) -> AppResult<()> {
        self.execute(self.authorized(
            self.request(Method::DELETE, &format!("capsules/{}/delete/", path_segment(id))),
        ))
        .await
        .map(|_| ())
    }

    /// Recipient view by access token; sent without credentials.
    pub async fn public_capsule(&self, token: &str) -> AppResult<PublicCapsule> {
        self.execute(self.request(
            Method::GET,
            &format!("capsules/public/capsules/{}/", path_segment(token)),
        ))
        .await?
        .json()
    }

    /// Notifications, optionally filtered by read state.
    pub async fn notifications(&self, is_read: Option<bool>) -> AppResult<Vec<Notification>> {
        let query: Vec<(String, String)> = is_read
            .map(|read| vec![("is_read".to_string(), read.to_string())])
            .unwrap_or_default();
        let mut request = self.request(Method::GET, ENDPOINT_NOTIFICATIONS);
        request.url = with_query(request.url, &query);
        let notifications: Option<Vec<Notification>> = self.fetch(request).await?;
        Ok(notifications.unwrap_or_default())
    }

    pub async fn unread_count(&self) -> AppResult<UnreadCount> {
        self.fetch(self.request(Method::GET, ENDPOINT_NOTIFICATIONS_UNREAD))
            .await
    }

    pub async fn mark_notification_read(&self, id: &str) -> AppResult<()> {
        self.execute(self.authorized(self.request(
            Method::POST,
            &format!("capsules/notifications/{}/mark-read/", path_segment(id)),
        )))
        .await
        .map(|_| ())
    }

    pub async fn mark_all_notifications_read(&self) -> AppResult<()> {
        self.execute(self.authorized(
            self.request(Method::POST, ENDPOINT_NOTIFICATIONS_MARK_ALL),
        ))
        .await
        .map(|_| ())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted transport and client fixtures shared by page tests.

    use super::*;
    use crate::session::MemorySessionStore;
    use async_trait::async_trait;
    use std::cell::{Cell, RefCell};
    use std::future::Future;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    pub const BASE: &str = "https://api.test/api/";

    /// Future that is pending exactly once, so concurrent callers interleave.
    struct YieldOnce(bool);

    impl Future for YieldOnce {
        type Output = ();

        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
            if self.0 {
                Poll::Ready(())
            } else {
                self.0 = true;
                cx.waker().wake_by_ref();
                Poll::Pending
            }
        }
    }

    type Hook = Box<dyn Fn(&ApiRequest)>;

    /// Transport answering by `(method, path)` and recording every request.
    #[derive(Default)]
    pub struct ScriptedTransport {
        routes: RefCell<Vec<(Method, String, Result<ApiResponse, String>)>>,
        requests: RefCell<Vec<ApiRequest>>,
        hook: RefCell<Option<Hook>>,
        yield_first: Cell<bool>,
    }

    impl ScriptedTransport {
        pub fn new() -> Rc<Self> {
            Rc::new(Self::default())
        }

        pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
            self.respond_raw(method, path, ApiResponse::json_body(status, &body));
        }

        pub fn respond_raw(&self, method: Method, path: &str, response: ApiResponse) {
            self.routes
                .borrow_mut()
                .push((method, path.to_string(), Ok(response)));
        }

        /// Simulates a network failure (no HTTP response at all).
        pub fn fail(&self, method: Method, path: &str, message: &str) {
            self.routes
                .borrow_mut()
                .push((method, path.to_string(), Err(message.to_string())));
        }

        /// Runs `hook` while the request is in flight.
        pub fn on_send(&self, hook: impl Fn(&ApiRequest) + 'static) {
            *self.hook.borrow_mut() = Some(Box::new(hook));
        }

        /// Makes every request suspend once before answering.
        pub fn suspend_once(&self) {
            self.yield_first.set(true);
        }

        pub fn requests(&self) -> Vec<ApiRequest> {
            self.requests.borrow().clone()
        }

        pub fn count(&self, method: Method, path: &str) -> usize {
            let url = join_url(BASE, path);
            self.requests
                .borrow()
                .iter()
                .filter(|r| r.method == method && r.url.split('?').next() == Some(url.as_str()))
                .count()
        }

        fn answer(&self, request: &ApiRequest) -> AppResult<ApiResponse> {
            let path = request.url.split('?').next().unwrap_or_default();
            let routes = self.routes.borrow();
            let hit = routes
                .iter()
                .rev()
                .find(|(method, p, _)| *method == request.method && join_url(BASE, p) == path);
            match hit {
                Some((_, _, Ok(response))) => Ok(response.clone()),
                Some((_, _, Err(message))) => Err(AppError::Transport(message.clone())),
                None => Ok(ApiResponse::json_body(404, &json!({ "detail": "Not found." }))),
            }
        }
    }

    #[async_trait(?Send)]
    impl HttpTransport for ScriptedTransport {
        async fn send(&self, request: ApiRequest) -> AppResult<ApiResponse> {
            self.requests.borrow_mut().push(request.clone());
            if self.yield_first.get() {
                YieldOnce(false).await;
            }
            if let Some(hook) = self.hook.borrow().as_ref() {
                hook(&request);
            }
            self.answer(&request)
        }
    }

    pub fn config() -> Arc<Config> {
        Arc::new(Config {
            api_base_url: BASE.to_string(),
            ..Config::default()
        })
    }

    pub fn client(
        session: Session,
    ) -> (ApiClient, Rc<ScriptedTransport>, Rc<MemorySessionStore>) {
        let transport = ScriptedTransport::new();
        let store = Rc::new(MemorySessionStore::with_session(session));
        let api = ApiClient::new(config(), store.clone(), transport.clone());
        (api, transport, store)
    }

    pub fn user_json() -> Value {
        json!({ "id": 1, "email": "owner@example.com", "name": "Owner" })
    }
}
